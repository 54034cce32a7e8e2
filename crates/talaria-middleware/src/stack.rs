//! The fixed-order composition of all five pipeline steps.
//!
//! A [`Stack`] owns one step per phase and runs them in the fixed order
//! Initialize → Serialize → Build → Finalize → Deserialize → transport.
//! The steps themselves are public fields: generated and user code
//! customize a stack by mutating `stack.initialize`, `stack.serialize`,
//! and so on before the first request. Only within-step ordering is
//! mutable; the phase order is not.

use crate::steps::build::BuildStep;
use crate::steps::deserialize::DeserializeStep;
use crate::steps::finalize::FinalizeStep;
use crate::steps::initialize::InitializeStep;
use crate::steps::serialize::SerializeStep;
use std::sync::Arc;
use talaria_core::{BoxFuture, Context, Handler, HandlerResult};

/// The per-operation middleware stack.
///
/// Generic over the modeled input `I`, modeled output `O`, transport
/// request `Req`, and transport response `Res`. The stack is configured
/// with `&mut self` during setup and executed with `&self`; sharing it
/// across concurrent calls (e.g. behind an `Arc`) is safe once mutation
/// has stopped.
///
/// # Example
///
/// ```ignore
/// let mut stack: Stack<GetWidgetInput, GetWidgetOutput, Request, Response> =
///     Stack::new("GetWidget", Request::default);
/// stack.serialize.add(Arc::new(SerializeGetWidget), RelativePosition::After)?;
/// stack.deserialize.add(Arc::new(DeserializeGetWidget), RelativePosition::After)?;
///
/// let (output, metadata) = stack.handle(&mut cx, input, &transport).await?;
/// ```
pub struct Stack<I, O, Req, Res> {
    id: String,

    /// Prepares the modeled input before serialization.
    pub initialize: InitializeStep<I, O>,

    /// Marshals the modeled input onto a transport request.
    pub serialize: SerializeStep<I, Req, O>,

    /// Attaches computed fields to the serialized request.
    pub build: BuildStep<Req, O>,

    /// Last-touch request mutation (signing, endpoint resolution).
    pub finalize: FinalizeStep<Req, O>,

    /// Wraps the transport and unmarshals its response.
    pub deserialize: DeserializeStep<Req, Res, O>,

    new_request: Arc<dyn Fn() -> Req + Send + Sync>,
}

impl<I, O, Req, Res> Stack<I, O, Req, Res>
where
    I: Send + 'static,
    O: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Creates an empty stack.
    ///
    /// `new_request` constructs the blank transport request handed to the
    /// Serialize phase on every invocation.
    #[must_use]
    pub fn new(id: impl Into<String>, new_request: impl Fn() -> Req + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            initialize: InitializeStep::new(),
            serialize: SerializeStep::new(),
            build: BuildStep::new(),
            finalize: FinalizeStep::new(),
            deserialize: DeserializeStep::new(),
            new_request: Arc::new(new_request),
        }
    }

    /// The stack's id, typically the operation name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Flattened listing of step ids and their middleware ids in
    /// invocation order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut ids = vec![self.id.clone()];
        ids.push(self.initialize.id().to_string());
        ids.extend(self.initialize.list());
        ids.push(self.serialize.id().to_string());
        ids.extend(self.serialize.list());
        ids.push(self.build.id().to_string());
        ids.extend(self.build.list());
        ids.push(self.finalize.id().to_string());
        ids.extend(self.finalize.list());
        ids.push(self.deserialize.id().to_string());
        ids.extend(self.deserialize.list());
        ids
    }

    /// Runs one invocation through every phase and the given transport.
    ///
    /// # Errors
    ///
    /// Returns whatever the middleware chain or transport returned; the
    /// stack adds no failure behavior of its own at request time.
    pub async fn handle<T>(&self, cx: &mut Context, input: I, transport: &T) -> HandlerResult<O>
    where
        T: Handler<Req, Out = Res>,
    {
        tracing::debug!(
            stack = %self.id,
            invocation = %cx.invocation_id(),
            "dispatching operation through the middleware stack"
        );

        let deserialize = DeserializePhase {
            step: &self.deserialize,
            transport,
        };
        let finalize = FinalizePhase {
            step: &self.finalize,
            next: deserialize,
        };
        let build = BuildPhase {
            step: &self.build,
            next: finalize,
        };
        let serialize = SerializePhase {
            step: &self.serialize,
            new_request: self.new_request.as_ref(),
            next: build,
        };

        self.initialize.handle(cx, input, &serialize).await
    }
}

// Adapters binding each step to the phase after it. Each one is the
// `next` handler its predecessor's terminal link delegates to.

struct SerializePhase<'a, I, O, Req, Res, T> {
    step: &'a SerializeStep<I, Req, O>,
    new_request: &'a (dyn Fn() -> Req + Send + Sync),
    next: BuildPhase<'a, O, Req, Res, T>,
}

impl<I, O, Req, Res, T> Handler<I> for SerializePhase<'_, I, O, Req, Res, T>
where
    I: Send + 'static,
    O: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
    T: Handler<Req, Out = Res>,
{
    type Out = O;

    fn handle<'b>(&'b self, cx: &'b mut Context, input: I) -> BoxFuture<'b, HandlerResult<O>> {
        Box::pin(async move {
            let request = (self.new_request)();
            self.step.handle(cx, input, request, &self.next).await
        })
    }
}

struct BuildPhase<'a, O, Req, Res, T> {
    step: &'a BuildStep<Req, O>,
    next: FinalizePhase<'a, O, Req, Res, T>,
}

impl<O, Req, Res, T> Handler<Req> for BuildPhase<'_, O, Req, Res, T>
where
    O: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
    T: Handler<Req, Out = Res>,
{
    type Out = O;

    fn handle<'b>(&'b self, cx: &'b mut Context, input: Req) -> BoxFuture<'b, HandlerResult<O>> {
        Box::pin(async move { self.step.handle(cx, input, &self.next).await })
    }
}

struct FinalizePhase<'a, O, Req, Res, T> {
    step: &'a FinalizeStep<Req, O>,
    next: DeserializePhase<'a, O, Req, Res, T>,
}

impl<O, Req, Res, T> Handler<Req> for FinalizePhase<'_, O, Req, Res, T>
where
    O: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
    T: Handler<Req, Out = Res>,
{
    type Out = O;

    fn handle<'b>(&'b self, cx: &'b mut Context, input: Req) -> BoxFuture<'b, HandlerResult<O>> {
        Box::pin(async move { self.step.handle(cx, input, &self.next).await })
    }
}

struct DeserializePhase<'a, O, Req, Res, T> {
    step: &'a DeserializeStep<Req, Res, O>,
    transport: &'a T,
}

impl<O, Req, Res, T> Handler<Req> for DeserializePhase<'_, O, Req, Res, T>
where
    O: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
    T: Handler<Req, Out = Res>,
{
    type Out = O;

    fn handle<'b>(&'b self, cx: &'b mut Context, input: Req) -> BoxFuture<'b, HandlerResult<O>> {
        Box::pin(async move { self.step.handle(cx, input, self.transport).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::RelativePosition;

    #[test]
    fn test_list_reports_steps_in_phase_order() {
        let mut stack: Stack<u32, u32, String, String> = Stack::new("TestOp", String::new);
        stack.build.add_slot("auth-slot", RelativePosition::After).unwrap();

        let ids = stack.list();
        assert_eq!(
            ids,
            [
                "TestOp",
                "Initialize",
                "Serialize",
                "Build",
                "auth-slot",
                "Finalize",
                "Deserialize",
            ]
        );
    }

    #[test]
    fn test_stack_id() {
        let stack: Stack<u32, u32, String, String> = Stack::new("GetWidget", String::new);
        assert_eq!(stack.id(), "GetWidget");
    }
}
