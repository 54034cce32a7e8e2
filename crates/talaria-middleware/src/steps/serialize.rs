//! Serialize step: marshals the modeled input onto a transport request.
//!
//! Serialize middleware receive both the operation parameters and the
//! request under construction. By the time the chain reaches the terminal,
//! the request must fully represent the parameters; the parameters are not
//! forwarded past this phase.

use crate::error::RegistryError;
use crate::order::RelativePosition;
use crate::registry::OrderedRegistry;
use std::sync::Arc;
use talaria_core::{BoxFuture, Context, Handler, HandlerResult, Metadata};

/// Input to the serialize phase.
#[derive(Debug)]
pub struct SerializeInput<I, Req> {
    /// The modeled operation input.
    pub parameters: I,
    /// The transport request under construction.
    pub request: Req,
}

/// Output of the serialize phase.
#[derive(Debug)]
pub struct SerializeOutput<O> {
    /// The modeled operation output produced further down the stack.
    pub result: O,
}

/// Result of running serialize middleware or the remaining chain.
pub type SerializeResult<O> = Result<(SerializeOutput<O>, Metadata), talaria_core::BoxError>;

/// Middleware scoped to the serialize phase.
pub trait SerializeMiddleware<I, Req, O>: Send + Sync + 'static
where
    I: Send + 'static,
    Req: Send + 'static,
    O: Send + 'static,
{
    /// Unique id of this middleware within the step.
    fn id(&self) -> &str;

    /// Invokes the middleware behavior.
    fn handle<'a>(
        &'a self,
        cx: &'a mut Context,
        input: SerializeInput<I, Req>,
        next: SerializeChain<'a, I, Req, O>,
    ) -> BoxFuture<'a, SerializeResult<O>>;
}

/// The remainder of a serialize chain.
///
/// Consumed by [`Self::run`]; dropping it short-circuits the phase.
pub struct SerializeChain<'a, I, Req, O> {
    link: Link<'a, I, Req, O>,
}

enum Link<'a, I, Req, O> {
    Middleware {
        middleware: &'a dyn SerializeMiddleware<I, Req, O>,
        next: Box<SerializeChain<'a, I, Req, O>>,
    },
    Terminal {
        next: &'a dyn Handler<Req, Out = O>,
    },
}

impl<'a, I, Req, O> SerializeChain<'a, I, Req, O>
where
    I: Send + 'static,
    Req: Send + 'static,
    O: Send + 'static,
{
    fn terminal(next: &'a dyn Handler<Req, Out = O>) -> Self {
        Self {
            link: Link::Terminal { next },
        }
    }

    fn wrap(middleware: &'a dyn SerializeMiddleware<I, Req, O>, next: Self) -> Self {
        Self {
            link: Link::Middleware {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Runs the remainder of the chain. The terminal forwards the built
    /// request; the parameters stop here.
    pub async fn run(self, cx: &mut Context, input: SerializeInput<I, Req>) -> SerializeResult<O> {
        match self.link {
            Link::Middleware { middleware, next } => middleware.handle(cx, input, *next).await,
            Link::Terminal { next } => {
                let (result, metadata) = next.handle(cx, input.request).await?;
                Ok((SerializeOutput { result }, metadata))
            }
        }
    }
}

/// Ordered grouping of serialize middleware, invoked as one handler.
pub struct SerializeStep<I, Req, O> {
    ids: OrderedRegistry<Arc<dyn SerializeMiddleware<I, Req, O>>>,
}

impl<I, Req, O> SerializeStep<I, Req, O>
where
    I: Send + 'static,
    Req: Send + 'static,
    O: Send + 'static,
{
    /// Creates an empty step.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: OrderedRegistry::new(),
        }
    }

    /// Unique id of this step within a stack.
    #[must_use]
    pub fn id(&self) -> &'static str {
        "Serialize"
    }

    /// Adds `middleware` at the given end of the step.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn add(
        &mut self,
        middleware: Arc<dyn SerializeMiddleware<I, Req, O>>,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = middleware.id().to_owned();
        self.ids.add(id, middleware, pos)
    }

    /// Reserves `id` in the step with no behavior.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn add_slot(
        &mut self,
        id: impl Into<String>,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        self.ids.add_slot(id, pos)
    }

    /// Inserts `middleware` relative to an existing id.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn insert(
        &mut self,
        middleware: Arc<dyn SerializeMiddleware<I, Req, O>>,
        anchor: &str,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = middleware.id().to_owned();
        self.ids.insert(id, middleware, anchor, pos)
    }

    /// Reserves `id` relative to an existing id.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn insert_slot(
        &mut self,
        id: impl Into<String>,
        anchor: &str,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        self.ids.insert_slot(id, anchor, pos)
    }

    /// Replaces the middleware at `id`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn swap(
        &mut self,
        id: &str,
        middleware: Arc<dyn SerializeMiddleware<I, Req, O>>,
    ) -> Result<Option<Arc<dyn SerializeMiddleware<I, Req, O>>>, RegistryError> {
        let to = middleware.id().to_owned();
        self.ids.swap(id, to, middleware)
    }

    /// Removes the middleware or slot at `id`, vacating its position.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
        self.ids.remove(id)
    }

    /// Returns the middleware at `id`, if one is bound.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn SerializeMiddleware<I, Req, O>>> {
        self.ids.get(id).cloned()
    }

    /// Returns `true` if `id` designates a slot.
    #[must_use]
    pub fn is_slot(&self, id: &str) -> bool {
        self.ids.is_slot(id)
    }

    /// Returns all ids (items and slots) in order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.ids.list()
    }

    /// Removes all middleware and slots.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Composes the registered middleware around `next` and runs the chain,
    /// seeding it with a freshly constructed `request`.
    ///
    /// # Errors
    ///
    /// Returns exactly what the middleware and `next` return.
    pub async fn handle(
        &self,
        cx: &mut Context,
        input: I,
        request: Req,
        next: &dyn Handler<Req, Out = O>,
    ) -> HandlerResult<O> {
        let order = self.ids.get_order();

        let mut chain = SerializeChain::terminal(next);
        for middleware in order.iter().rev() {
            chain = SerializeChain::wrap(middleware.as_ref(), chain);
        }

        let (output, metadata) = chain
            .run(
                cx,
                SerializeInput {
                    parameters: input,
                    request,
                },
            )
            .await?;
        Ok((output.result, metadata))
    }
}

impl<I, Req, O> Default for SerializeStep<I, Req, O>
where
    I: Send + 'static,
    Req: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
