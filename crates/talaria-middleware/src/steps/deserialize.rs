//! Deserialize step: the innermost phase, wrapping the transport.
//!
//! The terminal link of this chain invokes the transport and surfaces the
//! raw response. Deserialize middleware unmarshal that raw response into
//! the modeled operation output on the way back up; the step itself returns
//! the modeled output to the phases above it.

use crate::error::{ChainError, RegistryError};
use crate::order::RelativePosition;
use crate::registry::OrderedRegistry;
use std::sync::Arc;
use talaria_core::{BoxError, BoxFuture, Context, Handler, HandlerResult, Metadata};

/// Input to the deserialize phase.
#[derive(Debug)]
pub struct DeserializeInput<Req> {
    /// The finalized transport request.
    pub request: Req,
}

/// Output of the deserialize phase.
///
/// The terminal link fills `raw_response`; deserialize middleware are
/// responsible for filling `result` from it. Short-circuiting middleware
/// (caches, mocks) may fill `result` without any raw response existing.
#[derive(Debug)]
pub struct DeserializeOutput<Res, O> {
    /// The raw transport response, when the transport was reached.
    pub raw_response: Option<Res>,
    /// The modeled operation output, once a middleware has produced it.
    pub result: Option<O>,
}

/// Result of running deserialize middleware or the remaining chain.
pub type DeserializeResult<Res, O> =
    Result<(DeserializeOutput<Res, O>, Metadata), talaria_core::BoxError>;

/// Middleware scoped to the deserialize phase.
pub trait DeserializeMiddleware<Req, Res, O>: Send + Sync + 'static
where
    Req: Send + 'static,
    Res: Send + 'static,
    O: Send + 'static,
{
    /// Unique id of this middleware within the step.
    fn id(&self) -> &str;

    /// Invokes the middleware behavior.
    ///
    /// Implementations should forward the request unchanged and transform
    /// the output returned by `next`.
    fn handle<'a>(
        &'a self,
        cx: &'a mut Context,
        input: DeserializeInput<Req>,
        next: DeserializeChain<'a, Req, Res, O>,
    ) -> BoxFuture<'a, DeserializeResult<Res, O>>;
}

/// The remainder of a deserialize chain.
///
/// Consumed by [`Self::run`]; dropping it short-circuits the phase.
pub struct DeserializeChain<'a, Req, Res, O> {
    link: Link<'a, Req, Res, O>,
}

enum Link<'a, Req, Res, O> {
    Middleware {
        middleware: &'a dyn DeserializeMiddleware<Req, Res, O>,
        next: Box<DeserializeChain<'a, Req, Res, O>>,
    },
    Terminal {
        next: &'a dyn Handler<Req, Out = Res>,
    },
}

impl<'a, Req, Res, O> DeserializeChain<'a, Req, Res, O>
where
    Req: Send + 'static,
    Res: Send + 'static,
    O: Send + 'static,
{
    fn terminal(next: &'a dyn Handler<Req, Out = Res>) -> Self {
        Self {
            link: Link::Terminal { next },
        }
    }

    fn wrap(middleware: &'a dyn DeserializeMiddleware<Req, Res, O>, next: Self) -> Self {
        Self {
            link: Link::Middleware {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Runs the remainder of the chain. The terminal invokes the transport
    /// and lifts its response into the phase shape, result unset.
    pub async fn run(
        self,
        cx: &mut Context,
        input: DeserializeInput<Req>,
    ) -> DeserializeResult<Res, O> {
        match self.link {
            Link::Middleware { middleware, next } => middleware.handle(cx, input, *next).await,
            Link::Terminal { next } => {
                let (response, metadata) = next.handle(cx, input.request).await?;
                Ok((
                    DeserializeOutput {
                        raw_response: Some(response),
                        result: None,
                    },
                    metadata,
                ))
            }
        }
    }
}

/// Ordered grouping of deserialize middleware, invoked as one handler.
pub struct DeserializeStep<Req, Res, O> {
    ids: OrderedRegistry<Arc<dyn DeserializeMiddleware<Req, Res, O>>>,
}

impl<Req, Res, O> DeserializeStep<Req, Res, O>
where
    Req: Send + 'static,
    Res: Send + 'static,
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
        "Deserialize"
    }

    /// Adds `middleware` at the given end of the step.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn add(
        &mut self,
        middleware: Arc<dyn DeserializeMiddleware<Req, Res, O>>,
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
        middleware: Arc<dyn DeserializeMiddleware<Req, Res, O>>,
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
        middleware: Arc<dyn DeserializeMiddleware<Req, Res, O>>,
    ) -> Result<Option<Arc<dyn DeserializeMiddleware<Req, Res, O>>>, RegistryError> {
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
    pub fn get(&self, id: &str) -> Option<Arc<dyn DeserializeMiddleware<Req, Res, O>>> {
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

    /// Composes the registered middleware around the transport and runs the
    /// chain, returning the modeled output the chain produced.
    ///
    /// # Errors
    ///
    /// Returns what the middleware and transport return, plus
    /// [`ChainError::MissingResult`] if the chain completes without any
    /// middleware producing a result.
    pub async fn handle(
        &self,
        cx: &mut Context,
        request: Req,
        next: &dyn Handler<Req, Out = Res>,
    ) -> HandlerResult<O> {
        let order = self.ids.get_order();

        let mut chain = DeserializeChain::terminal(next);
        for middleware in order.iter().rev() {
            chain = DeserializeChain::wrap(middleware.as_ref(), chain);
        }

        let (output, metadata) = chain.run(cx, DeserializeInput { request }).await?;
        let result = output
            .result
            .ok_or_else(|| BoxError::from(ChainError::MissingResult))?;
        Ok((result, metadata))
    }
}

impl<Req, Res, O> Default for DeserializeStep<Req, Res, O>
where
    Req: Send + 'static,
    Res: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
