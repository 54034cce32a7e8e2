//! Initialize step: the outermost pipeline phase.
//!
//! Initialize middleware see the modeled operation input before any
//! serialization has happened. Typical residents: default-value injection,
//! input validation, idempotency-token generation.

use crate::error::RegistryError;
use crate::order::RelativePosition;
use crate::registry::OrderedRegistry;
use std::sync::Arc;
use talaria_core::{BoxFuture, Context, Handler, HandlerResult, Metadata};

/// Input to the initialize phase.
#[derive(Debug)]
pub struct InitializeInput<I> {
    /// The modeled operation input.
    pub parameters: I,
}

/// Output of the initialize phase.
#[derive(Debug)]
pub struct InitializeOutput<O> {
    /// The modeled operation output produced further down the stack.
    pub result: O,
}

/// Result of running initialize middleware or the remaining chain.
pub type InitializeResult<O> = Result<(InitializeOutput<O>, Metadata), talaria_core::BoxError>;

/// Middleware scoped to the initialize phase.
///
/// Implementations continue the chain by running `next`, or short-circuit
/// by returning without running it, e.g. to serve a cached result or fail
/// validation early.
pub trait InitializeMiddleware<I, O>: Send + Sync + 'static
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Unique id of this middleware within the step.
    fn id(&self) -> &str;

    /// Invokes the middleware behavior.
    fn handle<'a>(
        &'a self,
        cx: &'a mut Context,
        input: InitializeInput<I>,
        next: InitializeChain<'a, I, O>,
    ) -> BoxFuture<'a, InitializeResult<O>>;
}

/// The remainder of an initialize chain: zero or more middleware, then the
/// step's terminal handler.
///
/// Running the chain consumes it, so delegation can happen at most once;
/// dropping it short-circuits the phase.
pub struct InitializeChain<'a, I, O> {
    link: Link<'a, I, O>,
}

enum Link<'a, I, O> {
    Middleware {
        middleware: &'a dyn InitializeMiddleware<I, O>,
        next: Box<InitializeChain<'a, I, O>>,
    },
    Terminal {
        next: &'a dyn Handler<I, Out = O>,
    },
}

impl<'a, I, O> InitializeChain<'a, I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn terminal(next: &'a dyn Handler<I, Out = O>) -> Self {
        Self {
            link: Link::Terminal { next },
        }
    }

    fn wrap(middleware: &'a dyn InitializeMiddleware<I, O>, next: Self) -> Self {
        Self {
            link: Link::Middleware {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Runs the remainder of the chain.
    ///
    /// The terminal link forwards the (possibly modified) parameters to the
    /// step's next handler and lifts its output into the phase shape.
    pub async fn run(self, cx: &mut Context, input: InitializeInput<I>) -> InitializeResult<O> {
        match self.link {
            Link::Middleware { middleware, next } => middleware.handle(cx, input, *next).await,
            Link::Terminal { next } => {
                let (result, metadata) = next.handle(cx, input.parameters).await?;
                Ok((InitializeOutput { result }, metadata))
            }
        }
    }
}

/// Ordered grouping of initialize middleware, invoked as one handler.
pub struct InitializeStep<I, O> {
    ids: OrderedRegistry<Arc<dyn InitializeMiddleware<I, O>>>,
}

impl<I, O> InitializeStep<I, O>
where
    I: Send + 'static,
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
        "Initialize"
    }

    /// Adds `middleware` at the given end of the step.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors (empty/duplicate id).
    pub fn add(
        &mut self,
        middleware: Arc<dyn InitializeMiddleware<I, O>>,
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
    /// Propagates registry configuration errors (empty id, duplicate,
    /// missing anchor).
    pub fn insert(
        &mut self,
        middleware: Arc<dyn InitializeMiddleware<I, O>>,
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

    /// Replaces the middleware at `id`, returning the previous one (`None`
    /// when `id` was an unfilled slot).
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors (missing id, duplicate
    /// target, slot-identity mismatch).
    pub fn swap(
        &mut self,
        id: &str,
        middleware: Arc<dyn InitializeMiddleware<I, O>>,
    ) -> Result<Option<Arc<dyn InitializeMiddleware<I, O>>>, RegistryError> {
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
    pub fn get(&self, id: &str) -> Option<Arc<dyn InitializeMiddleware<I, O>>> {
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

    /// Composes the registered middleware (in registry order) around `next`
    /// and runs the resulting chain.
    ///
    /// # Errors
    ///
    /// Returns exactly what the middleware and `next` return; the step adds
    /// no failure behavior of its own at request time.
    pub async fn handle(
        &self,
        cx: &mut Context,
        input: I,
        next: &dyn Handler<I, Out = O>,
    ) -> HandlerResult<O> {
        let order = self.ids.get_order();

        let mut chain = InitializeChain::terminal(next);
        for middleware in order.iter().rev() {
            chain = InitializeChain::wrap(middleware.as_ref(), chain);
        }

        let (output, metadata) = chain.run(cx, InitializeInput { parameters: input }).await?;
        Ok((output.result, metadata))
    }
}

impl<I, O> Default for InitializeStep<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
