//! Build step: attaches computed fields to an already-serialized request.
//!
//! Build middleware never see the operation parameters; they decorate the
//! transport request (lengths, checksums, user-agent style annotations).

use crate::error::RegistryError;
use crate::order::RelativePosition;
use crate::registry::OrderedRegistry;
use std::sync::Arc;
use talaria_core::{BoxFuture, Context, Handler, HandlerResult, Metadata};

/// Input to the build phase.
#[derive(Debug)]
pub struct BuildInput<Req> {
    /// The serialized transport request.
    pub request: Req,
}

/// Output of the build phase.
#[derive(Debug)]
pub struct BuildOutput<O> {
    /// The modeled operation output produced further down the stack.
    pub result: O,
}

/// Result of running build middleware or the remaining chain.
pub type BuildResult<O> = Result<(BuildOutput<O>, Metadata), talaria_core::BoxError>;

/// Middleware scoped to the build phase.
pub trait BuildMiddleware<Req, O>: Send + Sync + 'static
where
    Req: Send + 'static,
    O: Send + 'static,
{
    /// Unique id of this middleware within the step.
    fn id(&self) -> &str;

    /// Invokes the middleware behavior.
    fn handle<'a>(
        &'a self,
        cx: &'a mut Context,
        input: BuildInput<Req>,
        next: BuildChain<'a, Req, O>,
    ) -> BoxFuture<'a, BuildResult<O>>;
}

/// The remainder of a build chain.
///
/// Consumed by [`Self::run`]; dropping it short-circuits the phase.
pub struct BuildChain<'a, Req, O> {
    link: Link<'a, Req, O>,
}

enum Link<'a, Req, O> {
    Middleware {
        middleware: &'a dyn BuildMiddleware<Req, O>,
        next: Box<BuildChain<'a, Req, O>>,
    },
    Terminal {
        next: &'a dyn Handler<Req, Out = O>,
    },
}

impl<'a, Req, O> BuildChain<'a, Req, O>
where
    Req: Send + 'static,
    O: Send + 'static,
{
    fn terminal(next: &'a dyn Handler<Req, Out = O>) -> Self {
        Self {
            link: Link::Terminal { next },
        }
    }

    fn wrap(middleware: &'a dyn BuildMiddleware<Req, O>, next: Self) -> Self {
        Self {
            link: Link::Middleware {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Runs the remainder of the chain.
    pub async fn run(self, cx: &mut Context, input: BuildInput<Req>) -> BuildResult<O> {
        match self.link {
            Link::Middleware { middleware, next } => middleware.handle(cx, input, *next).await,
            Link::Terminal { next } => {
                let (result, metadata) = next.handle(cx, input.request).await?;
                Ok((BuildOutput { result }, metadata))
            }
        }
    }
}

/// Ordered grouping of build middleware, invoked as one handler.
pub struct BuildStep<Req, O> {
    ids: OrderedRegistry<Arc<dyn BuildMiddleware<Req, O>>>,
}

impl<Req, O> BuildStep<Req, O>
where
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
        "Build"
    }

    /// Adds `middleware` at the given end of the step.
    ///
    /// # Errors
    ///
    /// Propagates registry configuration errors.
    pub fn add(
        &mut self,
        middleware: Arc<dyn BuildMiddleware<Req, O>>,
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
        middleware: Arc<dyn BuildMiddleware<Req, O>>,
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
        middleware: Arc<dyn BuildMiddleware<Req, O>>,
    ) -> Result<Option<Arc<dyn BuildMiddleware<Req, O>>>, RegistryError> {
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
    pub fn get(&self, id: &str) -> Option<Arc<dyn BuildMiddleware<Req, O>>> {
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

    /// Composes the registered middleware around `next` and runs the chain.
    ///
    /// # Errors
    ///
    /// Returns exactly what the middleware and `next` return.
    pub async fn handle(
        &self,
        cx: &mut Context,
        request: Req,
        next: &dyn Handler<Req, Out = O>,
    ) -> HandlerResult<O> {
        let order = self.ids.get_order();

        let mut chain = BuildChain::terminal(next);
        for middleware in order.iter().rev() {
            chain = BuildChain::wrap(middleware.as_ref(), chain);
        }

        let (output, metadata) = chain.run(cx, BuildInput { request }).await?;
        Ok((output.result, metadata))
    }
}

impl<Req, O> Default for BuildStep<Req, O>
where
    Req: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
