//! The handler contract pipeline steps are built against.
//!
//! A [`Handler`] is the terminal delegate a step wraps: either the next
//! pipeline phase or the transport itself. Steps never know which; they
//! compose their middleware chain around whatever handler they are given.

use crate::context::Context;
use crate::metadata::Metadata;
use std::future::Future;
use std::pin::Pin;

/// A boxed future, the return type of dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased error crossing chain boundaries.
///
/// Middleware and transports are independently authored, so the chain
/// propagates their failures opaquely; callers downcast or inspect sources
/// where they need more.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of one handler invocation: the output plus the metadata
/// accumulated beneath it, or an error.
pub type HandlerResult<T> = Result<(T, Metadata), BoxError>;

/// A delegate that accepts an input and produces an output with metadata.
///
/// This is the seam between pipeline phases, and between the innermost
/// phase and the transport. Implementations must be safe to invoke from
/// concurrent calls sharing one instance.
///
/// # Example
///
/// ```
/// use talaria_core::{BoxFuture, Context, Handler, HandlerResult, Metadata};
///
/// /// Echoes its input back as the output.
/// struct Echo;
///
/// impl Handler<String> for Echo {
///     type Out = String;
///
///     fn handle<'a>(
///         &'a self,
///         _cx: &'a mut Context,
///         input: String,
///     ) -> BoxFuture<'a, HandlerResult<String>> {
///         Box::pin(async move { Ok((input, Metadata::new())) })
///     }
/// }
/// ```
pub trait Handler<In>: Send + Sync
where
    In: Send + 'static,
{
    /// The output type this handler produces.
    type Out: Send + 'static;

    /// Handles one input, returning the output and accumulated metadata.
    fn handle<'a>(&'a self, cx: &'a mut Context, input: In) -> BoxFuture<'a, HandlerResult<Self::Out>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Handler<u32> for Doubler {
        type Out = u32;

        fn handle<'a>(&'a self, _cx: &'a mut Context, input: u32) -> BoxFuture<'a, HandlerResult<u32>> {
            Box::pin(async move { Ok((input * 2, Metadata::new())) })
        }
    }

    #[tokio::test]
    async fn test_handler_invocation() {
        let mut cx = Context::new();
        let (out, metadata) = Doubler.handle(&mut cx, 21).await.unwrap();
        assert_eq!(out, 42);
        assert!(metadata.is_empty());
    }

    #[tokio::test]
    async fn test_handler_as_trait_object() {
        let handler: &dyn Handler<u32, Out = u32> = &Doubler;
        let mut cx = Context::new();
        let (out, _) = handler.handle(&mut cx, 4).await.unwrap();
        assert_eq!(out, 8);
    }
}
