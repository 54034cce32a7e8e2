//! # Talaria
//!
//! **Request-processing core for generated API clients**
//!
//! Talaria provides the two hard parts every generated client shares:
//!
//! - **Middleware stack** – an ordered, mutable pipeline of five fixed
//!   phases (Initialize → Serialize → Build → Finalize → Deserialize).
//!   Independently-authored middleware are composed by relative position
//!   and reserved slots, with conflicts rejected at setup time.
//! - **Waiters** – a polling engine that re-invokes an operation under a
//!   wait budget, judging each attempt with declarative acceptors and
//!   sleeping with deadline-bounded exponential backoff in between.
//!
//! Everything else (codegen, wire formats, transport, configuration) is
//! a collaborator consumed through the narrow traits in [`core`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talaria::prelude::*;
//!
//! let mut stack: Stack<GetWidgetInput, GetWidgetOutput, Request, Response> =
//!     Stack::new("GetWidget", Request::default);
//! stack.serialize.add(Arc::new(SerializeGetWidget), RelativePosition::After)?;
//! stack.deserialize.add(Arc::new(DeserializeGetWidget), RelativePosition::After)?;
//!
//! let mut cx = Context::new();
//! let (output, metadata) = stack.handle(&mut cx, input, &transport).await?;
//! ```

#![doc(html_root_url = "https://docs.rs/talaria/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use talaria_core as core;

// Re-export middleware stack types
pub use talaria_middleware as middleware;

// Re-export waiter types
pub use talaria_waiter as waiter;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use talaria::prelude::*;
/// ```
pub mod prelude {
    pub use talaria_core::{
        ApiError, BoxError, BoxFuture, Context, ErrorFault, Handler, HandlerResult, InvocationId,
        Metadata,
    };

    // Re-export stack configuration types
    pub use talaria_middleware::{RegistryError, RelativePosition, Stack};

    // Re-export waiter configuration types
    pub use talaria_waiter::{
        Acceptor, AcceptorState, Matcher, Operation, PathComparator, Waiter, WaiterError,
        WaiterOptions,
    };
}
