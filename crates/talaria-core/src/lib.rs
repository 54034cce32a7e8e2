//! # Talaria Core
//!
//! Core types and traits shared by the Talaria client runtime crates.
//!
//! This crate defines the narrow seams the pipeline and waiter are built
//! against:
//!
//! - [`Context`] - per-invocation state that flows *down* the handler chain
//! - [`Metadata`] - type-keyed results that flow *up* alongside every output
//! - [`Handler`] - the terminal-delegate contract a pipeline step wraps
//! - [`ApiError`] - error classification for retry and waiter decisions
//!
//! Transport, serialization formats, and operation codegen live outside this
//! workspace and are consumed exclusively through these interfaces.

#![doc(html_root_url = "https://docs.rs/talaria-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod handler;
pub mod metadata;

// Re-export main types at crate root
pub use context::{Context, InvocationId};
pub use error::{ApiError, ErrorFault};
pub use handler::{BoxError, BoxFuture, Handler, HandlerResult};
pub use metadata::Metadata;
