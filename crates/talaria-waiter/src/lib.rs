//! # Talaria Waiter
//!
//! Polling waiter engine for the Talaria client runtime.
//!
//! A waiter re-invokes one operation until a declared terminal condition or
//! the wait budget is reached:
//!
//! ```text
//! ┌─> invoke operation ──> evaluate acceptors ──> terminal? ──> return
//! │                                                  │
//! └────────── backoff sleep (deadline-bounded) <── retry
//! ```
//!
//! - [`Acceptor`]s map `(output | input+output | success | error-type)`
//!   conditions to Success / Failure / Retry states, evaluated in declared
//!   order with first-match-wins; no match means keep polling.
//! - Backoff grows exponentially between [`WaiterOptions`] `min_delay` and
//!   `max_delay` with jitter, never exceeding the remaining budget.
//! - Timeout ([`WaiterError::ExceededMaxWait`]) and cancellation
//!   ([`WaiterError::Cancelled`]) are distinct terminal errors.

#![doc(html_root_url = "https://docs.rs/talaria-waiter/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod acceptor;
pub mod backoff;
pub mod error;
pub mod path;
pub mod waiter;

// Re-export main types at crate root
pub use acceptor::{Acceptor, AcceptorState, Matcher, PathComparator};
pub use backoff::compute_delay;
pub use error::WaiterError;
pub use path::{JsonPointer, PathError, PathExtractor};
pub use waiter::{
    Operation, OptionOverride, Retryable, Waiter, WaiterOptions, DEFAULT_MAX_DELAY,
    DEFAULT_MIN_DELAY,
};
