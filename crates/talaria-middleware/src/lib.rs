//! # Talaria Middleware
//!
//! Ordered, slot-aware middleware stack for the Talaria client runtime.
//!
//! Every operation invocation flows through a [`Stack`] of five fixed
//! phases; each phase is a [`steps`] step holding an ordered, mutable
//! registry of middleware:
//!
//! ```text
//! Input → Initialize → Serialize → Build → Finalize → Deserialize → Transport
//! ```
//!
//! ## Ordering model
//!
//! Independently-authored middleware are composed without a global total
//! order. Within a step, middleware are placed at either end
//! ([`RelativePosition`]) or anchored before/after an existing id, and a
//! **slot** can reserve a position before its behavior exists. Conflicts
//! (duplicate ids, missing anchors, slot-identity mismatches) are
//! configuration errors reported at mutation time, never at request time.
//!
//! ## Execution model
//!
//! When a request arrives, each step snapshots its registry order and folds
//! it, in reverse, into an explicit chain around the step's next handler,
//! so the first-registered middleware runs outermost. Middleware continue
//! the chain by running the `next` value they are handed, or short-circuit
//! by dropping it; the chain is consumed on use, so delegating twice is
//! unrepresentable.

#![doc(html_root_url = "https://docs.rs/talaria-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod order;
pub mod registry;
pub mod stack;
pub mod steps;

// Re-export main types at crate root
pub use error::{ChainError, RegistryError};
pub use order::{RelativeOrder, RelativePosition};
pub use registry::OrderedRegistry;
pub use stack::Stack;
