//! The five pipeline phases.
//!
//! Each phase is a distinct step type with its own middleware trait and
//! phase-shaped input/output, but all five share the same anatomy: an
//! ordered registry of middleware, the full mutation surface, and a
//! `handle` that folds the registry snapshot (in reverse) into a chain
//! around the step's next handler.
//!
//! ```text
//! Input → Initialize → Serialize → Build → Finalize → Deserialize → Transport
//!                                                                      ↓
//! Output ←──────────────────── result flows back up ←──────────── Response
//! ```

pub mod build;
pub mod deserialize;
pub mod finalize;
pub mod initialize;
pub mod serialize;

pub use build::{BuildChain, BuildInput, BuildMiddleware, BuildOutput, BuildResult, BuildStep};
pub use deserialize::{
    DeserializeChain, DeserializeInput, DeserializeMiddleware, DeserializeOutput,
    DeserializeResult, DeserializeStep,
};
pub use finalize::{
    FinalizeChain, FinalizeInput, FinalizeMiddleware, FinalizeOutput, FinalizeResult, FinalizeStep,
};
pub use initialize::{
    InitializeChain, InitializeInput, InitializeMiddleware, InitializeOutput, InitializeResult,
    InitializeStep,
};
pub use serialize::{
    SerializeChain, SerializeInput, SerializeMiddleware, SerializeOutput, SerializeResult,
    SerializeStep,
};
