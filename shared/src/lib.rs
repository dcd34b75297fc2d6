//! Shared types for the carousel render system
//!
//! Holds the run data model, common errors and the tracing setup used by
//! every crate in the workspace.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;

// Lets the `run_*!` macros resolve without a direct tracing dependency
pub use tracing;
