//! Render orchestration core logic
//!
//! Everything in here is free of network and file I/O.

pub mod aggregator;
pub mod classify;
pub mod retry;
pub mod sequencer;
pub mod slide;

pub use aggregator::ResultAggregator;
pub use classify::{Classification, Classifier};
pub use retry::{FailureKind, RetryDecision, RetryPolicy};
pub use sequencer::{JobSequencer, RendererGate, RendererLease};
pub use slide::{SlideMachine, SlideState};
