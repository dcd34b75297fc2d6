//! Resilient sequential render orchestration for multi-slide carousels
//!
//! Slides are rendered one at a time against a single-concurrency render
//! service. Transient failures and placeholder images are retried with
//! exponential backoff, consecutive submissions are spaced by a cool-down,
//! and a fully rendered carousel is persisted exactly once.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator_impl;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{FailurePolicy, OrchestratorConfig, RetryConfig, SequencerConfig};
pub use crate::core::{Classification, Classifier, JobSequencer, RendererGate, ResultAggregator, RetryDecision, RetryPolicy};
pub use error::{ClientError, OrchestratorError, OrchestratorResult, PersistenceError, SubmissionError};
pub use orchestrator_impl::RenderJobOrchestrator;
pub use traits::{CarouselPersistence, RenderServiceClient, Sleeper};
pub use types::{CancellationFlag, RawResult};
