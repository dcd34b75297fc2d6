//! Orchestrator-specific error types

use std::time::Duration;
use thiserror::Error;
use shared::{CarouselRun, SharedError};

/// Failures raised by a render service client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Render request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid render input: {0}")]
    InvalidInput(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Malformed input is a caller bug; everything else may clear up on its own
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ClientError::InvalidInput(_))
    }
}

/// Failures raised while storing a finished carousel
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence endpoint rejected run (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Persistence transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {field} - {message}")]
    ConfigurationError { field: String, message: String },

    #[error("Slide {ordinal} recorded out of order (expected slide {expected})")]
    OrderingViolation { ordinal: u32, expected: u32 },

    #[error("Slide {ordinal} cannot {action} while {state}")]
    InvalidTransition {
        ordinal: u32,
        action: &'static str,
        state: String,
    },

    #[error("Shared component error")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Caller-facing failures of a carousel submission.
///
/// Every variant that carries a run keeps the URLs rendered so far, so
/// generated work is never lost.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Slide {slide_ordinal} failed to render: {reason}")]
    RenderFailed {
        slide_ordinal: u32,
        reason: String,
        run: Box<CarouselRun>,
    },

    #[error("Carousel finished with failed slides {failed_ordinals:?}")]
    PartiallyFailed {
        failed_ordinals: Vec<u32>,
        run: Box<CarouselRun>,
    },

    #[error("Carousel rendered but was not saved: {reason}")]
    PersistenceFailed { reason: String, run: Box<CarouselRun> },

    #[error("Carousel run was cancelled")]
    Cancelled { run: Box<CarouselRun> },

    #[error("Invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Internal orchestrator error: {source}")]
    Internal {
        source: OrchestratorError,
        /// Present when the fault hit a run already under way
        run: Option<Box<CarouselRun>>,
    },
}

impl SubmissionError {
    /// The run as it stood when the submission stopped, if one was started
    pub fn run(&self) -> Option<&CarouselRun> {
        match self {
            SubmissionError::RenderFailed { run, .. }
            | SubmissionError::PartiallyFailed { run, .. }
            | SubmissionError::PersistenceFailed { run, .. }
            | SubmissionError::Cancelled { run } => Some(&**run),
            SubmissionError::Internal { run, .. } => run.as_deref(),
            SubmissionError::InvalidSubmission { .. } => None,
        }
    }

    /// Rendered slide URLs still available for manual recovery
    pub fn recovered_urls(&self) -> Vec<String> {
        self.run().map(CarouselRun::rendered_urls).unwrap_or_default()
    }

    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            SubmissionError::RenderFailed { .. } | SubmissionError::PartiallyFailed { .. }
        )
    }
}
