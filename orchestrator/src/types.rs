//! Orchestrator-specific data types

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the render service answered for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    /// The service produced an image at `url`
    Rendered { url: String },
    /// The service declined the job; `retryable` is its own overload hint
    Rejected { retryable: bool, error: String },
}

impl RawResult {
    pub fn rendered(url: impl Into<String>) -> Self {
        RawResult::Rendered { url: url.into() }
    }

    pub fn overloaded(error: impl Into<String>) -> Self {
        RawResult::Rejected {
            retryable: true,
            error: error.into(),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        RawResult::Rejected {
            retryable: false,
            error: error.into(),
        }
    }
}

/// Cooperative cancellation for an in-progress run.
///
/// Checked only at slide boundaries and before retry waits; an attempt that
/// is already in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
