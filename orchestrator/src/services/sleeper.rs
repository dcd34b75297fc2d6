//! Sleeper implementations
//!
//! `TokioSleeper` is the production clock. The test-only `RecordingSleeper`
//! returns at once and keeps every requested delay.

#[cfg(test)]
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use crate::traits::Sleeper;

/// Suspends on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl TokioSleeper {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays without waiting.
///
/// Clones share the same record.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    recorded: Arc<Mutex<Vec<Duration>>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in call order
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
