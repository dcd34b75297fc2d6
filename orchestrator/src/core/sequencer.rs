//! Submission pacing for a single-concurrency renderer
//!
//! The renderer corrupts output when it handles overlapping jobs, so every
//! slide after the first waits out a fixed cool-down before it is submitted.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

use crate::config::SequencerConfig;
use crate::traits::Sleeper;

pub struct JobSequencer<S: Sleeper> {
    cool_down: Duration,
    sleeper: Arc<S>,
}

impl<S: Sleeper> JobSequencer<S> {
    pub fn new(config: &SequencerConfig, sleeper: Arc<S>) -> Self {
        Self {
            cool_down: config.cool_down,
            sleeper,
        }
    }

    /// Suspend until it is safe to submit the next slide.
    ///
    /// Applies whether the previous slide succeeded or failed.
    pub async fn await_turn(&self, is_first_slide: bool) {
        if is_first_slide || self.cool_down.is_zero() {
            return;
        }
        debug!("Cooling down renderer for {:?}", self.cool_down);
        self.sleeper.sleep(self.cool_down).await;
    }

    /// Wait out whatever is left of the cool-down after another run released
    /// the renderer at `released_at`
    pub async fn await_handover(&self, released_at: Instant) {
        let remaining = self.cool_down.saturating_sub(released_at.elapsed());
        if remaining.is_zero() {
            return;
        }
        debug!("Renderer handed over, cooling down for {:?}", remaining);
        self.sleeper.sleep(remaining).await;
    }
}

/// Renderer-wide lock shared by every run that targets the same renderer.
///
/// The lock also remembers when the renderer was last released, so the next
/// holder can keep the cool-down across runs. Cloning shares the lock.
#[derive(Debug, Clone, Default)]
pub struct RendererGate {
    lock: Arc<Mutex<Option<Instant>>>,
}

/// Exclusive use of the renderer; stamps the release time when dropped
#[derive(Debug)]
pub struct RendererLease {
    guard: OwnedMutexGuard<Option<Instant>>,
}

impl RendererGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the renderer
    pub async fn acquire(&self) -> RendererLease {
        RendererLease {
            guard: self.lock.clone().lock_owned().await,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

impl RendererLease {
    /// When the previous holder let go, `None` if the renderer is unused
    pub fn last_released(&self) -> Option<Instant> {
        *self.guard
    }
}

impl Drop for RendererLease {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}
