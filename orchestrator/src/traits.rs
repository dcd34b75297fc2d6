//! Trait definitions with mockall annotations for testing
//!
//! The orchestrator only depends on these seams: the remote renderer, the
//! store for finished carousels, and the clock used for every wait.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;

use shared::{CarouselRun, SlideSpec};
use crate::error::{ClientError, PersistenceError};
use crate::types::RawResult;

/// Remote render service, one request per call.
///
/// Implementations must not retry internally; retry and pacing belong to
/// the orchestrator.
#[mockall::automock]
#[async_trait]
pub trait RenderServiceClient: Send + Sync {
    /// Submit one slide for rendering
    async fn render(&self, spec: &SlideSpec) -> Result<RawResult, ClientError>;
}

/// Durable store for completed carousels
#[mockall::automock]
#[async_trait]
pub trait CarouselPersistence: Send + Sync {
    /// Store a finished run. Called at most once per run.
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError>;
}

/// Suspension seam so backoff and cool-down can be tested without real timers
#[mockall::automock]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: RenderServiceClient + ?Sized> RenderServiceClient for Arc<T> {
    async fn render(&self, spec: &SlideSpec) -> Result<RawResult, ClientError> {
        (**self).render(spec).await
    }
}

#[async_trait]
impl<T: CarouselPersistence + ?Sized> CarouselPersistence for Arc<T> {
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError> {
        (**self).save(run).await
    }
}

#[async_trait]
impl<T: CarouselPersistence + ?Sized> CarouselPersistence for Box<T> {
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError> {
        (**self).save(run).await
    }
}
