//! Carousel run driver
//!
//! Walks the slides of one submission in order, paces them through the
//! sequencer, drives each slide's state machine against the render client,
//! and hands a completed run to persistence exactly once.

use std::sync::Arc;
use std::time::Duration;

use shared::{
    run_debug, run_error, run_info, run_warn, AttemptClassification, CarouselOptions, CarouselRun, JobAttempt,
    RenderOutcome, RunId, RunStatus, SlideSpec,
};

use crate::config::{FailurePolicy, OrchestratorConfig};
use crate::core::{Classifier, JobSequencer, RendererGate, ResultAggregator, RetryPolicy, SlideMachine, SlideState};
use crate::error::{ClientError, OrchestratorError, OrchestratorResult, SubmissionError};
use crate::traits::{CarouselPersistence, RenderServiceClient, Sleeper};
use crate::types::CancellationFlag;

/// How a single slide's retry loop ended
enum SlideRun {
    Finished {
        outcome: RenderOutcome,
        attempts: Vec<JobAttempt>,
    },
    /// Cancellation was requested before a retry wait
    Interrupted,
}

/// Sequential, retrying render orchestrator.
///
/// Within a run there is never more than one render call in flight. Separate
/// runs may share one orchestrator through `Arc`; give them a common
/// [`RendererGate`] when they also share a single renderer.
pub struct RenderJobOrchestrator<C, P, S>
where
    C: RenderServiceClient,
    P: CarouselPersistence,
    S: Sleeper,
{
    client: C,
    persistence: P,
    sleeper: Arc<S>,
    sequencer: JobSequencer<S>,
    policy: RetryPolicy,
    classifier: Classifier,
    render_timeout: Duration,
    failure_policy: FailurePolicy,
    gate: Option<RendererGate>,
}

impl<C, P, S> RenderJobOrchestrator<C, P, S>
where
    C: RenderServiceClient,
    P: CarouselPersistence,
    S: Sleeper,
{
    /// Create an orchestrator with all injected dependencies
    pub fn new(config: &OrchestratorConfig, client: C, persistence: P, sleeper: Arc<S>) -> OrchestratorResult<Self> {
        if config.render_timeout.is_zero() {
            return Err(OrchestratorError::ConfigurationError {
                field: "render_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            client,
            persistence,
            sequencer: JobSequencer::new(&config.sequencer, Arc::clone(&sleeper)),
            sleeper,
            policy: RetryPolicy::new(&config.retry)?,
            classifier: Classifier::new(config.placeholder_markers.clone()),
            render_timeout: config.render_timeout,
            failure_policy: config.failure_policy,
            gate: config.serialize_runs.then(RendererGate::new),
        })
    }

    /// Serialize runs through a gate shared with other orchestrators
    pub fn with_renderer_gate(mut self, gate: RendererGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn renderer_gate(&self) -> Option<&RendererGate> {
        self.gate.as_ref()
    }

    /// Render every slide in order and persist the finished carousel
    pub async fn submit_carousel(
        &self,
        slides: Vec<SlideSpec>,
        options: CarouselOptions,
    ) -> Result<CarouselRun, SubmissionError> {
        self.submit_with_cancellation(slides, options, &CancellationFlag::new())
            .await
    }

    /// Like [`submit_carousel`](Self::submit_carousel), stopping early once
    /// `cancel` is raised. An attempt already in flight always completes.
    pub async fn submit_with_cancellation(
        &self,
        slides: Vec<SlideSpec>,
        options: CarouselOptions,
        cancel: &CancellationFlag,
    ) -> Result<CarouselRun, SubmissionError> {
        validate_submission(&slides)?;

        let run_id = RunId::new();
        let total = slides.len();

        let lease = match &self.gate {
            Some(gate) => {
                if gate.is_busy() {
                    run_info!(run_id, "Waiting for renderer held by another run");
                }
                Some(gate.acquire().await)
            }
            None => None,
        };
        let handed_over_at = lease.as_ref().and_then(|lease| lease.last_released());

        run_info!(run_id, slides = total, "Starting carousel \"{}\"", options.title);
        let mut aggregator = ResultAggregator::new(run_id, options);

        for (index, spec) in slides.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Self::cancelled(aggregator));
            }

            match (index, handed_over_at) {
                (0, Some(released_at)) => self.sequencer.await_handover(released_at).await,
                _ => self.sequencer.await_turn(index == 0).await,
            }

            let (outcome, attempts) = match self.render_slide(run_id, &spec, cancel).await {
                Ok(SlideRun::Finished { outcome, attempts }) => (outcome, attempts),
                Ok(SlideRun::Interrupted) => return Err(Self::cancelled(aggregator)),
                Err(source) => return Err(internal_failure(aggregator, source)),
            };

            let ordinal = spec.ordinal;
            let failure = match &outcome {
                RenderOutcome::FatalFailure { reason } => Some(reason.clone()),
                RenderOutcome::Success { .. } => None,
            };
            if let Err(source) = aggregator.record(spec, outcome, attempts) {
                return Err(internal_failure(aggregator, source));
            }

            if let Some(reason) = failure {
                match self.failure_policy {
                    FailurePolicy::AbortOnFirst => {
                        run_error!(
                            run_id,
                            slide = ordinal,
                            recovered = aggregator.succeeded(),
                            "Aborting carousel: {}",
                            reason
                        );
                        let run = aggregator.finish(RunStatus::Aborted);
                        return Err(SubmissionError::RenderFailed {
                            slide_ordinal: ordinal,
                            reason,
                            run: Box::new(run),
                        });
                    }
                    FailurePolicy::SkipAndContinue => {
                        run_warn!(run_id, slide = ordinal, "Skipping failed slide: {}", reason);
                    }
                }
            }
        }

        let status = aggregator.resolve_status(total);
        let run = aggregator.finish(status);
        drop(lease);
        run_info!(
            run_id,
            succeeded = run.succeeded,
            failed = run.failed,
            "Carousel finished with status {}",
            run.status
        );

        if !run.is_complete() {
            return Err(SubmissionError::PartiallyFailed {
                failed_ordinals: run.failed_ordinals(),
                run: Box::new(run),
            });
        }

        self.persist(run).await
    }

    /// Retry loop for one slide, driven by its state machine
    async fn render_slide(
        &self,
        run_id: RunId,
        spec: &SlideSpec,
        cancel: &CancellationFlag,
    ) -> OrchestratorResult<SlideRun> {
        let mut machine = SlideMachine::new(spec.ordinal, &self.policy);

        loop {
            let attempt = machine.begin_attempt()?;
            run_debug!(run_id, slide = spec.ordinal, attempt, "Submitting slide to renderer");

            let result = match tokio::time::timeout(self.render_timeout, self.client.render(spec)).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(self.render_timeout)),
            };
            let classification = self.classifier.classify(&result);

            match machine.complete_attempt(classification)? {
                SlideState::Succeeded { url } => {
                    run_info!(run_id, slide = spec.ordinal, attempt, "Slide rendered: {}", url);
                    break;
                }
                SlideState::Failed { reason } => {
                    run_warn!(run_id, slide = spec.ordinal, attempt, "Slide failed: {}", reason);
                    break;
                }
                SlideState::Waiting { next_attempt, delay } => {
                    if let Some(reason) = machine.attempts().last().and_then(retry_reason) {
                        run_warn!(
                            run_id,
                            slide = spec.ordinal,
                            attempt,
                            "Transient render failure: {}; retrying in {:?} (attempt {} of {})",
                            reason,
                            delay,
                            next_attempt + 1,
                            self.policy.max_attempts()
                        );
                    }
                    if cancel.is_cancelled() {
                        return Ok(SlideRun::Interrupted);
                    }
                    self.sleeper.sleep(delay).await;
                }
                other => {
                    return Err(OrchestratorError::InvalidTransition {
                        ordinal: spec.ordinal,
                        action: "settle an attempt",
                        state: other.to_string(),
                    })
                }
            }
        }

        let (outcome, attempts) = machine.finish()?;
        Ok(SlideRun::Finished { outcome, attempts })
    }

    async fn persist(&self, run: CarouselRun) -> Result<CarouselRun, SubmissionError> {
        match self.persistence.save(&run).await {
            Ok(()) => {
                run_info!(run.run_id, slides = run.entries.len(), "Carousel persisted");
                Ok(run)
            }
            Err(e) => {
                run_error!(
                    run.run_id,
                    recovered = run.succeeded,
                    "Carousel rendered but persistence failed: {}",
                    e
                );
                Err(SubmissionError::PersistenceFailed {
                    reason: e.to_string(),
                    run: Box::new(run),
                })
            }
        }
    }

    fn cancelled(aggregator: ResultAggregator) -> SubmissionError {
        let run_id = aggregator.run_id();
        run_warn!(
            run_id,
            recorded = aggregator.len(),
            "Carousel cancelled before slide {}",
            aggregator.expected_ordinal()
        );
        SubmissionError::Cancelled {
            run: Box::new(aggregator.finish(RunStatus::Aborted)),
        }
    }
}

/// Stop a run on an orchestrator fault, keeping what was already rendered
fn internal_failure(aggregator: ResultAggregator, source: OrchestratorError) -> SubmissionError {
    run_error!(
        aggregator.run_id(),
        recovered = aggregator.succeeded(),
        "Carousel stopped by internal error: {}",
        source
    );
    SubmissionError::Internal {
        source,
        run: Some(Box::new(aggregator.finish(RunStatus::Aborted))),
    }
}

fn retry_reason(attempt: &JobAttempt) -> Option<&str> {
    match &attempt.classification {
        AttemptClassification::Retryable { reason } => Some(reason.as_str()),
        _ => None,
    }
}

/// Slides must be non-empty, numbered 1..=N in submission order, and sized
fn validate_submission(slides: &[SlideSpec]) -> Result<(), SubmissionError> {
    if slides.is_empty() {
        return Err(SubmissionError::InvalidSubmission {
            reason: "carousel has no slides".to_string(),
        });
    }

    for (index, spec) in slides.iter().enumerate() {
        let expected = index as u32 + 1;
        if spec.ordinal != expected {
            return Err(SubmissionError::InvalidSubmission {
                reason: format!("slide at position {} has ordinal {}", expected, spec.ordinal),
            });
        }
        if spec.dimensions.is_empty() {
            return Err(SubmissionError::InvalidSubmission {
                reason: format!("slide {} has empty dimensions", spec.ordinal),
            });
        }
    }

    Ok(())
}
