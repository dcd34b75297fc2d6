//! Per-slide render state machine
//!
//! ```text
//! Pending -> Attempting -> Succeeded
//!                       -> Waiting -> Attempting
//!                       -> Failed
//! ```
//!
//! The machine makes no I/O calls. The orchestrator performs the render
//! call and the wait that each state asks for.

use std::fmt;
use std::time::Duration;
use chrono::{DateTime, Utc};

use shared::{AttemptClassification, JobAttempt, RenderOutcome};
use crate::core::classify::Classification;
use crate::core::retry::{FailureKind, RetryDecision, RetryPolicy};
use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideState {
    Pending,
    Attempting { attempt: u32 },
    Waiting { next_attempt: u32, delay: Duration },
    Succeeded { url: String },
    Failed { reason: String },
}

impl SlideState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SlideState::Succeeded { .. } | SlideState::Failed { .. })
    }
}

impl fmt::Display for SlideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideState::Pending => write!(f, "pending"),
            SlideState::Attempting { attempt } => write!(f, "attempting (attempt {})", attempt),
            SlideState::Waiting { next_attempt, delay } => {
                write!(f, "waiting {:?} before attempt {}", delay, next_attempt)
            }
            SlideState::Succeeded { .. } => write!(f, "succeeded"),
            SlideState::Failed { .. } => write!(f, "failed"),
        }
    }
}

pub struct SlideMachine<'a> {
    ordinal: u32,
    policy: &'a RetryPolicy,
    state: SlideState,
    attempts: Vec<JobAttempt>,
    current_started_at: Option<DateTime<Utc>>,
}

impl<'a> SlideMachine<'a> {
    pub fn new(ordinal: u32, policy: &'a RetryPolicy) -> Self {
        Self {
            ordinal,
            policy,
            state: SlideState::Pending,
            attempts: Vec::new(),
            current_started_at: None,
        }
    }

    pub fn state(&self) -> &SlideState {
        &self.state
    }

    pub fn attempts(&self) -> &[JobAttempt] {
        &self.attempts
    }

    /// Pending or Waiting -> Attempting. Returns the attempt index.
    pub fn begin_attempt(&mut self) -> OrchestratorResult<u32> {
        let attempt = match &self.state {
            SlideState::Pending => 0,
            SlideState::Waiting { next_attempt, .. } => *next_attempt,
            other => return Err(self.invalid("begin an attempt", other)),
        };

        self.state = SlideState::Attempting { attempt };
        self.current_started_at = Some(Utc::now());
        Ok(attempt)
    }

    /// Attempting -> Succeeded, Waiting or Failed
    pub fn complete_attempt(&mut self, classification: Classification) -> OrchestratorResult<SlideState> {
        let attempt = match &self.state {
            SlideState::Attempting { attempt } => *attempt,
            other => return Err(self.invalid("complete an attempt", other)),
        };

        self.attempts.push(JobAttempt {
            attempt,
            started_at: self.current_started_at.take().unwrap_or_else(Utc::now),
            classification: AttemptClassification::from(&classification),
        });

        self.state = match classification {
            Classification::Success { url } => SlideState::Succeeded { url },
            failure => {
                let kind = failure.failure_kind().unwrap_or(FailureKind::Fatal);
                let reason = failure.reason().unwrap_or_default().to_string();
                match self.policy.decide(attempt, kind) {
                    RetryDecision::Wait(delay) => SlideState::Waiting {
                        next_attempt: attempt + 1,
                        delay,
                    },
                    RetryDecision::GiveUp if matches!(failure, Classification::Retryable { .. }) => {
                        SlideState::Failed {
                            reason: format!("gave up after {} attempt(s): {}", attempt + 1, reason),
                        }
                    }
                    RetryDecision::GiveUp => SlideState::Failed { reason },
                }
            }
        };

        Ok(self.state.clone())
    }

    /// Consume a terminal machine into the slide's outcome and attempt log
    pub fn finish(self) -> OrchestratorResult<(RenderOutcome, Vec<JobAttempt>)> {
        let outcome = match self.state {
            SlideState::Succeeded { url } => RenderOutcome::Success { url },
            SlideState::Failed { reason } => RenderOutcome::FatalFailure { reason },
            other => {
                return Err(OrchestratorError::InvalidTransition {
                    ordinal: self.ordinal,
                    action: "finish",
                    state: other.to_string(),
                })
            }
        };
        Ok((outcome, self.attempts))
    }

    fn invalid(&self, action: &'static str, state: &SlideState) -> OrchestratorError {
        OrchestratorError::InvalidTransition {
            ordinal: self.ordinal,
            action,
            state: state.to_string(),
        }
    }
}
