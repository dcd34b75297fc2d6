//! Retry decisions for a single slide
//!
//! Pure: the policy holds no per-slide state and never sleeps. The caller
//! feeds it the index of the attempt that just failed.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Whether a failed attempt may be repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Retryable,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Suspend for this long, then make the next attempt
    Wait(Duration),
    GiveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> OrchestratorResult<Self> {
        if config.max_attempts == 0 {
            return Err(OrchestratorError::ConfigurationError {
                field: "retry.max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }

        Ok(Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what follows a failed `attempt` (0-based)
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Fatal => RetryDecision::GiveUp,
            FailureKind::Retryable => {
                let next = attempt.saturating_add(1);
                if next >= self.max_attempts {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::Wait(self.delay_before(next))
                }
            }
        }
    }

    /// Backoff owed before `attempt`: nothing for the first, then `base * 2^(attempt-1)`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let config = RetryConfig::default();
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay,
        }
    }
}
