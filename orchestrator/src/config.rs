//! Orchestrator configuration
//!
//! Every timing constant of the render discipline lives here and is injected
//! at construction.

use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use shared::{SharedError, SharedResult};

pub const ENV_MAX_ATTEMPTS: &str = "RENDER_MAX_ATTEMPTS";
pub const ENV_BACKOFF_BASE_SECS: &str = "RENDER_BACKOFF_BASE_SECS";
pub const ENV_COOLDOWN_SECS: &str = "RENDER_COOLDOWN_SECS";
pub const ENV_TIMEOUT_SECS: &str = "RENDER_TIMEOUT_SECS";
pub const ENV_FAILURE_POLICY: &str = "RENDER_FAILURE_POLICY";
pub const ENV_SERIALIZE_RUNS: &str = "RENDER_SERIALIZE_RUNS";
pub const ENV_PLACEHOLDER_MARKERS: &str = "RENDER_PLACEHOLDER_MARKERS";
/// Read by the binary only; the orchestrator never sees endpoint or token
pub const ENV_ENDPOINT: &str = "RENDER_ENDPOINT";
pub const ENV_API_TOKEN: &str = "RENDER_API_TOKEN";

/// Retry budget and backoff base for a single slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

/// Pacing between consecutive slide submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    pub cool_down: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            cool_down: Duration::from_secs(8),
        }
    }
}

/// What happens to the rest of a run once a slide fails for good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failed slide; later slides are never attempted
    AbortOnFirst,
    /// Record the failure and keep going; the run ends partially failed
    SkipAndContinue,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::AbortOnFirst
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" | "abort_on_first" => Ok(FailurePolicy::AbortOnFirst),
            "skip" | "skip_and_continue" => Ok(FailurePolicy::SkipAndContinue),
            other => Err(format!("Unknown failure policy '{}'. Valid options: abort, skip", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub retry: RetryConfig,
    pub sequencer: SequencerConfig,
    /// Upper bound for one render call; expiry counts as a transient failure
    pub render_timeout: Duration,
    pub failure_policy: FailurePolicy,
    /// Hold a renderer-wide lock for the whole run
    pub serialize_runs: bool,
    /// URL fragments that identify the service's placeholder image
    pub placeholder_markers: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            sequencer: SequencerConfig::default(),
            render_timeout: Duration::from_secs(45),
            failure_policy: FailurePolicy::default(),
            serialize_runs: false,
            placeholder_markers: vec!["placeholder".to_string()],
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables (all optional, defaults in parentheses):
    /// - RENDER_MAX_ATTEMPTS (3)
    /// - RENDER_BACKOFF_BASE_SECS (5)
    /// - RENDER_COOLDOWN_SECS (8)
    /// - RENDER_TIMEOUT_SECS (45)
    /// - RENDER_FAILURE_POLICY: abort|skip (abort)
    /// - RENDER_SERIALIZE_RUNS: true|false (false)
    /// - RENDER_PLACEHOLDER_MARKERS: comma-separated URL fragments ("placeholder")
    pub fn from_env() -> SharedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> SharedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            config.retry.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(ENV_BACKOFF_BASE_SECS) {
            config.retry.base_delay = Duration::from_secs(parse_number(ENV_BACKOFF_BASE_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_COOLDOWN_SECS) {
            config.sequencer.cool_down = Duration::from_secs(parse_number(ENV_COOLDOWN_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            config.render_timeout = Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_FAILURE_POLICY) {
            config.failure_policy = value.parse().map_err(|_| invalid(ENV_FAILURE_POLICY, &value))?;
        }
        if let Some(value) = lookup(ENV_SERIALIZE_RUNS) {
            config.serialize_runs = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid(ENV_SERIALIZE_RUNS, &value)),
            };
        }
        if let Some(value) = lookup(ENV_PLACEHOLDER_MARKERS) {
            config.placeholder_markers = value
                .split(',')
                .map(|marker| marker.trim().to_string())
                .filter(|marker| !marker.is_empty())
                .collect();
        }

        if config.retry.max_attempts == 0 {
            return Err(invalid(ENV_MAX_ATTEMPTS, "0"));
        }
        if config.render_timeout.is_zero() {
            return Err(invalid(ENV_TIMEOUT_SECS, "0"));
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> SharedResult<T> {
    value.trim().parse().map_err(|_| invalid(field, value))
}

fn invalid(field: &str, value: &str) -> SharedError {
    SharedError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
    }
}
