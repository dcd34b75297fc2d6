//! Core shared types and identifiers for carousel render runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

/// Unique identifier for a carousel run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> SharedResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SharedError::InvalidUuid { input: s.to_string() })
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target output size of a rendered slide, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::square(1080)
    }
}

/// Input to one render job.
///
/// `payload` is opaque to the orchestrator; it is forwarded to the render
/// service untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// 1-based position within the run
    pub ordinal: u32,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl SlideSpec {
    pub fn new(ordinal: u32, payload: serde_json::Value, dimensions: Dimensions) -> Self {
        Self {
            ordinal,
            payload,
            dimensions,
        }
    }
}

/// Terminal result of one slide
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderOutcome {
    Success { url: String },
    FatalFailure { reason: String },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RenderOutcome::Success { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RenderOutcome::Success { url } => Some(url.as_str()),
            RenderOutcome::FatalFailure { .. } => None,
        }
    }
}

/// How a single render attempt was classified
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptClassification {
    Success,
    Retryable { reason: String },
    Fatal { reason: String },
}

/// One call to the render service for a given slide
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobAttempt {
    /// Attempt index, starting at 0
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub classification: AttemptClassification,
}

/// A slide paired with its terminal outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlideEntry {
    pub spec: SlideSpec,
    pub outcome: RenderOutcome,
    /// Diagnostics only, never persisted
    #[serde(skip)]
    pub attempts: Vec<JobAttempt>,
}

/// Run-level status of a carousel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    PartiallyFailed,
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::InProgress => write!(f, "in_progress"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::PartiallyFailed => write!(f, "partially_failed"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Caller-supplied metadata for a carousel submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarouselOptions {
    pub title: String,
    #[serde(default)]
    pub style: serde_json::Value,
}

impl CarouselOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: serde_json::Value::Null,
        }
    }

    pub fn with_style(mut self, style: serde_json::Value) -> Self {
        self.style = style;
        self
    }
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self::new("Untitled carousel")
    }
}

/// The aggregate produced by one carousel submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarouselRun {
    pub run_id: RunId,
    pub title: String,
    pub style: serde_json::Value,
    /// Ordered by strictly increasing slide ordinal
    pub entries: Vec<SlideEntry>,
    pub status: RunStatus,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CarouselRun {
    /// URLs of every slide that rendered, in slide order
    pub fn rendered_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.url().map(str::to_string))
            .collect()
    }

    /// Ordinals of slides that ended in a fatal failure
    pub fn failed_ordinals(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| !entry.outcome.is_success())
            .map(|entry| entry.spec.ordinal)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn to_json_pretty(&self) -> SharedResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })
    }
}

/// A carousel described as a file: title, style and ordered slides
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlideDeck {
    pub title: String,
    #[serde(default)]
    pub style: serde_json::Value,
    pub slides: Vec<SlideSpec>,
}

impl SlideDeck {
    pub fn from_json(input: &str) -> SharedResult<Self> {
        serde_json::from_str(input).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }

    /// Split the deck into the slide list and submission options
    pub fn into_parts(self) -> (Vec<SlideSpec>, CarouselOptions) {
        let options = CarouselOptions {
            title: self.title,
            style: self.style,
        };
        (self.slides, options)
    }
}
