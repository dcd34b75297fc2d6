//! Failure classification for render results
//!
//! The one place that decides whether a render answer is usable, worth
//! retrying, or hopeless.

use shared::AttemptClassification;

use crate::core::retry::FailureKind;
use crate::error::ClientError;
use crate::types::RawResult;

/// Error-message fragments the render service uses for transient conditions
const TRANSIENT_HINTS: &[&str] = &[
    "overload",
    "busy",
    "placeholder",
    "timeout",
    "timed out",
    "rate limit",
    "too many requests",
    "temporarily",
    "try again",
];

/// Status codes that signal a transient condition when they stand alone in a
/// message, not inside a longer number or identifier
const TRANSIENT_STATUS_CODES: &[&str] = &["503", "429"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success { url: String },
    Retryable { reason: String },
    Fatal { reason: String },
}

impl Classification {
    /// `None` for success
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Classification::Success { .. } => None,
            Classification::Retryable { .. } => Some(FailureKind::Retryable),
            Classification::Fatal { .. } => Some(FailureKind::Fatal),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Classification::Success { .. } => None,
            Classification::Retryable { reason } | Classification::Fatal { reason } => Some(reason.as_str()),
        }
    }
}

impl From<&Classification> for AttemptClassification {
    fn from(classification: &Classification) -> Self {
        match classification {
            Classification::Success { .. } => AttemptClassification::Success,
            Classification::Retryable { reason } => AttemptClassification::Retryable { reason: reason.clone() },
            Classification::Fatal { reason } => AttemptClassification::Fatal { reason: reason.clone() },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    placeholder_markers: Vec<String>,
}

impl Classifier {
    pub fn new(placeholder_markers: Vec<String>) -> Self {
        Self {
            placeholder_markers: placeholder_markers
                .into_iter()
                .map(|marker| marker.to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, result: &Result<RawResult, ClientError>) -> Classification {
        match result {
            Ok(RawResult::Rendered { url }) => {
                if url.trim().is_empty() {
                    Classification::Retryable {
                        reason: "render service returned an empty url".to_string(),
                    }
                } else if self.is_placeholder(url) {
                    Classification::Retryable {
                        reason: format!("placeholder image returned: {}", url),
                    }
                } else {
                    Classification::Success { url: url.clone() }
                }
            }
            Ok(RawResult::Rejected { retryable, error }) => {
                if *retryable || looks_transient(error) {
                    Classification::Retryable { reason: error.clone() }
                } else {
                    Classification::Fatal { reason: error.clone() }
                }
            }
            Err(err) if err.is_retryable() => Classification::Retryable { reason: err.to_string() },
            Err(err) => Classification::Fatal { reason: err.to_string() },
        }
    }

    fn is_placeholder(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.placeholder_markers.iter().any(|marker| url.contains(marker.as_str()))
    }
}

fn looks_transient(error: &str) -> bool {
    let error = error.to_lowercase();
    TRANSIENT_HINTS.iter().any(|hint| error.contains(hint))
        || TRANSIENT_STATUS_CODES.iter().any(|code| contains_token(&error, code))
}

fn contains_token(haystack: &str, token: &str) -> bool {
    haystack.match_indices(token).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + token.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
