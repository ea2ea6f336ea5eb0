//! Debate failure taxonomy and the terminal-error classifier.
//!
//! Validation failures (`InvalidTopic`, `InvalidActor`) surface before any
//! external call; everything else is discovered mid-run and classified into
//! a coarse [`ErrorKind`] for the caller. No kind triggers an internal
//! retry — the upstream provider disables its own retries and this engine
//! must not amplify quota damage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transcript::Speaker;

/// A failure inside one debate run.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("debate topic must be a non-empty string")]
    InvalidTopic,

    #[error("{role} actor exposes no response capability")]
    InvalidActor { role: Speaker },

    #[error("{role} actor returned an empty response")]
    EmptyResponse { role: Speaker },

    #[error("debate cancelled by stop request")]
    Cancelled,

    /// Upstream actor failure, propagated untouched from the call boundary.
    #[error("actor call failed: {0}")]
    Upstream(anyhow::Error),
}

/// Coarse classification of a terminal failure, exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The external per-minute call quota was exhausted.
    RateLimited,
    /// User-initiated stop.
    Cancelled,
    /// Any other upstream or internal failure.
    Generic,
}

impl ErrorKind {
    /// User-safe stop description for the trailing System turn. Never
    /// includes raw upstream error text.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::RateLimited => {
                "Debate stopped: the model call quota is exhausted. Try again later."
            }
            Self::Cancelled => "Debate stopped by user; no further model calls were made.",
            Self::Generic => "Debate stopped: a model call failed.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Classify a debate failure into its terminal [`ErrorKind`].
pub fn classify(error: &DebateError) -> ErrorKind {
    match error {
        DebateError::Cancelled => ErrorKind::Cancelled,
        DebateError::Upstream(source) => {
            let message = format!("{source:#}");
            if is_rate_limited(&message) {
                ErrorKind::RateLimited
            } else {
                ErrorKind::Generic
            }
        }
        DebateError::InvalidTopic
        | DebateError::InvalidActor { .. }
        | DebateError::EmptyResponse { .. } => ErrorKind::Generic,
    }
}

/// Detect quota exhaustion from upstream error text. Providers surface it
/// as an HTTP 429 or a prose message; both shapes are matched here.
fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    message.contains("429")
        || lower.contains("rate limit")
        || lower.contains("rate-limit")
        || lower.contains("too many requests")
        || lower.contains("quota")
}
