//! Failure taxonomy recorded against registration attempts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed registration attempt.
///
/// Every kind is retryable under standard backoff: even `Auth` failures are
/// retried because credentials may be refreshed externally while the agent
/// keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationErrorKind {
    /// The call failed before any per-entity outcome was known.
    Transport,
    /// The backend rejected the agent's credentials.
    Auth,
    /// The backend asked the agent to retry later.
    RateLimited,
    /// The backend rejected this specific entity.
    Rejected,
    /// The batch response did not mention this entity.
    NoOutcome,
}

impl RegistrationErrorKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Rejected => "rejected",
            Self::NoOutcome => "no_outcome",
        }
    }
}

impl fmt::Display for RegistrationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded failure detail for the most recent attempt of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFailure {
    kind: RegistrationErrorKind,
    detail: String,
}

impl RegistrationFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(kind: RegistrationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> RegistrationErrorKind {
        self.kind
    }

    /// Returns the human-readable failure detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for RegistrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}
