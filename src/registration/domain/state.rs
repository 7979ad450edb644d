//! Registration lifecycle state.

use super::ParseRegistrationStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration lifecycle state of a discovered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// The entity has never been submitted for registration.
    Unregistered,
    /// The entity is part of an in-flight registration batch.
    Pending,
    /// The backend assigned a stable identifier. Terminal until removal.
    Registered,
    /// The last attempt failed; the entity retries once its delay elapses.
    Failed,
}

impl RegistrationState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Pending => "pending",
            Self::Registered => "registered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RegistrationState {
    type Error = ParseRegistrationStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unregistered" => Ok(Self::Unregistered),
            "pending" => Ok(Self::Pending),
            "registered" => Ok(Self::Registered),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseRegistrationStateError(value.to_owned())),
        }
    }
}
