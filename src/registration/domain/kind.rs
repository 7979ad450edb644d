//! Entity type tags reported by local discovery.

use super::ParseEntityKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a locally discovered entity requiring a remote identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The host the agent runs on.
    Host,
    /// A container discovered on the host.
    Container,
    /// A service discovered on the host.
    Service,
    /// An integration managed by the agent.
    Integration,
}

impl EntityKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Container => "container",
            Self::Service => "service",
            Self::Integration => "integration",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityKind {
    type Error = ParseEntityKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "host" => Ok(Self::Host),
            "container" => Ok(Self::Container),
            "service" => Ok(Self::Service),
            "integration" => Ok(Self::Integration),
            _ => Err(ParseEntityKindError(value.to_owned())),
        }
    }
}
