//! Identifier types for the registration domain.

use super::RegistrationDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Agent-assigned local key for a discovered entity.
///
/// Local keys are not durable: they identify an entity only for the lifetime
/// of the current process and are reassigned when discovery re-reports the
/// entity after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(Uuid);

impl EntityKey {
    /// Creates a new random local entity key.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity key from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EntityKey {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for EntityKey {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-assigned stable identifier returned on successful registration.
///
/// The identity service owns this value; the agent treats it as an opaque,
/// non-empty token and never derives meaning from its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an entity identifier from a backend-provided token.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError::EmptyEntityId`] when the token is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistrationDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(RegistrationDomainError::EmptyEntityId);
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
