//! Identifying attribute snapshot for a discovered entity.

use super::{EntityKind, RegistrationDomainError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum entity name length accepted by the identity protocol.
const MAX_ENTITY_NAME_LEN: usize = 255;

/// Identifying attributes submitted to the identity service for one entity.
///
/// The descriptor is a snapshot: discovery may replace it between attempts,
/// and the registry always submits the latest snapshot on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    kind: EntityKind,
    name: String,
    display_name: String,
    metadata: BTreeMap<String, Value>,
}

impl EntityDescriptor {
    /// Creates a descriptor with the given kind and name.
    ///
    /// The display name defaults to the name until overridden with
    /// [`EntityDescriptor::with_display_name`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError::EmptyEntityName`] when the name is
    /// empty after trimming, or
    /// [`RegistrationDomainError::EntityNameTooLong`] when it exceeds the
    /// protocol limit.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Result<Self, RegistrationDomainError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(RegistrationDomainError::EmptyEntityName);
        }
        if normalized.chars().count() > MAX_ENTITY_NAME_LEN {
            return Err(RegistrationDomainError::EntityNameTooLong(normalized));
        }
        Ok(Self {
            kind,
            display_name: normalized.clone(),
            name: normalized,
            metadata: BTreeMap::new(),
        })
    }

    /// Sets a human-readable display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let normalized = display_name.into().trim().to_owned();
        if !normalized.is_empty() {
            self.display_name = normalized;
        }
        self
    }

    /// Replaces the metadata key/value pairs.
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.metadata = metadata.into_iter().collect();
        self
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the metadata key/value pairs.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }
}
