//! Error types for registration domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing registration domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationDomainError {
    /// The entity name is empty after trimming.
    #[error("entity name must not be empty")]
    EmptyEntityName,

    /// The entity name exceeds the 255-character protocol limit.
    #[error("entity name exceeds 255 character limit: {0}")]
    EntityNameTooLong(String),

    /// The backend returned an empty entity identifier.
    #[error("entity identifier must not be empty")]
    EmptyEntityId,
}

/// Error returned while parsing a registration state from storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown registration state: {0}")]
pub struct ParseRegistrationStateError(pub String);

/// Error returned while parsing an entity kind from storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown entity kind: {0}")]
pub struct ParseEntityKindError(pub String);
