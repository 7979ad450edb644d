//! Register client port for the remote identity service.

use crate::registration::domain::{EntityDescriptor, EntityId, EntityKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for register client calls.
pub type RegisterClientResult<T> = Result<T, RegisterCallError>;

/// One entity's identifying attributes as submitted in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Local key echoed back in the per-entity outcome.
    pub key: EntityKey,
    /// Attribute snapshot identifying the entity to the backend.
    pub descriptor: EntityDescriptor,
}

/// Per-entity outcome reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RegisterOutcome {
    /// The backend assigned a stable identifier to the entity.
    Registered {
        /// Local key of the entity this outcome applies to.
        key: EntityKey,
        /// Backend-assigned stable identifier.
        entity_id: EntityId,
    },
    /// The backend rejected this specific entity.
    Rejected {
        /// Local key of the entity this outcome applies to.
        key: EntityKey,
        /// Backend-supplied rejection reason.
        reason: String,
    },
}

impl RegisterOutcome {
    /// Returns the local key the outcome applies to.
    #[must_use]
    pub const fn key(&self) -> EntityKey {
        match self {
            Self::Registered { key, .. } | Self::Rejected { key, .. } => *key,
        }
    }
}

/// Ordered per-entity outcomes for one registration call.
///
/// The response may cover only a subset of the submitted batch; entities
/// absent from it are treated as failed so they are never left pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRegisterResponse {
    outcomes: Vec<RegisterOutcome>,
}

impl BatchRegisterResponse {
    /// Creates a response from per-entity outcomes.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = RegisterOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// Returns the per-entity outcomes in the order received.
    #[must_use]
    pub fn outcomes(&self) -> &[RegisterOutcome] {
        &self.outcomes
    }
}

/// Call-level errors raised before any per-entity outcome is known.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegisterCallError {
    /// The call failed at the transport layer (network, timeout, 5xx).
    #[error("register call failed: {0}")]
    Transport(String),

    /// The backend rejected the agent's credentials.
    #[error("register call rejected credentials: {0}")]
    Auth(String),

    /// The backend signalled backpressure and may suggest a retry delay.
    #[error("register call rate limited")]
    RateLimited {
        /// Server-suggested minimum delay before the next attempt.
        retry_after: Option<Duration>,
    },
}

/// Identity service registration contract.
///
/// Implementations send one batch per call and honour the caller-supplied
/// deadline; the state machine enforces its own timeout around the call.
#[async_trait]
pub trait RegisterClient: Send + Sync {
    /// Submits a batch of entities for registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterCallError`] when the call fails before any
    /// per-entity outcome is known.
    async fn register(
        &self,
        batch: &[RegistrationRequest],
    ) -> RegisterClientResult<BatchRegisterResponse>;
}
