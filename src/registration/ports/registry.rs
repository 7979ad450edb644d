//! Entity registry port for registration state storage.

use crate::registration::domain::{
    EntityDescriptor, EntityId, EntityKey, RegistrationFailure, RegistrationRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity registry operations.
pub type EntityRegistryResult<T> = Result<T, EntityRegistryError>;

/// An entity drained from the registry into a batch.
///
/// Selection marks the record pending as a side effect, so the attempt count
/// carried here is the count *before* the in-flight attempt completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntity {
    /// Local key of the selected entity.
    pub key: EntityKey,
    /// Attribute snapshot at selection time.
    pub descriptor: EntityDescriptor,
    /// Completed attempts before this submission.
    pub attempts: u32,
}

/// State transition applied to one record after a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The backend assigned a stable identifier.
    Registered(EntityId),
    /// The attempt failed; retry no earlier than `next_retry_at`.
    Failed {
        /// Failure category and detail to record.
        failure: RegistrationFailure,
        /// Earliest eligible retry time.
        next_retry_at: DateTime<Utc>,
    },
}

/// Registration state storage contract.
///
/// Implementations must keep exactly one record per local key, and must make
/// [`EntityRegistry::select_pending`] and [`EntityRegistry::apply_outcome`]
/// mutually exclusive so an entity can never join two simultaneous batches.
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    /// Adds a newly discovered entity, or refreshes the attribute snapshot
    /// of an existing one without touching its registration state.
    ///
    /// Idempotent; safe to call concurrently with the registration cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn upsert(&self, key: EntityKey, descriptor: EntityDescriptor)
    -> EntityRegistryResult<()>;

    /// Deletes the record for an entity discovery reports as gone.
    ///
    /// A no-op when the key is unknown. An outcome arriving later for the
    /// removed entity is discarded without recreating the record.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn remove(&self, key: EntityKey) -> EntityRegistryResult<()>;

    /// Drains up to `max_batch` eligible entities and marks them pending.
    ///
    /// Eligible entities are unregistered ones and failed ones whose retry
    /// delay has elapsed at `now`, ordered unregistered-first, then by
    /// ascending retry time, then by insertion order. Marking pending happens
    /// atomically with selection.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn select_pending(
        &self,
        max_batch: usize,
        now: DateTime<Utc>,
    ) -> EntityRegistryResult<Vec<PendingEntity>>;

    /// Applies a per-entity outcome to a pending record.
    ///
    /// Unknown keys and records no longer pending are logged and ignored:
    /// an entity removed while its batch was in flight is an expected race,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn apply_outcome(
        &self,
        key: EntityKey,
        outcome: RecordOutcome,
    ) -> EntityRegistryResult<()>;

    /// Returns the record for a local key, when present.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn find(&self, key: EntityKey) -> EntityRegistryResult<Option<RegistrationRecord>>;

    /// Returns all records regardless of state.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRegistryError::Persistence`] when storage access
    /// fails.
    async fn list_all(&self) -> EntityRegistryResult<Vec<RegistrationRecord>>;
}

/// Errors returned by entity registry implementations.
#[derive(Debug, Clone, Error)]
pub enum EntityRegistryError {
    /// Storage-layer failure.
    #[error("registry storage error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EntityRegistryError {
    /// Wraps a storage error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
