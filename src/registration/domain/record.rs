//! Registration record aggregate root.

use super::{
    EntityDescriptor, EntityId, EntityKey, RegistrationFailure, RegistrationState,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Per-entity registration bookkeeping owned exclusively by the registry.
///
/// A record tracks the lifecycle state, attempt history, and retry schedule
/// for exactly one discovered entity. All state changes happen through the
/// transition methods; the registry never exposes a record for external
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    key: EntityKey,
    descriptor: EntityDescriptor,
    state: RegistrationState,
    entity_id: Option<EntityId>,
    attempts: u32,
    last_attempt_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
    last_failure: Option<RegistrationFailure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegistrationRecord {
    /// Creates a record for a newly discovered entity in the
    /// [`RegistrationState::Unregistered`] state.
    #[must_use]
    pub fn new(key: EntityKey, descriptor: EntityDescriptor, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            key,
            descriptor,
            state: RegistrationState::Unregistered,
            entity_id: None,
            attempts: 0,
            last_attempt_at: None,
            next_retry_at: None,
            last_failure: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the local entity key.
    #[must_use]
    pub const fn key(&self) -> EntityKey {
        self.key
    }

    /// Returns the current attribute snapshot.
    #[must_use]
    pub const fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RegistrationState {
        self.state
    }

    /// Returns the backend-assigned identifier, when registered.
    #[must_use]
    pub const fn entity_id(&self) -> Option<&EntityId> {
        self.entity_id.as_ref()
    }

    /// Returns the number of completed registration attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the timestamp of the most recent submission, if any.
    #[must_use]
    pub const fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }

    /// Returns the earliest time the entity is eligible for retry, if any.
    #[must_use]
    pub const fn next_retry_at(&self) -> Option<DateTime<Utc>> {
        self.next_retry_at
    }

    /// Returns the most recent failure, if any.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&RegistrationFailure> {
        self.last_failure.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reports whether the entity may be drained into a batch at `now`.
    ///
    /// Unregistered entities are always eligible; failed entities become
    /// eligible once their retry delay elapses. Pending and registered
    /// entities are never selected, which guarantees at most one in-flight
    /// submission per entity.
    #[must_use]
    pub fn eligible_at(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            RegistrationState::Unregistered => true,
            RegistrationState::Failed => self
                .next_retry_at
                .is_none_or(|next_retry| next_retry <= now),
            RegistrationState::Pending | RegistrationState::Registered => false,
        }
    }

    /// Marks the entity as part of an in-flight batch.
    pub fn mark_pending(&mut self, clock: &impl Clock) {
        self.state = RegistrationState::Pending;
        self.last_attempt_at = Some(clock.utc());
        self.touch(clock);
    }

    /// Records a successful registration with the assigned identifier.
    ///
    /// A later success replaces the identifier wholesale; the backend
    /// assigning a new identifier is a distinct registration event.
    pub fn mark_registered(&mut self, entity_id: EntityId, clock: &impl Clock) {
        self.state = RegistrationState::Registered;
        self.entity_id = Some(entity_id);
        self.next_retry_at = None;
        self.last_failure = None;
        self.touch(clock);
    }

    /// Records a failed attempt and schedules the next retry.
    ///
    /// The attempt count strictly increases, and `next_retry_at` never moves
    /// backwards relative to a previously scheduled retry.
    pub fn mark_failed(
        &mut self,
        failure: RegistrationFailure,
        next_retry_at: DateTime<Utc>,
        clock: &impl Clock,
    ) {
        self.state = RegistrationState::Failed;
        self.attempts = self.attempts.saturating_add(1);
        self.last_failure = Some(failure);
        self.next_retry_at = Some(match self.next_retry_at {
            Some(previous) if previous > next_retry_at => previous,
            _ => next_retry_at,
        });
        self.touch(clock);
    }

    /// Replaces the attribute snapshot submitted on the next attempt.
    ///
    /// Registration state is untouched: discovery may mutate an entity's
    /// attributes at any point in its lifecycle.
    pub fn update_descriptor(&mut self, descriptor: EntityDescriptor, clock: &impl Clock) {
        self.descriptor = descriptor;
        self.touch(clock);
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
