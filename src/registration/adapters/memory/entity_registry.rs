//! In-memory entity registry backing the registration state machine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registration::{
    domain::{EntityDescriptor, EntityKey, RegistrationRecord, RegistrationState},
    ports::{
        EntityRegistry, EntityRegistryError, EntityRegistryResult, PendingEntity, RecordOutcome,
    },
};

/// Thread-safe in-memory registration state store.
///
/// Holds the authoritative process-lifetime table of known entities. A single
/// table-wide lock makes selection and outcome application mutually
/// exclusive, so no entity can be drained into two simultaneous batches and
/// no outcome can race a concurrent removal.
#[derive(Debug, Clone)]
pub struct InMemoryEntityRegistry<C>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<RegistryState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct RegistryState {
    records: HashMap<EntityKey, StoredRecord>,
    insert_seq: u64,
}

/// A record plus the insertion sequence used as the selection tie-break.
#[derive(Debug)]
struct StoredRecord {
    seq: u64,
    record: RegistrationRecord,
}

impl<C> InMemoryEntityRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry reading time from the given clock.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            clock,
        }
    }

    fn write_state(&self) -> EntityRegistryResult<std::sync::RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|err| EntityRegistryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn read_state(&self) -> EntityRegistryResult<std::sync::RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|err| EntityRegistryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl<C> EntityRegistry for InMemoryEntityRegistry<C>
where
    C: Clock + Send + Sync,
{
    async fn upsert(
        &self,
        key: EntityKey,
        descriptor: EntityDescriptor,
    ) -> EntityRegistryResult<()> {
        let mut state = self.write_state()?;
        if let Some(stored) = state.records.get_mut(&key) {
            stored.record.update_descriptor(descriptor, &*self.clock);
            return Ok(());
        }

        let seq = state.insert_seq;
        state.insert_seq = state.insert_seq.wrapping_add(1);
        let record = RegistrationRecord::new(key, descriptor, &*self.clock);
        state.records.insert(key, StoredRecord { seq, record });
        Ok(())
    }

    async fn remove(&self, key: EntityKey) -> EntityRegistryResult<()> {
        let mut state = self.write_state()?;
        state.records.remove(&key);
        Ok(())
    }

    async fn select_pending(
        &self,
        max_batch: usize,
        now: DateTime<Utc>,
    ) -> EntityRegistryResult<Vec<PendingEntity>> {
        let mut state = self.write_state()?;

        let mut eligible: Vec<(u8, DateTime<Utc>, u64, EntityKey)> = state
            .records
            .values()
            .filter(|stored| stored.record.eligible_at(now))
            .map(|stored| {
                let priority = match stored.record.state() {
                    RegistrationState::Unregistered => 0,
                    _ => 1,
                };
                let retry_order = stored
                    .record
                    .next_retry_at()
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                (priority, retry_order, stored.seq, stored.record.key())
            })
            .collect();
        eligible.sort_unstable_by_key(|(priority, retry_order, seq, _)| {
            (*priority, *retry_order, *seq)
        });
        eligible.truncate(max_batch);

        let mut selected = Vec::with_capacity(eligible.len());
        for (_, _, _, key) in eligible {
            if let Some(stored) = state.records.get_mut(&key) {
                let attempts = stored.record.attempts();
                let descriptor = stored.record.descriptor().clone();
                stored.record.mark_pending(&*self.clock);
                selected.push(PendingEntity {
                    key,
                    descriptor,
                    attempts,
                });
            }
        }
        Ok(selected)
    }

    async fn apply_outcome(
        &self,
        key: EntityKey,
        outcome: RecordOutcome,
    ) -> EntityRegistryResult<()> {
        let mut state = self.write_state()?;
        let Some(stored) = state.records.get_mut(&key) else {
            // Expected race: the entity was removed while its batch was in
            // flight. Discard the outcome without recreating the record.
            tracing::debug!(%key, "discarding outcome for removed entity");
            return Ok(());
        };

        if stored.record.state() != RegistrationState::Pending {
            tracing::warn!(
                %key,
                state = %stored.record.state(),
                "discarding outcome for entity not awaiting one"
            );
            return Ok(());
        }

        match outcome {
            RecordOutcome::Registered(entity_id) => {
                stored.record.mark_registered(entity_id, &*self.clock);
            }
            RecordOutcome::Failed {
                failure,
                next_retry_at,
            } => {
                stored
                    .record
                    .mark_failed(failure, next_retry_at, &*self.clock);
            }
        }
        Ok(())
    }

    async fn find(&self, key: EntityKey) -> EntityRegistryResult<Option<RegistrationRecord>> {
        let state = self.read_state()?;
        Ok(state.records.get(&key).map(|stored| stored.record.clone()))
    }

    async fn list_all(&self) -> EntityRegistryResult<Vec<RegistrationRecord>> {
        let state = self.read_state()?;
        Ok(state
            .records
            .values()
            .map(|stored| stored.record.clone())
            .collect())
    }
}
