//! Registration state machine orchestrating drain-and-submit cycles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::registration::{
    domain::{EntityKey, RegistrationErrorKind, RegistrationFailure, RegistrationState},
    ports::{
        BatchRegisterResponse, EntityRegistry, EntityRegistryResult, PendingEntity,
        RecordOutcome, RegisterCallError, RegisterClient, RegisterOutcome, RegistrationRequest,
    },
    services::RegistrationConfig,
};

/// Counters describing one drain-and-submit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Entities drained into the batch.
    pub selected: usize,
    /// Entities that received a stable identifier.
    pub registered: usize,
    /// Entities marked failed and scheduled for retry.
    pub failed: usize,
}

/// Orchestrates registration of discovered entities with the identity
/// backend.
///
/// Each cycle drains eligible entities from the registry, submits them in one
/// batch under a call deadline, and applies the classified per-entity
/// outcomes back to the registry. Registration failures never escape a cycle:
/// they degrade to per-entity failed state so the driver loop cannot stall.
#[derive(Clone)]
pub struct RegistrationStateMachine<R, T, C>
where
    R: EntityRegistry,
    T: RegisterClient,
    C: Clock + Send + Sync,
{
    registry: Arc<R>,
    client: Arc<T>,
    config: RegistrationConfig,
    clock: Arc<C>,
}

impl<R, T, C> RegistrationStateMachine<R, T, C>
where
    R: EntityRegistry,
    T: RegisterClient,
    C: Clock + Send + Sync,
{
    /// Creates a state machine over the given registry and client.
    #[must_use]
    pub const fn new(
        registry: Arc<R>,
        client: Arc<T>,
        config: RegistrationConfig,
        clock: Arc<C>,
    ) -> Self {
        Self {
            registry,
            client,
            config,
            clock,
        }
    }

    /// Returns the registry this state machine drains.
    #[must_use]
    pub const fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Returns the cycle configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Runs one drain-and-submit cycle.
    ///
    /// An empty selection is a no-op. A call-level failure (transport, auth,
    /// rate limit, or deadline expiry) marks every entity in the batch failed
    /// with a single attempt increment each.
    ///
    /// # Errors
    ///
    /// Returns [`crate::registration::ports::EntityRegistryError`] only when
    /// registry storage access fails; registration failures are absorbed into
    /// record state.
    pub async fn run_cycle(&self) -> EntityRegistryResult<CycleSummary> {
        let now = self.clock.utc();
        let selected = self
            .registry
            .select_pending(self.config.max_batch_size(), now)
            .await?;
        if selected.is_empty() {
            return Ok(CycleSummary::default());
        }

        let batch: Vec<RegistrationRequest> = selected
            .iter()
            .map(|pending| RegistrationRequest {
                key: pending.key,
                descriptor: pending.descriptor.clone(),
            })
            .collect();

        let call = self.client.register(&batch);
        match tokio::time::timeout(self.config.call_timeout(), call).await {
            Ok(Ok(response)) => self.apply_response(&selected, &response).await,
            Ok(Err(error)) => self.fail_batch(&selected, &error).await,
            Err(_elapsed) => {
                let error = RegisterCallError::Transport("call deadline exceeded".to_owned());
                self.fail_batch(&selected, &error).await
            }
        }
    }

    /// Reverts every in-flight entity to failed state.
    ///
    /// Used when the driver shuts down while a batch is outstanding, so that
    /// the entities are retried on the next cycle instead of being stranded
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::registration::ports::EntityRegistryError`] when
    /// registry storage access fails.
    pub async fn abort_in_flight(&self, detail: &str) -> EntityRegistryResult<usize> {
        let records = self.registry.list_all().await?;
        let mut aborted = 0usize;
        for record in records
            .into_iter()
            .filter(|record| record.state() == RegistrationState::Pending)
        {
            let failure = RegistrationFailure::new(RegistrationErrorKind::Transport, detail);
            self.fail_entity(record.key(), record.attempts(), failure, None)
                .await?;
            aborted = aborted.saturating_add(1);
        }
        if aborted > 0 {
            tracing::info!(aborted, "reverted in-flight registrations to failed");
        }
        Ok(aborted)
    }

    /// Applies per-entity outcomes in the order received, then fails any
    /// batch member the response never mentioned.
    async fn apply_response(
        &self,
        selected: &[PendingEntity],
        response: &BatchRegisterResponse,
    ) -> EntityRegistryResult<CycleSummary> {
        let mut summary = CycleSummary {
            selected: selected.len(),
            ..CycleSummary::default()
        };
        let attempts_by_key: HashMap<EntityKey, u32> = selected
            .iter()
            .map(|pending| (pending.key, pending.attempts))
            .collect();
        let mut covered: HashSet<EntityKey> = HashSet::with_capacity(selected.len());

        for outcome in response.outcomes() {
            let key = outcome.key();
            let Some(&attempts) = attempts_by_key.get(&key) else {
                tracing::warn!(%key, "response names an entity outside the batch");
                continue;
            };
            covered.insert(key);
            match outcome {
                RegisterOutcome::Registered { entity_id, .. } => {
                    self.registry
                        .apply_outcome(key, RecordOutcome::Registered(entity_id.clone()))
                        .await?;
                    summary.registered = summary.registered.saturating_add(1);
                }
                RegisterOutcome::Rejected { reason, .. } => {
                    let failure =
                        RegistrationFailure::new(RegistrationErrorKind::Rejected, reason.clone());
                    self.fail_entity(key, attempts, failure, None).await?;
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }

        // Never leave a submitted entity pending: absence from the response
        // counts as a failure with its own retry schedule.
        for pending in selected.iter().filter(|p| !covered.contains(&p.key)) {
            let failure = RegistrationFailure::new(
                RegistrationErrorKind::NoOutcome,
                "no outcome returned for entity",
            );
            self.fail_entity(pending.key, pending.attempts, failure, None)
                .await?;
            summary.failed = summary.failed.saturating_add(1);
        }
        Ok(summary)
    }

    /// Marks the whole batch failed after a call-level error.
    async fn fail_batch(
        &self,
        selected: &[PendingEntity],
        error: &RegisterCallError,
    ) -> EntityRegistryResult<CycleSummary> {
        tracing::warn!(batch = selected.len(), %error, "register call failed");
        let (kind, hint) = match error {
            RegisterCallError::Transport(_) => (RegistrationErrorKind::Transport, None),
            RegisterCallError::Auth(_) => (RegistrationErrorKind::Auth, None),
            RegisterCallError::RateLimited { retry_after } => {
                (RegistrationErrorKind::RateLimited, *retry_after)
            }
        };
        for pending in selected {
            let failure = RegistrationFailure::new(kind, error.to_string());
            self.fail_entity(pending.key, pending.attempts, failure, hint)
                .await?;
        }
        Ok(CycleSummary {
            selected: selected.len(),
            registered: 0,
            failed: selected.len(),
        })
    }

    /// Fails one entity, scheduling its retry through the backoff policy.
    ///
    /// `attempts` is the completed count before this attempt; the failure
    /// being recorded is attempt `attempts + 1`.
    async fn fail_entity(
        &self,
        key: EntityKey,
        attempts: u32,
        failure: RegistrationFailure,
        server_hint: Option<Duration>,
    ) -> EntityRegistryResult<()> {
        let delay = self
            .config
            .backoff()
            .delay(attempts.saturating_add(1), server_hint);
        let next_retry_at = delay_from(self.clock.utc(), delay);
        self.registry
            .apply_outcome(
                key,
                RecordOutcome::Failed {
                    failure,
                    next_retry_at,
                },
            )
            .await
    }
}

/// Adds a standard-library delay to a timestamp, saturating on overflow.
fn delay_from(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
