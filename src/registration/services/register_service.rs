//! Identity register service: periodic driver and identifier lookup.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::registration::{
    domain::{EntityId, EntityKey, RegistrationRecord},
    ports::{EntityRegistry, EntityRegistryResult, RegisterClient},
    services::RegistrationStateMachine,
};

/// Owns the registration state machine and exposes stable identifiers to the
/// rest of the agent.
///
/// The service drives drain-and-submit cycles on a fixed interval and
/// resolves local keys to backend-assigned identifiers once registration
/// succeeds.
#[derive(Clone)]
pub struct IdentityRegisterService<R, T, C>
where
    R: EntityRegistry,
    T: RegisterClient,
    C: Clock + Send + Sync,
{
    state_machine: RegistrationStateMachine<R, T, C>,
}

impl<R, T, C> IdentityRegisterService<R, T, C>
where
    R: EntityRegistry,
    T: RegisterClient,
    C: Clock + Send + Sync,
{
    /// Creates a service around an assembled state machine.
    #[must_use]
    pub const fn new(state_machine: RegistrationStateMachine<R, T, C>) -> Self {
        Self { state_machine }
    }

    /// Returns the owned state machine.
    #[must_use]
    pub const fn state_machine(&self) -> &RegistrationStateMachine<R, T, C> {
        &self.state_machine
    }

    /// Returns a handle to the registry shared with the discovery path.
    #[must_use]
    pub fn registry(&self) -> Arc<R> {
        Arc::clone(self.state_machine.registry())
    }

    /// Resolves a local key to its backend-assigned identifier.
    ///
    /// Returns `Ok(None)` until the entity registers successfully.
    ///
    /// # Errors
    ///
    /// Returns [`crate::registration::ports::EntityRegistryError`] when
    /// registry storage access fails.
    pub async fn lookup(&self, key: EntityKey) -> EntityRegistryResult<Option<EntityId>> {
        Ok(self
            .state_machine
            .registry()
            .find(key)
            .await?
            .and_then(|record| record.entity_id().cloned()))
    }

    /// Returns the full registration record for operator visibility.
    ///
    /// Persistent failure is observable here through the attempt count and
    /// last failure, never through an error from the cycle itself.
    ///
    /// # Errors
    ///
    /// Returns [`crate::registration::ports::EntityRegistryError`] when
    /// registry storage access fails.
    pub async fn inspect(&self, key: EntityKey) -> EntityRegistryResult<Option<RegistrationRecord>> {
        self.state_machine.registry().find(key).await
    }

    /// Drives registration cycles until the shutdown signal fires.
    ///
    /// A shutdown arriving while a register call is in flight cancels the
    /// call and reverts the batch to failed state so those entities retry on
    /// the next start.
    ///
    /// # Errors
    ///
    /// Returns [`crate::registration::ports::EntityRegistryError`] when
    /// registry storage access fails while reverting an interrupted batch.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> EntityRegistryResult<()> {
        let mut ticker = tokio::time::interval(self.state_machine.config().cycle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.state_machine.run_cycle() => match result {
                            Ok(summary) if summary.selected > 0 => {
                                tracing::debug!(
                                    selected = summary.selected,
                                    registered = summary.registered,
                                    failed = summary.failed,
                                    "registration cycle finished"
                                );
                            }
                            Ok(_) => {}
                            Err(error) => {
                                tracing::warn!(%error, "registration cycle failed");
                            }
                        },
                        _ = shutdown.changed() => {
                            self.state_machine
                                .abort_in_flight("registration cancelled by shutdown")
                                .await?;
                            return Ok(());
                        }
                    }
                }
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}
