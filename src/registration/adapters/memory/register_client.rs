//! In-memory register client adapter for registration flow tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use crate::registration::{
    domain::EntityId,
    ports::{
        BatchRegisterResponse, RegisterCallError, RegisterClient, RegisterClientResult,
        RegisterOutcome, RegistrationRequest,
    },
};

/// In-memory register client adapter.
///
/// Models the identity backend without network access: responses can be
/// scripted per call, and every received batch is recorded for assertions.
/// When no response is scripted, the client registers the whole batch,
/// deriving each identifier from the entity name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegisterClient {
    state: Arc<RwLock<InMemoryClientState>>,
}

#[derive(Debug, Default)]
struct InMemoryClientState {
    scripted: VecDeque<RegisterClientResult<BatchRegisterResponse>>,
    received: Vec<Vec<RegistrationRequest>>,
}

impl InMemoryRegisterClient {
    /// Creates a client that registers every submitted entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for the next unserved call.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterCallError::Transport`] when lock acquisition fails.
    pub fn enqueue_response(
        &self,
        response: BatchRegisterResponse,
    ) -> RegisterClientResult<()> {
        self.write_state()?.scripted.push_back(Ok(response));
        Ok(())
    }

    /// Scripts a call-level error for the next unserved call.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterCallError::Transport`] when lock acquisition fails.
    pub fn enqueue_error(&self, error: RegisterCallError) -> RegisterClientResult<()> {
        self.write_state()?.scripted.push_back(Err(error));
        Ok(())
    }

    /// Returns every batch received so far, in call order.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterCallError::Transport`] when lock acquisition fails.
    pub fn received_batches(&self) -> RegisterClientResult<Vec<Vec<RegistrationRequest>>> {
        Ok(self.read_state()?.received.clone())
    }

    fn write_state(
        &self,
    ) -> RegisterClientResult<std::sync::RwLockWriteGuard<'_, InMemoryClientState>> {
        self.state
            .write()
            .map_err(|err| RegisterCallError::Transport(err.to_string()))
    }

    fn read_state(
        &self,
    ) -> RegisterClientResult<std::sync::RwLockReadGuard<'_, InMemoryClientState>> {
        self.state
            .read()
            .map_err(|err| RegisterCallError::Transport(err.to_string()))
    }
}

#[async_trait]
impl RegisterClient for InMemoryRegisterClient {
    async fn register(
        &self,
        batch: &[RegistrationRequest],
    ) -> RegisterClientResult<BatchRegisterResponse> {
        let scripted = {
            let mut state = self.write_state()?;
            state.received.push(batch.to_vec());
            state.scripted.pop_front()
        };

        if let Some(result) = scripted {
            return result;
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for request in batch {
            let entity_id = EntityId::new(format!("remote-{}", request.descriptor.name()))
                .map_err(|err| RegisterCallError::Transport(err.to_string()))?;
            outcomes.push(RegisterOutcome::Registered {
                key: request.key,
                entity_id,
            });
        }
        Ok(BatchRegisterResponse::new(outcomes))
    }
}
