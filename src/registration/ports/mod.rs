//! Port contracts for registration state storage and the identity backend.

mod register_client;
mod registry;

pub use register_client::{
    BatchRegisterResponse, RegisterCallError, RegisterClient, RegisterClientResult,
    RegisterOutcome, RegistrationRequest,
};
pub use registry::{
    EntityRegistry, EntityRegistryError, EntityRegistryResult, PendingEntity, RecordOutcome,
};
