//! In-memory adapter implementations.

mod entity_registry;
mod register_client;

pub use entity_registry::InMemoryEntityRegistry;
pub use register_client::InMemoryRegisterClient;
