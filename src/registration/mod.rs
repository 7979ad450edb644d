//! Entity identity registration for the agent.
//!
//! This module establishes and maintains durable identities for the local
//! node and its sub-entities (containers, services, integrations) with the
//! remote identity service, reconciling local discovery with a backend that
//! may reject, defer, rate-limit, or partially accept a batch. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
