//! Identity Registrar: durable identity acquisition for a host-monitoring
//! agent.
//!
//! This crate tracks the registration status of every locally discovered
//! entity, batches unregistered entities toward a remote identity service,
//! interprets partial-success responses, and exposes the resulting stable
//! identifiers to the rest of the agent. It guarantees at most one
//! outstanding registration per entity and eventual registration of every
//! live entity.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure registration state with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and the identity
//!   backend
//! - **Adapters**: Concrete implementations of ports (in-memory today)
//!
//! # Modules
//!
//! - [`registration`]: registry, state machine, backoff, and driver service

pub mod registration;
