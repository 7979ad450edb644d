//! Unit tests for the registration module.
//!
//! Tests are organised by layer: domain transitions and backoff, registry
//! selection and bookkeeping, state machine classification, and the driver
//! service.

mod domain_tests;
mod state_machine_tests;
