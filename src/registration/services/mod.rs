//! Orchestration services for entity identity registration.

mod config;
mod register_service;
mod state_machine;

pub use config::RegistrationConfig;
pub use register_service::IdentityRegisterService;
pub use state_machine::{CycleSummary, RegistrationStateMachine};
