//! Domain model for entity identity registration.
//!
//! The registration domain models local entity keys, backend-assigned
//! identifiers, per-entity registration records with retry scheduling, and
//! the backoff policy applied between attempts. All infrastructure concerns
//! are kept outside the domain boundary.

mod backoff;
mod descriptor;
mod error;
mod failure;
mod ids;
mod kind;
mod record;
mod state;

pub use backoff::BackoffPolicy;
pub use descriptor::EntityDescriptor;
pub use error::{ParseEntityKindError, ParseRegistrationStateError, RegistrationDomainError};
pub use failure::{RegistrationErrorKind, RegistrationFailure};
pub use ids::{EntityId, EntityKey};
pub use kind::EntityKind;
pub use record::RegistrationRecord;
pub use state::RegistrationState;
