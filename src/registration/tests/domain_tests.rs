//! Unit tests for registration domain types and the backoff policy.

use chrono::{Duration as ChronoDuration, Utc};
use mockable::DefaultClock;
use std::time::Duration;

use super::fixtures::container;
use crate::registration::domain::{
    BackoffPolicy, EntityDescriptor, EntityId, EntityKey, EntityKind, RegistrationDomainError,
    RegistrationErrorKind, RegistrationFailure, RegistrationRecord, RegistrationState,
};

fn failure() -> RegistrationFailure {
    RegistrationFailure::new(RegistrationErrorKind::Transport, "connection refused")
}

#[test]
fn descriptor_rejects_empty_name() {
    let result = EntityDescriptor::new(EntityKind::Container, "   ");
    assert_eq!(result, Err(RegistrationDomainError::EmptyEntityName));
}

#[test]
fn descriptor_rejects_overlong_name() {
    let name = "x".repeat(256);
    let result = EntityDescriptor::new(EntityKind::Host, name);
    assert!(matches!(
        result,
        Err(RegistrationDomainError::EntityNameTooLong(_))
    ));
}

#[test]
fn descriptor_display_name_defaults_to_name() {
    let descriptor = container("nginx");
    assert_eq!(descriptor.display_name(), "nginx");

    let named = container("nginx").with_display_name("Edge proxy");
    assert_eq!(named.display_name(), "Edge proxy");

    let blank = container("nginx").with_display_name("   ");
    assert_eq!(blank.display_name(), "nginx");
}

#[test]
fn entity_id_rejects_empty_token() {
    assert_eq!(
        EntityId::new("  "),
        Err(RegistrationDomainError::EmptyEntityId)
    );
}

#[test]
fn new_record_starts_unregistered() {
    let record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);

    assert_eq!(record.state(), RegistrationState::Unregistered);
    assert_eq!(record.attempts(), 0);
    assert!(record.entity_id().is_none());
    assert!(record.last_attempt_at().is_none());
    assert!(record.eligible_at(Utc::now()));
}

#[test]
fn mark_pending_records_attempt_time_and_blocks_selection() {
    let mut record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);

    record.mark_pending(&DefaultClock);

    assert_eq!(record.state(), RegistrationState::Pending);
    assert!(record.last_attempt_at().is_some());
    assert!(!record.eligible_at(Utc::now() + ChronoDuration::days(1)));
}

#[test]
fn mark_registered_clears_failure_state() {
    let mut record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);
    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), Utc::now(), &DefaultClock);
    record.mark_pending(&DefaultClock);

    let entity_id = EntityId::new("remote-nginx").expect("valid id");
    record.mark_registered(entity_id.clone(), &DefaultClock);

    assert_eq!(record.state(), RegistrationState::Registered);
    assert_eq!(record.entity_id(), Some(&entity_id));
    assert!(record.last_failure().is_none());
    assert!(record.next_retry_at().is_none());
    assert!(!record.eligible_at(Utc::now() + ChronoDuration::days(1)));
}

#[test]
fn mark_failed_increments_attempts_strictly() {
    let mut record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);

    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), Utc::now(), &DefaultClock);
    assert_eq!(record.attempts(), 1);

    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), Utc::now(), &DefaultClock);
    assert_eq!(record.attempts(), 2);
    assert_eq!(record.state(), RegistrationState::Failed);
    assert_eq!(
        record.last_failure().map(RegistrationFailure::kind),
        Some(RegistrationErrorKind::Transport)
    );
}

#[test]
fn next_retry_never_moves_backwards() {
    let mut record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);
    let later = Utc::now() + ChronoDuration::minutes(10);
    let earlier = Utc::now() + ChronoDuration::minutes(1);

    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), later, &DefaultClock);
    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), earlier, &DefaultClock);

    assert_eq!(record.next_retry_at(), Some(later));
}

#[test]
fn failed_record_waits_for_retry_time() {
    let mut record = RegistrationRecord::new(EntityKey::new(), container("nginx"), &DefaultClock);
    let retry_at = Utc::now() + ChronoDuration::minutes(5);

    record.mark_pending(&DefaultClock);
    record.mark_failed(failure(), retry_at, &DefaultClock);

    assert!(!record.eligible_at(retry_at - ChronoDuration::seconds(1)));
    assert!(record.eligible_at(retry_at));
    assert!(record.eligible_at(retry_at + ChronoDuration::seconds(1)));
}

#[test]
fn registration_state_parses_storage_representation() {
    for state in [
        RegistrationState::Unregistered,
        RegistrationState::Pending,
        RegistrationState::Registered,
        RegistrationState::Failed,
    ] {
        assert_eq!(RegistrationState::try_from(state.as_str()), Ok(state));
    }
    assert!(RegistrationState::try_from("bogus").is_err());
}

#[test]
fn entity_kind_parses_storage_representation() {
    for kind in [
        EntityKind::Host,
        EntityKind::Container,
        EntityKind::Service,
        EntityKind::Integration,
    ] {
        assert_eq!(EntityKind::try_from(kind.as_str()), Ok(kind));
    }
    assert!(EntityKind::try_from("bogus").is_err());
}

#[test]
fn backoff_grows_monotonically_until_cap() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::from_millis(100))
        .with_multiplier(2)
        .with_cap(Duration::from_secs(2))
        .with_jitter_percent(0);

    let mut previous = Duration::ZERO;
    for attempts in 1..=8 {
        let delay = policy.delay(attempts, None);
        assert!(delay >= previous, "delay shrank at attempt {attempts}");
        assert!(delay <= Duration::from_secs(2));
        previous = delay;
    }
    assert_eq!(policy.delay(8, None), Duration::from_secs(2));
}

#[test]
fn backoff_doubles_per_attempt_without_jitter() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::from_millis(100))
        .with_multiplier(2)
        .with_cap(Duration::from_secs(60))
        .with_jitter_percent(0);

    assert_eq!(policy.delay(1, None), Duration::from_millis(100));
    assert_eq!(policy.delay(2, None), Duration::from_millis(200));
    assert_eq!(policy.delay(3, None), Duration::from_millis(400));
}

#[test]
fn backoff_jitter_stays_within_bounds() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::from_millis(1000))
        .with_multiplier(2)
        .with_cap(Duration::from_secs(60))
        .with_jitter_percent(20);

    for _ in 0..100 {
        let delay = policy.delay(1, None);
        assert!(delay >= Duration::from_millis(800));
        assert!(delay <= Duration::from_millis(1200));
    }
}

#[test]
fn longer_server_hint_wins() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::from_millis(100))
        .with_jitter_percent(0);
    let hint = Duration::from_secs(30);

    assert_eq!(policy.delay(1, Some(hint)), hint);
}

#[test]
fn shorter_server_hint_is_ignored() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::from_secs(10))
        .with_jitter_percent(0);

    assert_eq!(
        policy.delay(1, Some(Duration::from_millis(1))),
        Duration::from_secs(10)
    );
}

#[test]
fn backoff_delay_is_always_positive() {
    let policy = BackoffPolicy::new()
        .with_base(Duration::ZERO)
        .with_jitter_percent(0);

    assert!(policy.delay(1, None) > Duration::ZERO);
    assert!(policy.delay(0, None) > Duration::ZERO);
}
