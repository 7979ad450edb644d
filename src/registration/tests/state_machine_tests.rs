//! Unit tests for the registration state machine's batch classification.

use chrono::Utc;
use mockable::DefaultClock;
use std::sync::Arc;
use std::time::Duration;

use super::fixtures::{container, registry, state_machine, test_config, StalledRegisterClient};
use crate::registration::{
    domain::{EntityId, EntityKey, RegistrationErrorKind, RegistrationState},
    ports::{
        BatchRegisterResponse, EntityRegistry, RecordOutcome, RegisterCallError, RegisterOutcome,
    },
    services::RegistrationStateMachine,
};

async fn upsert_entities(
    reg: &Arc<super::fixtures::TestRegistry>,
    names: &[&str],
) -> Vec<EntityKey> {
    let mut keys = Vec::new();
    for name in names {
        let key = EntityKey::new();
        reg.upsert(key, container(name)).await.expect("upsert");
        keys.push(key);
    }
    keys
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_registry_cycle_is_a_noop() {
    let (_reg, client, machine) = state_machine();

    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.selected, 0);
    assert!(client.received_batches().expect("batches").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn full_success_registers_every_entity() {
    let (reg, _client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web", "db", "cache"]).await;

    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.selected, 3);
    assert_eq!(summary.registered, 3);
    assert_eq!(summary.failed, 0);
    for (key, name) in keys.iter().zip(["web", "db", "cache"]) {
        let record = reg.find(*key).await.expect("find").expect("record exists");
        assert_eq!(record.state(), RegistrationState::Registered);
        assert_eq!(
            record.entity_id().map(EntityId::as_str),
            Some(format!("remote-{name}")).as_deref()
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_response_fails_unmentioned_entities() {
    let (reg, client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["one", "two", "three"]).await;

    client
        .enqueue_response(BatchRegisterResponse::new([
            RegisterOutcome::Registered {
                key: keys[0],
                entity_id: EntityId::new("remote-one").expect("valid id"),
            },
            RegisterOutcome::Rejected {
                key: keys[2],
                reason: "name conflict".to_owned(),
            },
        ]))
        .expect("script response");

    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.registered, 1);
    assert_eq!(summary.failed, 2);

    let first = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(first.state(), RegistrationState::Registered);

    let second = reg.find(keys[1]).await.expect("find").expect("record");
    assert_eq!(second.state(), RegistrationState::Failed);
    assert_eq!(
        second.last_failure().map(|f| f.kind()),
        Some(RegistrationErrorKind::NoOutcome)
    );

    let third = reg.find(keys[2]).await.expect("find").expect("record");
    assert_eq!(third.state(), RegistrationState::Failed);
    assert_eq!(
        third.last_failure().map(|f| f.kind()),
        Some(RegistrationErrorKind::Rejected)
    );
    assert_eq!(
        third.last_failure().map(|f| f.detail().to_owned()),
        Some("name conflict".to_owned())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_fails_whole_batch_once() {
    let (reg, client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["a", "b", "c", "d", "e"]).await;
    client
        .enqueue_error(RegisterCallError::Transport("connection reset".to_owned()))
        .expect("script error");

    let start = Utc::now();
    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.selected, 5);
    assert_eq!(summary.failed, 5);
    for key in keys {
        let record = reg.find(key).await.expect("find").expect("record");
        assert_eq!(record.state(), RegistrationState::Failed);
        assert_eq!(record.attempts(), 1);
        assert_eq!(
            record.last_failure().map(|f| f.kind()),
            Some(RegistrationErrorKind::Transport)
        );
        let next_retry = record.next_retry_at().expect("retry scheduled");
        assert!(next_retry > start, "retry not after the call start");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_failure_is_recorded_and_retried() {
    let (reg, client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web"]).await;
    client
        .enqueue_error(RegisterCallError::Auth("license key rejected".to_owned()))
        .expect("script error");

    machine.run_cycle().await.expect("cycle");

    let record = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(record.state(), RegistrationState::Failed);
    assert_eq!(
        record.last_failure().map(|f| f.kind()),
        Some(RegistrationErrorKind::Auth)
    );
    assert!(record.next_retry_at().is_some(), "auth failures still retry");
}

#[tokio::test(flavor = "multi_thread")]
async fn rate_limit_hint_extends_retry_delay() {
    let (reg, client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web"]).await;
    let hint = Duration::from_secs(120);
    client
        .enqueue_error(RegisterCallError::RateLimited {
            retry_after: Some(hint),
        })
        .expect("script error");

    let start = Utc::now();
    machine.run_cycle().await.expect("cycle");

    let record = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(
        record.last_failure().map(|f| f.kind()),
        Some(RegistrationErrorKind::RateLimited)
    );
    let next_retry = record.next_retry_at().expect("retry scheduled");
    let hint_delta = chrono::Duration::from_std(hint).expect("in range");
    assert!(
        next_retry >= start + hint_delta,
        "server-suggested delay was not honoured"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn call_deadline_expiry_degrades_to_transport_failure() {
    let reg = registry();
    let keys = upsert_entities(&reg, &["web"]).await;
    let machine = RegistrationStateMachine::new(
        Arc::clone(&reg),
        Arc::new(StalledRegisterClient),
        test_config().with_call_timeout(Duration::from_millis(20)),
        Arc::new(DefaultClock),
    );

    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.failed, 1);
    let record = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(record.state(), RegistrationState::Failed);
    assert_eq!(
        record.last_failure().map(|f| f.kind()),
        Some(RegistrationErrorKind::Transport)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_entities_wait_out_their_backoff() {
    let (reg, client, machine) = state_machine();
    upsert_entities(&reg, &["web"]).await;
    client
        .enqueue_error(RegisterCallError::Transport("connection reset".to_owned()))
        .expect("script error");

    machine.run_cycle().await.expect("cycle");
    let summary = machine.run_cycle().await.expect("retry cycle");

    // The 50ms base delay has not elapsed between back-to-back cycles.
    assert_eq!(summary.selected, 0);
    assert_eq!(client.received_batches().expect("batches").len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn entity_removed_mid_flight_keeps_no_record() {
    let (reg, _client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web", "db"]).await;

    // Drain into a batch, then drop one entity before outcomes apply.
    let drained = reg.select_pending(10, Utc::now()).await.expect("select");
    assert_eq!(drained.len(), 2);
    reg.remove(keys[1]).await.expect("remove");

    // Nothing new is eligible while the batch is outstanding.
    let summary = machine.run_cycle().await.expect("cycle");
    assert_eq!(summary.selected, 0);

    // Apply the outcomes the way apply_response would once the call returns.
    reg.apply_outcome(
        keys[0],
        RecordOutcome::Registered(EntityId::new("remote-web").expect("valid id")),
    )
    .await
    .expect("apply");
    reg.apply_outcome(
        keys[1],
        RecordOutcome::Registered(EntityId::new("remote-db").expect("valid id")),
    )
    .await
    .expect("late outcome discarded");

    assert!(reg.find(keys[1]).await.expect("find").is_none());
    let kept = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(kept.state(), RegistrationState::Registered);
}

#[tokio::test(flavor = "multi_thread")]
async fn response_naming_unknown_entity_is_ignored() {
    let (reg, client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web"]).await;
    client
        .enqueue_response(BatchRegisterResponse::new([
            RegisterOutcome::Registered {
                key: EntityKey::new(),
                entity_id: EntityId::new("remote-ghost").expect("valid id"),
            },
            RegisterOutcome::Registered {
                key: keys[0],
                entity_id: EntityId::new("remote-web").expect("valid id"),
            },
        ]))
        .expect("script response");

    let summary = machine.run_cycle().await.expect("cycle");

    assert_eq!(summary.registered, 1);
    let record = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(record.state(), RegistrationState::Registered);
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_in_flight_reverts_pending_entities() {
    let (reg, _client, machine) = state_machine();
    let keys = upsert_entities(&reg, &["web"]).await;
    let drained = reg.select_pending(10, Utc::now()).await.expect("select");
    assert_eq!(drained.len(), 1);

    let aborted = machine
        .abort_in_flight("registration cancelled by shutdown")
        .await
        .expect("abort");

    assert_eq!(aborted, 1);
    let record = reg.find(keys[0]).await.expect("find").expect("record");
    assert_eq!(record.state(), RegistrationState::Failed);
    assert_eq!(record.attempts(), 1);
    assert_eq!(
        record.last_failure().map(|f| f.detail().to_owned()),
        Some("registration cancelled by shutdown".to_owned())
    );
}
