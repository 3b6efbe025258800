#![allow(clippy::unwrap_used)]
// End-to-end poll tick and pause/resume tests for `PollLoop`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use millheat_core::error::PublishError;
use millheat_core::{
    AppState, AuthState, ChannelPublisher, Credential, DeviceId, Fact, Freshness,
    InventoryFetcher, Lifecycle, MemoryStateStore, PollLoop, PollState, Publisher, TickOutcome,
    TokenStatus,
};

use common::{DAY_MS, client_for, grant, mount_single_room_home, session_for, valid_credential};

const NOW: i64 = 1_700_000_000_000;

struct Harness {
    poll: PollLoop,
    publisher: ChannelPublisher,
    store: Arc<MemoryStateStore>,
    lifecycle: Lifecycle,
}

fn harness(server: &MockServer, credential: Credential, interval: Duration) -> Harness {
    let lifecycle = Lifecycle::new();
    let publisher = ChannelPublisher::new();
    let store = Arc::new(MemoryStateStore::default());
    let poll = PollLoop::new(
        session_for(server, credential, &lifecycle),
        InventoryFetcher::new(client_for(server)),
        Arc::new(publisher.clone()),
        store.clone(),
        lifecycle.clone(),
        interval,
    );
    Harness {
        poll,
        publisher,
        store,
        lifecycle,
    }
}

fn drain(rx: &mut broadcast::Receiver<Arc<Fact>>) -> Vec<Fact> {
    let mut facts = Vec::new();
    while let Ok(fact) = rx.try_recv() {
        facts.push((*fact).clone());
    }
    facts
}

#[tokio::test]
async fn one_tick_publishes_temperatures_and_active_setpoints() {
    let server = MockServer::start().await;
    mount_single_room_home(&server, "at-1").await;

    let h = harness(&server, valid_credential("at-1", NOW + DAY_MS, NOW + 30 * DAY_MS), Duration::from_secs(60));
    let mut rx = h.publisher.subscribe();

    let outcome = h.poll.tick_at(NOW).await;
    assert!(
        matches!(outcome, TickOutcome::Published { facts: 3, degraded: 0 }),
        "unexpected outcome: {outcome:?}"
    );

    let facts = drain(&mut rx);
    let temperatures: Vec<_> = facts
        .iter()
        .filter(|f| matches!(f, Fact::TemperatureReport { .. }))
        .collect();
    let setpoints: Vec<_> = facts
        .iter()
        .filter_map(|f| match f {
            Fact::SetpointReport { device_id, value, .. } => Some((*device_id, value.as_str())),
            Fact::TemperatureReport { .. } => None,
        })
        .collect();

    assert_eq!(temperatures.len(), 2);
    assert_eq!(setpoints, vec![(DeviceId(101), "22")]);

    assert_eq!(h.store.snapshot_saves(), 1);
    assert_eq!(h.store.snapshot().unwrap().devices.len(), 2);
    // Token was fresh: nothing to persist.
    assert_eq!(h.store.credential_saves(), 0);
}

#[tokio::test]
async fn expired_token_is_refreshed_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share/refreshtoken"))
        .and(query_param("refreshtoken", "refresh-of-at-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant(
            "at-new",
            "rt-new",
            NOW + 2 * 3_600_000,
            NOW + 30 * DAY_MS,
        )))
        .expect(1)
        .mount(&server)
        .await;
    // Only the refreshed token is accepted for listing.
    Mock::given(method("POST"))
        .and(path("/uds/selectHomeList"))
        .and(header("Access_token", "at-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;
    mount_single_room_home(&server, "at-new").await;

    let h = harness(&server, valid_credential("at-old", NOW - 10, NOW + DAY_MS), Duration::from_secs(60));
    let mut rx = h.publisher.subscribe();

    let outcome = h.poll.tick_at(NOW).await;
    assert!(matches!(outcome, TickOutcome::Published { facts: 3, .. }), "{outcome:?}");
    assert_eq!(drain(&mut rx).len(), 3);

    let saved = h.store.credential().unwrap();
    assert_eq!(saved.access_token, "at-new");
    assert_eq!(saved.status, TokenStatus::Valid);
    assert_eq!(h.store.credential_saves(), 1);
}

#[tokio::test]
async fn fetch_failure_publishes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uds/selectHomeList"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = harness(&server, valid_credential("at-1", NOW + DAY_MS, NOW + 30 * DAY_MS), Duration::from_secs(60));
    let mut rx = h.publisher.subscribe();

    let outcome = h.poll.tick_at(NOW).await;
    assert!(matches!(outcome, TickOutcome::FetchFailed(_)), "{outcome:?}");
    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.store.snapshot_saves(), 0);
}

#[tokio::test]
async fn unusable_session_skips_the_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, valid_credential("at-1", NOW - DAY_MS, NOW - 1), Duration::from_secs(60));

    let outcome = h.poll.tick_at(NOW).await;
    assert!(
        matches!(outcome, TickOutcome::Skipped(Freshness::WindowExpired)),
        "{outcome:?}"
    );
}

struct FlakyPublisher {
    inner: ChannelPublisher,
}

#[async_trait]
impl Publisher for FlakyPublisher {
    async fn publish(&self, fact: &Fact) -> Result<(), PublishError> {
        if fact.device_id() == DeviceId(100) {
            return Err(PublishError("bus unavailable".into()));
        }
        self.inner.publish(fact).await
    }
}

#[tokio::test]
async fn one_failed_publish_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    mount_single_room_home(&server, "at-1").await;

    let lifecycle = Lifecycle::new();
    let channel = ChannelPublisher::new();
    let mut rx = channel.subscribe();
    let poll = PollLoop::new(
        session_for(&server, valid_credential("at-1", NOW + DAY_MS, NOW + 30 * DAY_MS), &lifecycle),
        InventoryFetcher::new(client_for(&server)),
        Arc::new(FlakyPublisher { inner: channel }),
        Arc::new(MemoryStateStore::default()),
        lifecycle,
        Duration::from_secs(60),
    );

    let outcome = poll.tick_at(NOW).await;
    assert!(matches!(outcome, TickOutcome::Published { facts: 2, .. }), "{outcome:?}");
    assert!(drain(&mut rx).iter().all(|f| f.device_id() == DeviceId(101)));
}

#[tokio::test]
async fn loop_waits_for_running_and_stops_when_paused() {
    let server = MockServer::start().await;
    mount_single_room_home(&server, "at-1").await;

    let far_future = chrono::Utc::now().timestamp_millis() + 30 * DAY_MS;
    let h = harness(&server, valid_credential("at-1", far_future, far_future + DAY_MS), Duration::from_millis(50));
    let mut facts = h.publisher.subscribe();
    let mut state = h.poll.subscribe_state();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(h.poll.run(cancel.clone()));

    // Not running yet: no vendor traffic.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(*state.borrow(), PollState::Paused);

    h.lifecycle.start_running();
    tokio::time::timeout(Duration::from_secs(5), facts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), PollState::Polling);

    h.lifecycle.not_configured();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == PollState::Paused))
        .await
        .unwrap()
        .unwrap();

    // Let any request already on the wire land, then expect silence.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let seen = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), seen);

    // Resuming polls again.
    h.lifecycle.start_running();
    drain(&mut facts);
    tokio::time::timeout(Duration::from_secs(5), facts.recv())
        .await
        .unwrap()
        .unwrap();

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn pausing_during_a_refresh_keeps_the_new_token_pair() {
    let now = chrono::Utc::now().timestamp_millis();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share/refreshtoken"))
        .and(query_param("refreshtoken", "refresh-of-at-old"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_json(grant("at-new", "rt-new", now + 2 * 3_600_000, now + 30 * DAY_MS)),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The pause lands before the fetch: no inventory calls.
    Mock::given(method("POST"))
        .and(path("/uds/selectHomeList"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, valid_credential("at-old", now - 10, now + DAY_MS), Duration::from_secs(60));
    let mut state = h.poll.subscribe_state();
    let cancel = CancellationToken::new();
    h.lifecycle.start_running();
    let task = tokio::spawn(h.poll.run(cancel.clone()));

    // The refresh is on the wire but unanswered.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    h.lifecycle.not_configured();

    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == PollState::Paused))
        .await
        .unwrap()
        .unwrap();

    let saved = h.store.credential().unwrap();
    assert_eq!(saved.access_token, "at-new");
    assert_eq!(saved.refresh_token, "rt-new");
    assert_eq!(saved.status, TokenStatus::Valid);
    assert_eq!(h.store.credential_saves(), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn lapsed_refresh_window_pauses_polling() {
    let now = chrono::Utc::now().timestamp_millis();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, valid_credential("at-1", now - DAY_MS, now - 1), Duration::from_millis(50));
    let mut state = h.poll.subscribe_state();
    let mut app = h.lifecycle.subscribe_app();
    let cancel = CancellationToken::new();
    h.lifecycle.start_running();
    let task = tokio::spawn(h.poll.run(cancel.clone()));

    tokio::time::timeout(Duration::from_secs(5), app.wait_for(|s| *s == AppState::NotConfigured))
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == PollState::Paused))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.lifecycle.auth_state(), AuthState::NotAuthenticated);

    // Several intervals pass without another tick or any vendor call.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*state.borrow(), PollState::Paused);
    assert_eq!(h.lifecycle.app_state(), AppState::NotConfigured);
    assert!(server.received_requests().await.unwrap().is_empty());

    cancel.cancel();
    task.await.unwrap();
}
