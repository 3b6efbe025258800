#![allow(clippy::unwrap_used)]
// Refresh policy tests for `SessionManager` against a mock vendor.

mod common;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use millheat_core::{
    AuthState, ConnectionState, Credential, Freshness, Lifecycle, TokenStatus,
};

use common::{DAY_MS, api_error, grant, session_for, valid_credential};

const NOW: i64 = 1_700_000_000_000;

async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/share/refreshtoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant(
            "at-new",
            "rt-new",
            NOW + 2 * 3_600_000,
            NOW + 30 * DAY_MS,
        )))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn never_authenticated_makes_no_call() {
    let server = MockServer::start().await;
    mount_refresh(&server, 0).await;

    let lifecycle = Lifecycle::new();
    let session = session_for(&server, Credential::default(), &lifecycle);

    assert_eq!(session.ensure_fresh(NOW).await, Freshness::Unauthenticated);
    assert_eq!(session.credential().status, TokenStatus::NeverAuthenticated);
}

#[tokio::test]
async fn valid_token_is_kept() {
    let server = MockServer::start().await;
    mount_refresh(&server, 0).await;

    let lifecycle = Lifecycle::new();
    let session = session_for(&server, valid_credential("at-1", NOW, NOW + DAY_MS), &lifecycle);

    let freshness = session.ensure_fresh(NOW).await;
    assert!(matches!(freshness, Freshness::Unchanged(ref c) if c.access_token == "at-1"));
    assert!(!freshness.changed_credential());
}

#[tokio::test]
async fn expired_token_refreshes_exactly_once() {
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

    let lifecycle = Lifecycle::new();
    let session = session_for(
        &server,
        valid_credential("at-old", NOW - 1, NOW + DAY_MS),
        &lifecycle,
    );

    let freshness = session.ensure_fresh(NOW).await;
    let Freshness::Refreshed(fresh) = freshness else {
        panic!("expected a refresh, got {freshness:?}");
    };
    assert_eq!(fresh.access_token, "at-new");
    assert_eq!(fresh.refresh_token, "rt-new");
    assert_eq!(fresh.status, TokenStatus::Valid);
    assert_eq!(session.credential().access_token, "at-new");
    assert_eq!(lifecycle.connection_state(), ConnectionState::Connected);
    assert_eq!(lifecycle.auth_state(), AuthState::Authenticated);

    // The new token is good for another two hours: no second call.
    assert!(matches!(session.ensure_fresh(NOW + 1_000).await, Freshness::Unchanged(_)));
}

#[tokio::test]
async fn failed_refresh_marks_credential_and_disconnects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share/refreshtoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_error(30017, "refresh token invalid")))
        .expect(2)
        .mount(&server)
        .await;

    let lifecycle = Lifecycle::new();
    lifecycle.mark_connected();
    let session = session_for(
        &server,
        valid_credential("at-old", NOW - 1, NOW + DAY_MS),
        &lifecycle,
    );

    let freshness = session.ensure_fresh(NOW).await;
    assert_eq!(freshness, Freshness::RefreshFailed);
    assert!(freshness.changed_credential());
    assert_eq!(session.credential().status, TokenStatus::RefreshFailed);
    assert_eq!(lifecycle.connection_state(), ConnectionState::Disconnected);

    // Next tick retries while the window is still open.
    assert_eq!(session.ensure_fresh(NOW + 60_000).await, Freshness::RefreshFailed);
}

#[tokio::test]
async fn lapsed_refresh_window_makes_no_call() {
    let server = MockServer::start().await;
    mount_refresh(&server, 0).await;

    let lifecycle = Lifecycle::new();
    lifecycle.mark_authenticated();
    lifecycle.mark_connected();
    let session = session_for(
        &server,
        valid_credential("at-old", NOW - DAY_MS, NOW - 1),
        &lifecycle,
    );

    assert_eq!(session.ensure_fresh(NOW).await, Freshness::WindowExpired);
    assert_eq!(lifecycle.auth_state(), AuthState::NotAuthenticated);
    assert_eq!(lifecycle.connection_state(), ConnectionState::Disconnected);

    // Repeated ticks stay quiet.
    assert_eq!(session.ensure_fresh(NOW + DAY_MS).await, Freshness::WindowExpired);
}

#[tokio::test]
async fn authorize_stores_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share/applyAccessToken"))
        .and(query_param("username", "user@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant(
            "at-1",
            "rt-1",
            NOW + 3_600_000,
            NOW + 30 * DAY_MS,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let lifecycle = Lifecycle::new();
    let session = session_for(&server, Credential::default(), &lifecycle);
    let password = "hunter2".to_string().into();

    let credential = session
        .authorize("code-1", "user@example.com", &password)
        .await
        .unwrap();

    assert_eq!(credential.status, TokenStatus::Valid);
    assert_eq!(session.credential().access_token, "at-1");
    assert_eq!(lifecycle.auth_state(), AuthState::Authenticated);
    assert_eq!(lifecycle.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn rejected_authorization_fails_loudly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share/applyAccessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_error(10012, "wrong password")))
        .mount(&server)
        .await;

    let lifecycle = Lifecycle::new();
    let session = session_for(&server, Credential::default(), &lifecycle);
    let password = "nope".to_string().into();

    let err = session.authorize("code-1", "user", &password).await.unwrap_err();

    assert!(err.requires_reauthorization(), "unexpected error: {err:?}");
    assert_eq!(lifecycle.auth_state(), AuthState::Failed);
    assert_eq!(session.credential().status, TokenStatus::NeverAuthenticated);
}
