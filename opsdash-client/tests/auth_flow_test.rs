//! End-to-end tests for login, refresh, and logout against a mock API

mod common;

use common::TestApp;
use opsdash_client::LoginCredentials;
use opsdash_core::OpsdashError;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_login_populates_session() {
    let app = TestApp::spawn().await;
    let client = app.client();

    app.login(&client).await;

    let session = client.session().snapshot();
    assert!(session.authenticated);
    assert!(session.access_token.is_some());
    assert!(session.refresh_token.is_some());

    let user = session.user.expect("profile should be populated");
    assert_eq!(user.username, "dora");
    assert!(user.has_permission("OPTIONS_READ"));
}

#[tokio::test]
async fn test_login_with_bad_credentials_leaves_session_untouched() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let result = client
        .login(&LoginCredentials {
            username: "dora".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    // Generic failure, no cause detail
    match result {
        Err(OpsdashError::Authentication { message, .. }) => {
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("Expected authentication error, got {:?}", other.err()),
    }

    let session = client.session().snapshot();
    assert!(!session.authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert!(session.user.is_none());
}

#[tokio::test]
async fn test_expired_token_refreshes_once_and_retries_once() {
    let app = TestApp::spawn().await;
    let client = app.client();

    app.login(&client).await;
    app.api.expire_access();

    let options = client.options().list().await.expect("retry should succeed");
    assert_eq!(options.len(), 2);

    // One refresh, and the session holds the rotated pair
    assert_eq!(app.api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.session().access_token().as_deref(),
        Some(app.api.current_access().as_str())
    );
    // First attempt plus exactly one retry
    assert_eq!(app.api.options_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_revoked_refresh_token_forces_logout() {
    let app = TestApp::spawn().await;
    let client = app.client();

    app.login(&client).await;
    app.api.expire_access();
    app.api.revoke_refresh();

    let result = client.options().list().await;
    assert!(matches!(
        result,
        Err(OpsdashError::Authentication { .. })
    ));

    // Refresh failure clears the whole session
    let session = client.session().snapshot();
    assert!(!session.authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert!(session.user.is_none());
}

#[tokio::test]
async fn test_concurrent_401s_coalesce_into_one_refresh() {
    let app = TestApp::spawn().await;
    let client = app.client();

    app.login(&client).await;
    app.api.expire_access();

    let (a, b) = futures::future::join(
        client.options().list(),
        client.options().list(),
    )
    .await;

    assert_eq!(a.expect("first concurrent request failed").len(), 2);
    assert_eq!(b.expect("second concurrent request failed").len(), 2);
    assert_eq!(app.api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_is_local_and_synchronous() {
    let app = TestApp::spawn().await;
    let client = app.client();

    app.login(&client).await;
    let calls_before = app.api.login_calls.load(Ordering::SeqCst)
        + app.api.refresh_calls.load(Ordering::SeqCst)
        + app.api.profile_calls.load(Ordering::SeqCst)
        + app.api.options_calls.load(Ordering::SeqCst);

    client.logout();

    let calls_after = app.api.login_calls.load(Ordering::SeqCst)
        + app.api.refresh_calls.load(Ordering::SeqCst)
        + app.api.profile_calls.load(Ordering::SeqCst)
        + app.api.options_calls.load(Ordering::SeqCst);

    assert_eq!(calls_before, calls_after);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_unauthenticated_request_fails_without_network() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let result = client.options().list().await;
    assert!(matches!(
        result,
        Err(OpsdashError::Authentication { .. })
    ));

    assert_eq!(app.api.options_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.api.refresh_calls.load(Ordering::SeqCst), 0);
}
