//! Token exchange and Google sign-in tests.

use super::harness::{user, RecordingBridge, TestHarness, GOOGLE_AUTH_URL};
use crate::{deliver_credentials, AuthError, AuthStatus, ResolveError, UserIdentity};
use tokio::sync::mpsc;

fn ann_identity() -> UserIdentity {
    UserIdentity {
        name: "Ann".to_string(),
        email: "a@x.com".to_string(),
    }
}

#[tokio::test]
async fn exchange_token_authenticates_and_forwards_identity() {
    let h = TestHarness::new();
    h.authority.push_user(user("Ann", "a@x.com"));

    let resolved = h.context.exchange_token("tok123").await.unwrap();

    assert_eq!(resolved, user("Ann", "a@x.com"));
    assert_eq!(h.context.status(), AuthStatus::Authenticated);
    assert_eq!(h.context.user(), Some(user("Ann", "a@x.com")));
    assert_eq!(h.bridge.forwarded(), vec![ann_identity()]);
    assert_eq!(h.token(), Some("tok123".to_string()));
    assert_eq!(h.authority.credentials_seen(), vec![Some("tok123".to_string())]);
    h.assert_consistent();
}

#[tokio::test]
async fn exchange_token_unauthorized_clears_store() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::Unauthorized);

    let err = h.context.exchange_token("badtok").await.unwrap_err();

    assert!(matches!(err, AuthError::Resolve(ResolveError::Unauthorized)));
    assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
    assert_eq!(h.token(), None);
    assert!(h.bridge.forwarded().is_empty());
    // The rejected credential was sent before being discarded.
    assert_eq!(h.authority.credentials_seen(), vec![Some("badtok".to_string())]);
    h.assert_consistent();
}

#[tokio::test]
async fn exchange_token_does_not_retry() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::NetworkUnreachable);
    h.authority.push_user(user("Ann", "a@x.com"));

    let err = h.context.exchange_token("tok123").await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(h.authority.current_user_calls(), 1);
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
    assert_eq!(h.token(), None);
}

#[tokio::test]
async fn exchange_token_server_error_clears_previous_session() {
    let h = TestHarness::new();
    h.authority.push_user(user("Ann", "a@x.com"));
    h.context.exchange_token("tok123").await.unwrap();

    h.authority.push_failure(ResolveError::from_status(500, "boom"));
    let err = h.context.exchange_token("tok456").await.unwrap_err();

    assert!(matches!(
        err,
        AuthError::Resolve(ResolveError::OtherHttp { status: 500, .. })
    ));
    assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
    assert!(h.context.user().is_none());
    assert_eq!(h.token(), None);
}

#[tokio::test]
async fn exchange_token_replaces_user() {
    let h = TestHarness::new();
    h.authority.push_user(user("Ann", "a@x.com"));
    h.authority.push_user(user("Bob", "b@x.com"));

    h.context.exchange_token("tok-ann").await.unwrap();
    h.context.exchange_token("tok-bob").await.unwrap();

    assert_eq!(h.context.user(), Some(user("Bob", "b@x.com")));
    assert_eq!(h.token(), Some("tok-bob".to_string()));
    assert_eq!(h.bridge.forwarded().len(), 2);
}

#[tokio::test]
async fn exchange_token_after_failed_bootstrap() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::Unauthorized);
    h.authority.push_user(user("Ann", "a@x.com"));

    h.context.bootstrap().await.unwrap();
    assert_eq!(h.context.status(), AuthStatus::Unauthenticated);

    h.context.exchange_token("tok123").await.unwrap();
    assert!(h.context.is_authenticated());

    let statuses: Vec<AuthStatus> = h.events().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            AuthStatus::Unauthenticated,
            AuthStatus::Loading,
            AuthStatus::Authenticated
        ]
    );
}

#[tokio::test]
async fn bridge_failure_is_ignored() {
    let h = TestHarness::with_bridge(RecordingBridge::failing());
    h.authority.push_user(user("Ann", "a@x.com"));

    let resolved = h.context.exchange_token("tok123").await;

    assert!(resolved.is_ok());
    assert_eq!(h.context.status(), AuthStatus::Authenticated);
    assert_eq!(h.bridge.forwarded(), vec![ann_identity()]);
}

#[tokio::test]
async fn teardown_detaches_bridge_and_callback() {
    let h = TestHarness::new();
    h.authority.push_user(user("Ann", "a@x.com"));

    h.context.teardown();
    h.context.exchange_token("tok123").await.unwrap();

    assert_eq!(h.context.status(), AuthStatus::Authenticated);
    assert!(h.bridge.forwarded().is_empty());
    assert!(h.events().is_empty());
}

#[tokio::test]
async fn login_with_google_opens_url_without_changing_status() {
    let h = TestHarness::new();

    h.context.login_with_google().unwrap();

    let opened = h.opener.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].as_str(), GOOGLE_AUTH_URL);
    assert_eq!(h.context.status(), AuthStatus::Loading);
    assert_eq!(h.authority.current_user_calls(), 0);
}

#[tokio::test]
async fn delivered_credentials_feed_exchange() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::Unauthorized);
    h.authority.push_user(user("Ann", "a@x.com"));

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send("badtok".to_string()).unwrap();
    tx.send("tok123".to_string()).unwrap();
    drop(tx);

    let authenticated = deliver_credentials(h.context.clone(), rx).await;

    assert_eq!(authenticated, 1);
    assert_eq!(h.context.status(), AuthStatus::Authenticated);
    assert_eq!(h.token(), Some("tok123".to_string()));
    assert_eq!(h.bridge.forwarded(), vec![ann_identity()]);
}
