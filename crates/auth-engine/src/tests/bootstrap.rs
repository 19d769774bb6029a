//! Startup resolution tests.

use super::harness::{user, TestHarness};
use crate::{AuthStatus, ResolveError, RetryConfig};
use std::time::Duration;

#[tokio::test]
async fn bootstrap_resolves_user_on_first_attempt() {
    let h = TestHarness::new();
    h.store.save("tok123").unwrap();
    h.authority.push_user(user("Ann", "a@x.com"));

    assert_eq!(h.context.status(), AuthStatus::Loading);
    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.status, AuthStatus::Authenticated);
    assert_eq!(report.retries, 0);
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.context.user(), Some(user("Ann", "a@x.com")));
    assert_eq!(h.authority.credentials_seen(), vec![Some("tok123".to_string())]);
    h.assert_consistent();
}

#[tokio::test]
async fn bootstrap_retries_unreachable_server_then_succeeds() {
    let h = TestHarness::new();
    h.authority.push_failures(ResolveError::NetworkUnreachable, 3);
    h.authority.push_user(user("Ann", "a@x.com"));

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.retries, 3);
    assert_eq!(report.status, AuthStatus::Authenticated);
    assert_eq!(h.authority.current_user_calls(), 4);
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_millis(500); 3]);
    h.assert_consistent();
}

#[tokio::test]
async fn bootstrap_gives_up_after_max_retries() {
    let h = TestHarness::new();
    h.store.save("tok123").unwrap();
    h.authority.set_fallback(ResolveError::NetworkUnreachable);

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.retries, 10);
    assert_eq!(report.status, AuthStatus::Unauthenticated);
    assert_eq!(h.authority.current_user_calls(), 11);
    assert_eq!(h.sleeper.sleeps().len(), 10);
    assert!(h.context.user().is_none());
    // Giving up does not discard the credential; the server may come back.
    assert_eq!(h.token(), Some("tok123".to_string()));
    h.assert_consistent();
}

#[tokio::test]
async fn bootstrap_respects_custom_retry_config() {
    let h = TestHarness::with_retry_config(RetryConfig {
        max_retries: 2,
        backoff_ms: 50,
    });
    h.authority.set_fallback(ResolveError::NetworkUnreachable);

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.retries, 2);
    assert_eq!(h.authority.current_user_calls(), 3);
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_millis(50); 2]);
}

#[tokio::test]
async fn bootstrap_unauthorized_is_not_retried() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::Unauthorized);

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.status, AuthStatus::Unauthenticated);
    assert_eq!(report.retries, 0);
    assert_eq!(h.authority.current_user_calls(), 1);
    assert!(h.sleeper.sleeps().is_empty());
    h.assert_consistent();
}

#[tokio::test]
async fn bootstrap_server_error_settles_unauthenticated() {
    let h = TestHarness::new();
    h.authority.push_failure(ResolveError::OtherHttp {
        status: 500,
        body: "database down".to_string(),
    });

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.status, AuthStatus::Unauthenticated);
    assert_eq!(h.authority.current_user_calls(), 1);
    assert!(h.context.status().is_settled());
    h.assert_consistent();
}

#[tokio::test]
async fn bootstrap_unreachable_then_unauthorized_stops_retrying() {
    let h = TestHarness::new();
    h.authority.push_failures(ResolveError::NetworkUnreachable, 2);
    h.authority.push_failure(ResolveError::Unauthorized);
    h.authority.push_user(user("Never", "never@x.com"));

    let report = h.context.bootstrap().await.unwrap();

    assert_eq!(report.retries, 2);
    assert_eq!(report.status, AuthStatus::Unauthenticated);
    assert_eq!(h.authority.current_user_calls(), 3);
}

#[tokio::test]
async fn bootstrap_status_follows_last_attempt() {
    let scripts: Vec<(Vec<Result<(), ResolveError>>, AuthStatus)> = vec![
        (vec![Ok(())], AuthStatus::Authenticated),
        (
            vec![Err(ResolveError::NetworkUnreachable), Ok(())],
            AuthStatus::Authenticated,
        ),
        (vec![Err(ResolveError::Unauthorized)], AuthStatus::Unauthenticated),
        (
            vec![
                Err(ResolveError::NetworkUnreachable),
                Err(ResolveError::from_status(502, "bad gateway")),
            ],
            AuthStatus::Unauthenticated,
        ),
    ];

    for (script, expected) in scripts {
        let h = TestHarness::new();
        for step in script {
            match step {
                Ok(()) => h.authority.push_user(user("Ann", "a@x.com")),
                Err(e) => h.authority.push_failure(e),
            }
        }

        let report = h.context.bootstrap().await.unwrap();
        assert_eq!(report.status, expected);
        assert_eq!(h.context.status(), expected);
        h.assert_consistent();
    }
}

#[tokio::test]
async fn bootstrap_publishes_settled_status() {
    let h = TestHarness::new();
    h.authority.push_user(user("Ann", "a@x.com"));

    h.context.bootstrap().await.unwrap();

    let events = h.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, AuthStatus::Authenticated);
    assert_eq!(events[0].user_id.as_deref(), Some("id-ann"));
    assert_eq!(events[0].email.as_deref(), Some("a@x.com"));
}
