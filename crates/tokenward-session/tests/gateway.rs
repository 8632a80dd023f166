//! Request gateway tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, REFRESH, RefreshBehavior, settle};
use serde_json::json;
use tokenward_core::{AccessToken, ApiRequest, CancelHandle, CancelSignal, Error, UserIdentity};
use tokenward_session::users::{UserSummary, list_users};
use tokenward_session::{Gateway, SessionConfig, SessionState};

fn gateway(backend: &Arc<MockBackend>) -> Gateway<Arc<MockBackend>> {
    Gateway::new(Arc::clone(backend), SessionState::new(), SessionConfig::default())
}

fn signed_in(gateway: &Gateway<Arc<MockBackend>>, token: &str) {
    gateway
        .session()
        .set(UserIdentity::new(7, "ana"), AccessToken::new(token));
}

#[tokio::test]
async fn test_valid_token_passes_through() {
    let backend = Arc::new(MockBackend::new(Some("T1"), RefreshBehavior::issue("T2")));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let users = list_users(&gateway, &CancelSignal::never()).await.unwrap();

    assert_eq!(users, vec![UserSummary { username: "bob".into() }]);
    assert_eq!(backend.bearers_for("/users"), vec![Some("T1".to_string())]);
    assert_eq!(gateway.refresher().exchange_count(), 0);
}

#[tokio::test]
async fn test_expired_token_is_renewed_and_retried_once() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::issue("T2")));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let response = gateway
        .call(&ApiRequest::get("/users"), &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body, json!([{"username": "bob"}]));
    assert_eq!(
        backend.bearers_for("/users"),
        vec![Some("T1".to_string()), Some("T2".to_string())]
    );
    assert_eq!(gateway.refresher().exchange_count(), 1);
}

#[tokio::test]
async fn test_missing_token_is_renewed() {
    let backend = Arc::new(MockBackend::new(None, RefreshBehavior::issue("T2")));
    let gateway = gateway(&backend);

    let users = list_users(&gateway, &CancelSignal::never()).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(
        backend.bearers_for("/users"),
        vec![None, Some("T2".to_string())]
    );
    assert_eq!(gateway.session().identity(), Some(UserIdentity::new(7, "ana")));
}

#[tokio::test]
async fn test_retry_is_bounded_to_one() {
    let backend = Arc::new(
        MockBackend::new(Some("T1"), RefreshBehavior::issue("T2")).rejecting_everything(),
    );
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let err = gateway
        .call(&ApiRequest::get("/users"), &CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(ref e) if e.status == 401));
    assert_eq!(backend.count("/users"), 2);
    assert_eq!(backend.count(REFRESH), 1);
    // The renewal itself succeeded, so the session survives.
    assert!(gateway.session().is_authenticated());
}

#[tokio::test]
async fn test_denied_renewal_is_terminal() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::Deny(403)));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let err = gateway
        .call(&ApiRequest::get("/users"), &CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuthDenied));
    assert!(err.requires_sign_in());
    assert_eq!(backend.count("/users"), 1);
    assert!(gateway.session().identity().is_none());
    assert!(gateway.session().access_token().is_none());
}

#[tokio::test]
async fn test_transient_renewal_returns_original_failure() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::NetworkDown));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let err = gateway
        .call(&ApiRequest::get("/users"), &CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(ref e) if e.status == 401));
    assert!(!err.requires_sign_in());
    assert_eq!(backend.count("/users"), 1);
    // A flaky network never signs the user out.
    assert_eq!(gateway.session().access_token(), Some(AccessToken::new("T1")));
    assert_eq!(gateway.session().identity(), Some(UserIdentity::new(7, "ana")));
}

#[tokio::test]
async fn test_other_failures_skip_renewal() {
    for (status, server) in [(500, true), (503, true), (404, false), (409, false), (403, false)] {
        let backend = Arc::new(
            MockBackend::new(Some("T1"), RefreshBehavior::issue("T2"))
                .with_protected_status(status),
        );
        let gateway = gateway(&backend);
        signed_in(&gateway, "T1");

        let err = gateway
            .call(&ApiRequest::get("/users"), &CancelSignal::never())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(status));
        assert_eq!(matches!(err, Error::Server(_)), server);
        assert_eq!(backend.count(REFRESH), 0);
        assert_eq!(backend.count("/users"), 1);
    }
}

#[tokio::test]
async fn test_custom_rejection_statuses() {
    let backend = Arc::new(
        MockBackend::new(Some("T1"), RefreshBehavior::issue("T2")).with_protected_status(403),
    );
    let config = SessionConfig {
        rejection_statuses: vec![401, 403],
        ..SessionConfig::default()
    };
    let gateway = Gateway::new(Arc::clone(&backend), SessionState::new(), config);
    signed_in(&gateway, "T1");

    let err = gateway
        .call(&ApiRequest::get("/users"), &CancelSignal::never())
        .await
        .unwrap_err();

    // 403 now means "renew"; the retry with T2 still gets 403, and stops there.
    assert!(matches!(err, Error::Rejected(ref e) if e.status == 403));
    assert_eq!(backend.count(REFRESH), 1);
    assert_eq!(backend.count("/users"), 2);
}

#[tokio::test]
async fn test_concurrent_expired_calls_refresh_once() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::issue("T2")).gated());
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let calls: Vec<_> = (0..10)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move { list_users(&gateway, &CancelSignal::never()).await })
        })
        .collect();

    settle(|| backend.count(REFRESH) == 1 && backend.count("/users") == 10).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    backend.release_refresh(1);

    for call in calls {
        let users = call.await.unwrap().unwrap();
        assert_eq!(users[0].username, "bob");
    }
    assert_eq!(gateway.refresher().exchange_count(), 1);
    assert_eq!(backend.count(REFRESH), 1);
    assert_eq!(backend.count("/users"), 20);
}

#[tokio::test(start_paused = true)]
async fn test_late_rejection_uses_already_renewed_token() {
    let backend = Arc::new(
        MockBackend::new(Some("T2"), RefreshBehavior::issue("T3"))
            .with_protected_delay(Duration::from_secs(2)),
    );
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let call = {
        let gateway = gateway.clone();
        tokio::spawn(async move { list_users(&gateway, &CancelSignal::never()).await })
    };

    // Another caller renews to T2 while this request is still in flight.
    tokio::time::sleep(Duration::from_secs(1)).await;
    signed_in(&gateway, "T2");

    assert_eq!(call.await.unwrap().unwrap().len(), 1);
    assert_eq!(
        backend.bearers_for("/users"),
        vec![Some("T1".to_string()), Some("T2".to_string())]
    );
    assert_eq!(backend.count(REFRESH), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_rejection_reuses_settled_renewal_outcome() {
    for (refresh, denied) in [
        (RefreshBehavior::NetworkDown, false),
        (RefreshBehavior::Deny(401), true),
    ] {
        let backend = Arc::new(
            MockBackend::new(Some("T0"), refresh).with_protected_delay(Duration::from_secs(2)),
        );
        let gateway = gateway(&backend);
        signed_in(&gateway, "T1");

        let first = {
            let gateway = gateway.clone();
            tokio::spawn(async move { list_users(&gateway, &CancelSignal::never()).await })
        };
        // Sent with the same stale token; its 401 lands after the first
        // call's renewal has already settled.
        let second = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1500)).await;
                list_users(&gateway, &CancelSignal::never()).await
            })
        };

        let errors = [
            first.await.unwrap().unwrap_err(),
            second.await.unwrap().unwrap_err(),
        ];

        assert_eq!(backend.count(REFRESH), 1);
        assert_eq!(gateway.refresher().exchange_count(), 1);
        assert_eq!(backend.count("/users"), 2);
        for err in &errors {
            if denied {
                assert!(matches!(err, Error::AuthDenied));
            } else {
                assert!(matches!(err, Error::Rejected(e) if e.status == 401));
            }
        }
    }
}

#[tokio::test]
async fn test_rejection_after_settled_renewal_starts_a_new_one() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::NetworkDown));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    // Each call is sent after the previous renewal settled, so each one
    // discovers the stale token on its own.
    for _ in 0..2 {
        let err = list_users(&gateway, &CancelSignal::never()).await.unwrap_err();
        assert!(matches!(err, Error::Rejected(_)));
    }

    assert_eq!(backend.count(REFRESH), 2);
    assert_eq!(gateway.refresher().generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_abort_before_response_is_silent() {
    let backend = Arc::new(
        MockBackend::new(Some("T0"), RefreshBehavior::issue("T2"))
            .with_protected_delay(Duration::from_secs(5)),
    );
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let screen = CancelHandle::new();
    let call = {
        let gateway = gateway.clone();
        let signal = screen.signal();
        tokio::spawn(async move { list_users(&gateway, &signal).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    screen.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Aborted));
    assert!(err.is_silent());

    // Let the would-be response time pass; nothing else happens.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.count(REFRESH), 0);
    assert_eq!(backend.count("/users"), 1);
    assert_eq!(gateway.session().access_token(), Some(AccessToken::new("T1")));
}

#[tokio::test]
async fn test_already_cancelled_sends_nothing() {
    let backend = Arc::new(MockBackend::new(Some("T1"), RefreshBehavior::issue("T2")));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let screen = CancelHandle::new();
    screen.cancel();

    let err = list_users(&gateway, &screen.signal()).await.unwrap_err();
    assert!(matches!(err, Error::Aborted));
    assert!(backend.seen().is_empty());
}

#[tokio::test]
async fn test_abort_while_waiting_for_renewal() {
    let backend = Arc::new(MockBackend::new(Some("T0"), RefreshBehavior::issue("T2")).gated());
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let screen = CancelHandle::new();
    let aborted = {
        let gateway = gateway.clone();
        let signal = screen.signal();
        tokio::spawn(async move { list_users(&gateway, &signal).await })
    };
    let survivor = {
        let gateway = gateway.clone();
        tokio::spawn(async move { list_users(&gateway, &CancelSignal::never()).await })
    };

    settle(|| backend.count(REFRESH) == 1 && backend.count("/users") == 2).await;
    screen.cancel();
    assert!(matches!(aborted.await.unwrap(), Err(Error::Aborted)));

    backend.release_refresh(1);
    assert_eq!(survivor.await.unwrap().unwrap().len(), 1);
    // The aborted call never retried.
    assert_eq!(backend.count("/users"), 3);
    assert_eq!(backend.count(REFRESH), 1);
}

#[tokio::test]
async fn test_post_json_sends_body_and_bearer() {
    let backend = Arc::new(MockBackend::new(Some("T1"), RefreshBehavior::issue("T2")));
    let gateway = gateway(&backend);
    signed_in(&gateway, "T1");

    let _: serde_json::Value = gateway
        .post_json("/notes", &json!({"text": "hi"}), &CancelSignal::never())
        .await
        .unwrap();

    let seen = backend.seen();
    assert_eq!(seen[0].body, Some(json!({"text": "hi"})));
    assert_eq!(seen[0].bearer.as_deref(), Some("T1"));
}
