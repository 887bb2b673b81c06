//! Integration tests for share-link generation and the refresh interceptor

mod common;

use common::{Harness, ORIGIN};
use mockito::{Matcher, Server};
use rollshare_core::{ApiError, Route, TokenPair};
use serde_json::json;

#[tokio::test]
async fn valid_token_generates_link_without_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let share_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"shareToken":"share-abc"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server.mock("POST", "/refresh").expect(0).create_async().await;
    let harness = Harness::logged_in(&server.url(), "access-1", "refresh-1");

    //* When
    let link = harness.share.generate_share_link().await.expect("link");

    //* Then
    share_mock.assert_async().await;
    refresh_mock.assert_async().await;
    assert_eq!(link.token, "share-abc");
    assert_eq!(link.url, format!("{}/share/share-abc", ORIGIN));
}

#[tokio::test]
async fn expired_token_refreshes_once_and_replays_once() {
    //* Given
    let mut server = Server::new_async().await;
    let expired_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .with_body(r#"{"message":"jwt expired"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "refresh-1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"fresh","refreshToken":"refresh-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let replay_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"shareToken":"share-xyz"}"#)
        .expect(1)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");

    //* When
    let link = harness.share.generate_share_link().await.expect("link after refresh");

    //* Then
    expired_mock.assert_async().await;
    refresh_mock.assert_async().await;
    replay_mock.assert_async().await;
    assert_eq!(link.url, format!("{}/share/share-xyz", ORIGIN));
    assert_eq!(harness.stores.access_token().as_deref(), Some("fresh"));
    assert_eq!(harness.stores.refresh_token().as_deref(), Some("refresh-2"));
    assert!(harness.navigator.routes().is_empty());
}

#[tokio::test]
async fn forbidden_also_triggers_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let _forbidden_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer stale")
        .with_status(403)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/refresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"fresh","refreshToken":"refresh-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let _replay_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(r#"{"shareToken":"s"}"#)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");

    //* When
    let link = harness.share.generate_share_link().await.expect("link");

    //* Then
    refresh_mock.assert_async().await;
    assert_eq!(link.token, "s");
}

#[tokio::test]
async fn missing_refresh_token_ends_session() {
    //* Given
    let mut server = Server::new_async().await;
    let share_mock = server
        .mock("POST", "/share")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server.mock("POST", "/refresh").expect(0).create_async().await;
    let harness = Harness::access_only(&server.url(), "stale");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    share_mock.assert_async().await;
    refresh_mock.assert_async().await;
    assert_eq!(
        err,
        ApiError::AuthExpired(
            "Authentication expired. No refresh token found. Please log in again.".to_string()
        )
    );
    assert_eq!(harness.stores.access_token(), None);
    assert_eq!(harness.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn rejected_refresh_is_not_refreshed_again() {
    //* Given
    let mut server = Server::new_async().await;
    let share_mock = server
        .mock("POST", "/share")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/refresh")
        .with_status(401)
        .with_body(r#"{"message":"refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "revoked");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    share_mock.assert_async().await;
    refresh_mock.assert_async().await;
    assert_eq!(
        err,
        ApiError::AuthExpired("Failed to refresh token. Please log in again.".to_string())
    );
    assert_eq!(harness.stores.access_token(), None);
    assert_eq!(harness.stores.refresh_token(), None);
    assert_eq!(harness.navigator.login_redirects(), 1);
}

#[tokio::test]
async fn refresh_without_both_tokens_ends_session() {
    //* Given
    let mut server = Server::new_async().await;
    let _share_mock = server.mock("POST", "/share").with_status(401).create_async().await;
    let _refresh_mock = server
        .mock("POST", "/refresh")
        .with_status(200)
        .with_body(r#"{"accessToken":"fresh"}"#)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    assert!(err.is_auth_expired());
    assert_eq!(harness.stores.refresh_token(), None);
}

#[tokio::test]
async fn rejected_replay_does_not_refresh_twice() {
    //* Given
    let mut server = Server::new_async().await;
    let share_mock = server
        .mock("POST", "/share")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/refresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"fresh","refreshToken":"refresh-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    share_mock.assert_async().await;
    refresh_mock.assert_async().await;
    assert!(err.is_auth_expired());
    assert_eq!(harness.stores.access_token(), None);
    assert_eq!(harness.navigator.login_redirects(), 1);
}

#[tokio::test]
async fn concurrent_rejections_share_one_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let _expired_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(3)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "refresh-1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"fresh","refreshToken":"refresh-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let replay_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"shareToken":"shared"}"#)
        .expect(3)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");

    //* When
    let (a, b, c) = tokio::join!(
        harness.share.generate_share_link(),
        harness.share.generate_share_link(),
        harness.share.generate_share_link(),
    );

    //* Then
    refresh_mock.assert_async().await;
    replay_mock.assert_async().await;
    for result in [a, b, c] {
        assert_eq!(result.expect("link").token, "shared");
    }
}

#[tokio::test]
async fn rotated_token_is_replayed_without_refreshing() {
    //* Given
    let mut server = Server::new_async().await;
    let harness = Harness::logged_in(&server.url(), "stale", "refresh-1");
    let stores = harness.stores.clone();
    // Another request rotates the session while this one is being rejected
    let stale_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .with_body_from_request(move |_| {
            stores
                .store_pair(&TokenPair {
                    access_token: "rotated".to_string(),
                    refresh_token: "refresh-2".to_string(),
                })
                .unwrap();
            Vec::new()
        })
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server.mock("POST", "/refresh").expect(0).create_async().await;
    let replay_mock = server
        .mock("POST", "/share")
        .match_header("authorization", "Bearer rotated")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"shareToken":"after-rotation"}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let link = harness.share.generate_share_link().await.expect("link");

    //* Then
    stale_mock.assert_async().await;
    refresh_mock.assert_async().await;
    replay_mock.assert_async().await;
    assert_eq!(link.token, "after-rotation");
    assert_eq!(harness.stores.refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn share_without_access_token_redirects_without_request() {
    //* Given
    let mut server = Server::new_async().await;
    let share_mock = server.mock("POST", "/share").expect(0).create_async().await;
    let harness = Harness::new(&server.url());

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    share_mock.assert_async().await;
    assert_eq!(
        err,
        ApiError::AuthExpired("Not authenticated. Please log in again.".to_string())
    );
    assert_eq!(harness.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn share_server_error_surfaces_message() {
    //* Given
    let mut server = Server::new_async().await;
    let _share_mock = server
        .mock("POST", "/share")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Share quota exceeded"}"#)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "access-1", "refresh-1");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    assert_eq!(err.user_message(), "Share quota exceeded");
    assert_eq!(err.status(), Some(500));
    // Session survives non-auth failures
    assert_eq!(harness.stores.access_token().as_deref(), Some("access-1"));
}

#[tokio::test]
async fn share_response_without_token_is_protocol_error() {
    //* Given
    let mut server = Server::new_async().await;
    let _share_mock = server
        .mock("POST", "/share")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"wrong-field"}"#)
        .create_async()
        .await;
    let harness = Harness::logged_in(&server.url(), "access-1", "refresh-1");

    //* When
    let err = harness.share.generate_share_link().await.unwrap_err();

    //* Then
    assert_eq!(
        err,
        ApiError::Protocol("API did not return a share token in the expected format.".to_string())
    );
}
