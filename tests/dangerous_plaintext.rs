#![cfg(all(feature = "dangerous-plaintext", feature = "axum"))]

mod common;

use axum::{Router, body::Body, routing::get};
use http::{Request, StatusCode, header};
use tower::ServiceExt as _;
use tower_lazy_sessions::{CookieStore, Session, SessionManagerLayer};

fn app() -> Router {
    let store = CookieStore::dangerous_plaintext();

    Router::new()
        .route(
            "/set-user",
            get(|session: Session| async move {
                session
                    .insert("user", "alice")
                    .await
                    .expect("session insert succeeds");
                session.save().await.expect("session save succeeds");
            }),
        )
        .route(
            "/get-user",
            get(|session: Session| async move {
                session
                    .get::<String>("user")
                    .await
                    .expect("session get succeeds")
                    .unwrap_or_else(|| "none".to_string())
            }),
        )
        .layer(SessionManagerLayer::new(common::SESSION_NAME, store))
}

#[tokio::test]
async fn plaintext_round_trip() {
    let app = app();

    let req = Request::builder()
        .uri("/set-user")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    let cookie = common::cookie_header_value(&common::get_session_cookie(&res));

    let req = Request::builder()
        .uri("/get-user")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .oneshot(req)
        .await
        .expect("service call succeeds");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::body_string(res.into_body()).await, "alice");
}

#[tokio::test]
async fn payload_is_readable_without_any_key() {
    let app = app();

    let req = Request::builder()
        .uri("/set-user")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .oneshot(req)
        .await
        .expect("service call succeeds");
    let cookie = common::get_session_cookie(&res);

    let record = common::decode_record(cookie.value());
    assert_eq!(
        record.values.get("user"),
        Some(&serde_json::json!("alice"))
    );
}
