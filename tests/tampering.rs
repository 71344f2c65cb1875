#![cfg(all(feature = "signed", feature = "axum"))]

mod common;

use axum::{Router, body::Body, routing::get};
use http::{Request, StatusCode, header};
use tower::ServiceExt as _;
use tower_cookies::{Cookie, Key};
use tower_lazy_sessions::{CookieStore, Session, SessionManagerLayer};

fn tamper_cookie_value(cookie: &mut Cookie<'_>) {
    let mut value = cookie.value().to_string();
    let last = value
        .pop()
        .expect("cookie value has at least one character");
    let replacement = if last == 'A' { 'B' } else { 'A' };
    value.push(replacement);
    cookie.set_value(value);
}

fn app() -> Router {
    let key = Key::generate();
    let store = CookieStore::signed(key);

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

async fn set_user(app: &Router) -> Cookie<'static> {
    let req = Request::builder()
        .uri("/set-user")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    common::get_session_cookie(&res)
}

async fn get_user(app: &Router, cookie: &str) -> String {
    let req = Request::builder()
        .uri("/get-user")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    assert_eq!(res.status(), StatusCode::OK);
    common::body_string(res.into_body()).await
}

#[tokio::test]
async fn untampered_cookie_is_accepted() {
    let app = app();

    let cookie = set_user(&app).await;

    let user = get_user(&app, &common::cookie_header_value(&cookie)).await;
    assert_eq!(user, "alice");
}

#[tokio::test]
async fn tampered_cookie_is_rejected() {
    let app = app();

    let mut cookie = set_user(&app).await;
    tamper_cookie_value(&mut cookie);

    let user = get_user(&app, &common::cookie_header_value(&cookie)).await;
    assert_eq!(user, "none");
}

#[tokio::test]
async fn cookie_signed_with_another_key_is_rejected() {
    let other_app = app();
    let app = app();

    // A cookie minted by a service holding a different key.
    let cookie = set_user(&other_app).await;

    let user = get_user(&app, &common::cookie_header_value(&cookie)).await;
    assert_eq!(user, "none");
}
