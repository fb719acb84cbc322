//! Pass-through proxy behavior.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use vitrina_integration_tests::{
    FakeBackend, Reply, TestApp, fixtures, unreachable_url,
};

#[tokio::test]
async fn test_public_proxy_preserves_request() {
    let backend = FakeBackend::start(|call| {
        if call.path == "/products" {
            Reply::ok(json!({ "items": [], "page": 2 }))
        } else {
            Reply::not_found()
        }
    })
    .await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .get(app.url("/api/proxy/products?page=2&sort=price"))
        .header("authorization", "Bearer forged")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page"], 2);

    let call = backend.find("GET", "/products").unwrap();
    assert_eq!(call.query.as_deref(), Some("page=2&sort=price"));
    assert!(call.header("authorization").is_none());
    assert!(call.header("x-cart-session").is_some());
}

#[tokio::test]
async fn test_public_proxy_passes_upstream_errors_through() {
    let backend = FakeBackend::start(|_| {
        Reply::error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid filter")
    })
    .await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .post(app.url("/api/proxy/products/search"))
        .json(&json!({ "q": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let call = backend.find("POST", "/products/search").unwrap();
    assert_eq!(call.body, json!({ "q": "" }));
}

#[tokio::test]
async fn test_auth_proxy_requires_sign_in() {
    let backend = FakeBackend::start(|_| Reply::ok(json!({}))).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .get(app.url("/api/auth-proxy/orders"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["login_url"], "/auth/login");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_auth_proxy_turns_upstream_401_into_login_affordance() {
    let backend = FakeBackend::start(|call| match (call.method.as_str(), call.path.as_str()) {
        ("POST", "/auth/login") => Reply::ok(fixtures::grant()),
        ("POST", "/cart/attach") => Reply::ok(fixtures::cart(&[])),
        ("GET", "/orders") => Reply::error(StatusCode::UNAUTHORIZED, "Token expired"),
        _ => Reply::not_found(),
    })
    .await;
    let app = TestApp::spawn(&backend.url).await;
    assert_eq!(app.login().await.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url("/api/auth-proxy/orders"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["login_url"], "/auth/login");

    let call = backend.find("GET", "/orders").unwrap();
    assert_eq!(
        call.header("authorization"),
        Some(format!("Bearer {}", fixtures::TOKEN).as_str())
    );
    // The storefront session cookie stays on the storefront
    assert!(
        call.header("cookie")
            .is_none_or(|cookie| !cookie.contains("vitrina_session"))
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let url = unreachable_url().await;
    let app = TestApp::spawn(&url).await;

    let response = app
        .client
        .get(app.url("/api/proxy/products"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Backend unavailable");
    assert!(body["detail"].is_string());
}
