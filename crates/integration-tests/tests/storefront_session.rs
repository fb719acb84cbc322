//! Session, login and cart behavior.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use vitrina_integration_tests::{Call, FakeBackend, Reply, TestApp, fixtures};

fn shop(call: &Call) -> Reply {
    match (call.method.as_str(), call.path.as_str()) {
        ("POST", "/auth/login") => {
            if call.body["password"] == "hunter22" {
                Reply::ok(fixtures::grant())
            } else {
                Reply::error(StatusCode::UNAUTHORIZED, "Bad credentials")
            }
        }
        ("POST", "/cart/attach") => Reply::ok(fixtures::cart(&[(1, 1)])),
        ("POST", "/cart/items") => Reply::ok(fixtures::cart(&[(1, 2)])),
        ("GET", "/cart") => Reply::ok(fixtures::cart(&[(1, 2)])),
        _ => Reply::not_found(),
    }
}

#[tokio::test]
async fn test_guest_cart_add_returns_notice() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .post(app.url("/api/cart/items"))
        .json(&json!({ "product_id": 101, "quantity": 2 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["item_count"], 2);
    assert_eq!(body["notices"][0]["message"], "Added to cart");

    let call = backend.find("POST", "/cart/items").unwrap();
    assert!(call.header("authorization").is_none());
    assert!(call.header("x-cart-session").is_some());
}

#[tokio::test]
async fn test_zero_quantity_rejected() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .post(app.url("/api/cart/items"))
        .json(&json!({ "product_id": 101, "quantity": 0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!backend.called("POST", "/cart/items"));
}

#[tokio::test]
async fn test_login_attaches_guest_cart_and_hides_token() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    // Guest activity first, so the cart session is known
    app.client.get(app.url("/api/cart")).send().await.unwrap();
    let guest_session = backend
        .find("GET", "/cart")
        .and_then(|c| c.header("x-cart-session").map(str::to_string))
        .unwrap();

    let response = app.login().await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(!text.contains(fixtures::TOKEN));

    let attach = backend.find("POST", "/cart/attach").unwrap();
    assert_eq!(attach.body["session_id"], guest_session.as_str());
    assert_eq!(
        attach.header("authorization"),
        Some(format!("Bearer {}", fixtures::TOKEN).as_str())
    );

    let session: Value = app
        .client
        .get(app.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["user"]["email"], "ana@example.com");
    assert!(session.get("token").is_none());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "ana@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_logout_clears_user() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;
    app.login().await;

    let response = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session: Value = app
        .client
        .get(app.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session["user"].is_null());

    let response = app
        .client
        .get(app.url("/api/addresses"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oauth_login_redirects_to_provider() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .get(app.url("/auth/oauth/google/login"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("client_id=google-client"));
    assert!(location.contains("state="));

    // Not configured
    let response = app
        .client
        .get(app.url("/auth/oauth/facebook/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_callback_with_forged_state_redirects_to_login() {
    let backend = FakeBackend::start(shop).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .get(app.url("/auth/oauth/google/callback?code=abc&state=forged"))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers()["location"],
        "/auth/login?error=invalid_state"
    );
    assert!(!backend.called("POST", "/auth/oauth/google"));
}

/// Guest cart with lines 1 (two units) and 2 (one unit).
fn cart_lines(call: &Call) -> Reply {
    match (call.method.as_str(), call.path.as_str()) {
        ("GET", "/cart") => Reply::ok(fixtures::cart(&[(1, 2), (2, 1)])),
        ("PATCH", "/cart/items/1") => {
            let quantity = u32::try_from(call.body["quantity"].as_u64().unwrap()).unwrap();
            Reply::ok(fixtures::cart(&[(1, quantity), (2, 1)]))
        }
        ("DELETE", "/cart/items/2") => Reply::ok(fixtures::cart(&[(1, 3)])),
        ("DELETE", "/cart/items/1" | "/cart") => Reply::ok(fixtures::cart(&[])),
        _ => Reply::not_found(),
    }
}

async fn post_json(app: &TestApp, path: &str) -> Value {
    let response = app.client.post(app.url(path)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_increment_and_decrement_to_zero() {
    let backend = FakeBackend::start(cart_lines).await;
    let app = TestApp::spawn(&backend.url).await;

    let body = post_json(&app, "/api/cart/items/1/increment").await;
    assert_eq!(body["item_count"], 4);
    let patch = backend.find("PATCH", "/cart/items/1").unwrap();
    assert_eq!(patch.body, json!({ "quantity": 3 }));

    // Line 2 has a single unit, so decrementing removes it
    let body = post_json(&app, "/api/cart/items/2/decrement").await;
    assert!(backend.called("DELETE", "/cart/items/2"));
    assert!(!backend.called("PATCH", "/cart/items/2"));
    assert_eq!(body["notices"][0]["message"], "Removed from cart");
    let items = body["cart"]["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(body["item_count"], 3);
}

#[tokio::test]
async fn test_decrement_unknown_line_is_not_found() {
    let backend = FakeBackend::start(cart_lines).await;
    let app = TestApp::spawn(&backend.url).await;

    let response = app
        .client
        .post(app.url("/api/cart/items/99/decrement"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!backend.called("DELETE", "/cart/items/99"));
}

#[tokio::test]
async fn test_remove_and_clear_replace_cart() {
    let backend = FakeBackend::start(cart_lines).await;
    let app = TestApp::spawn(&backend.url).await;
    app.client.get(app.url("/api/cart")).send().await.unwrap();

    let response = app
        .client
        .delete(app.url("/api/cart/items/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(backend.called("DELETE", "/cart/items/1"));
    assert_eq!(body["cart"]["cart"]["items"], json!([]));
    assert_eq!(body["item_count"], 0);

    let response = app.client.delete(app.url("/api/cart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(backend.called("DELETE", "/cart"));
    assert_eq!(body["item_count"], 0);
    assert_eq!(body["notices"][0]["level"], "info");
    assert_eq!(body["notices"][0]["message"], "Your cart is now empty");
}

/// Requires `STOREFRONT_BASE_URL` pointing at a running deployment.
#[tokio::test]
#[ignore = "Requires a running storefront"]
async fn test_live_health() {
    let base = std::env::var("STOREFRONT_BASE_URL").unwrap();
    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
}

/// Requires `STOREFRONT_BASE_URL` pointing at a running deployment.
#[tokio::test]
#[ignore = "Requires a running storefront"]
async fn test_live_session_is_anonymous() {
    let base = std::env::var("STOREFRONT_BASE_URL").unwrap();
    let body: Value = reqwest::get(format!("{base}/api/session"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["user"].is_null());
}
