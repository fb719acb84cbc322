//! Integration tests for the Vitrina storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (fake backend, no network)
//! cargo test -p vitrina-integration-tests
//!
//! # Tests against a live deployment
//! STOREFRONT_BASE_URL=https://shop.example cargo test -p vitrina-integration-tests -- --ignored
//! ```
//!
//! # Harness
//!
//! - [`FakeBackend`] - axum server on `127.0.0.1:0` that records every call
//!   and answers through a per-test responder
//! - [`TestApp`] - the real storefront router bound to `127.0.0.1:0`,
//!   driven by a cookie-keeping `reqwest` client
//! - [`fixtures`] - JSON bodies in the backend's wire format

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use vitrina_storefront::{
    app,
    config::{
        BackendConfig, CheckoutConfig, OAuthClientConfig, OAuthConfig, StorefrontConfig,
        parse_base_url,
    },
    state::AppState,
};

/// Path prefix the fake backend is mounted under.
const API_PREFIX: &str = "/v1";

/// A request received by the fake backend.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    /// Path relative to the API base, e.g. `/orders/42/confirm`.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// JSON body, or `Null` when empty / not JSON.
    pub body: Value,
}

impl Call {
    /// Whether this call is `method path`.
    #[must_use]
    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method.as_str() == method && self.path == path
    }

    /// A header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// What the fake backend answers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// 200 with a JSON body.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Any status with a `{"message": ...}` body.
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    /// 404, the default for unscripted calls.
    #[must_use]
    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "Not found")
    }
}

type Responder = dyn Fn(&Call) -> Reply + Send + Sync;

struct FakeShared {
    calls: Mutex<Vec<Call>>,
    responder: Box<Responder>,
}

/// In-process stand-in for the commerce backend.
pub struct FakeBackend {
    /// Base URL to configure the storefront with.
    pub url: String,
    shared: Arc<FakeShared>,
}

impl FakeBackend {
    /// Start a fake backend answering through `responder`.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Call) -> Reply + Send + Sync + 'static,
    {
        let shared = Arc::new(FakeShared {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        });

        let router = Router::new()
            .fallback(record)
            .with_state(Arc::clone(&shared));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{addr}{API_PREFIX}"),
            shared,
        }
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// The first call matching `method path`.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<Call> {
        self.calls().into_iter().find(|c| c.is(method, path))
    }

    /// Whether `method path` was called.
    #[must_use]
    pub fn called(&self, method: &str, path: &str) -> bool {
        self.find(method, path).is_some()
    }
}

async fn record(
    State(shared): State<Arc<FakeShared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let call = Call {
        method,
        path: uri
            .path()
            .strip_prefix(API_PREFIX)
            .unwrap_or(uri.path())
            .to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    let reply = (shared.responder)(&call);
    shared.calls.lock().unwrap().push(call);
    (reply.status, Json(reply.body)).into_response()
}

/// Storefront configuration for tests.
#[must_use]
pub fn test_config(backend_url: &str, base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: base_url.to_string(),
        session_secret: SecretString::from("k".repeat(64)),
        backend: BackendConfig {
            api_url: parse_base_url(backend_url).unwrap(),
            timeout: Duration::from_secs(5),
        },
        checkout: CheckoutConfig {
            webhook_url: format!("{backend_url}/payments/webhook"),
            transfer_discount_percent: 10,
        },
        oauth: OAuthConfig {
            google: OAuthClientConfig {
                client_id: "google-client".to_string(),
                client_secret: SecretString::from("google-client-secret"),
            },
            facebook: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront and a browser-like client for it.
pub struct TestApp {
    pub url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Start the storefront against `backend_url`.
    pub async fn spawn(backend_url: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let url = format!("http://{addr}");

        let state = AppState::new(test_config(backend_url, &url)).unwrap();
        let router = app::router(state);
        tokio::spawn(async move {
            app::serve(listener, router, std::future::pending())
                .await
                .unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self { url, client }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Sign in with the fake credentials the [`fixtures::grant`] responder expects.
    pub async fn login(&self) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": "ana@example.com", "password": "hunter22" }))
            .send()
            .await
            .unwrap()
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{API_PREFIX}")
}

/// JSON bodies in the backend's wire format.
pub mod fixtures {
    use serde_json::{Value, json};

    /// Token used by [`grant`].
    pub const TOKEN: &str = "tok_test_123";

    /// A cart with `(item_id, quantity)` lines at 1000.00 each.
    #[must_use]
    pub fn cart(lines: &[(i64, u32)]) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|(id, quantity)| {
                json!({
                    "id": id,
                    "product_id": 100 + id,
                    "name": format!("Product {id}"),
                    "quantity": quantity,
                    "unit_price": { "amount": "1000.00", "currency": "ARS" },
                })
            })
            .collect();
        json!({ "id": 1, "session_id": null, "items": items, "totals": null })
    }

    /// An order, optionally with a payment status.
    #[must_use]
    pub fn order(id: i64, number: &str, payment_status: Option<&str>) -> Value {
        let payment = payment_status.map(|status| json!({ "method": "CARD", "status": status }));
        json!({
            "id": id,
            "number": number,
            "status": "pending",
            "payment": payment,
            "items": [],
        })
    }

    /// An address of `kind` (`"SHIPPING"` or `"BILLING"`).
    #[must_use]
    pub fn address(id: i64, kind: &str) -> Value {
        json!({
            "id": id,
            "type": kind,
            "recipient": "Ana Pérez",
            "street": "Av. Corrientes",
            "number": "1234",
            "city": "CABA",
            "province": "Buenos Aires",
            "postal_code": "C1043",
            "country": "AR",
        })
    }

    /// Input for creating a shipping address.
    #[must_use]
    pub fn new_shipping_address() -> Value {
        let mut value = address(0, "SHIPPING");
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
        }
        value
    }

    /// A billing profile linked to `address_id`.
    #[must_use]
    pub fn billing_profile(id: i64, address_id: i64) -> Value {
        json!({
            "id": id,
            "document_type": "CUIT",
            "document_number": "20123456789",
            "tax_condition": "final_consumer",
            "address_id": address_id,
        })
    }

    /// A login grant for user 7.
    #[must_use]
    pub fn grant() -> Value {
        json!({
            "token": TOKEN,
            "user": {
                "id": 7,
                "email": "ana@example.com",
                "name": "Ana",
                "roles": ["customer"],
                "email_verified": true,
            },
        })
    }
}
