//! HTTP plumbing shared by every backend call.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use super::cache::CacheValue;
use super::{BackendError, error_message};
use crate::config::BackendConfig;

/// Header carrying the guest cart session identifier.
pub const CART_SESSION_HEADER: &str = "x-cart-session";

/// Who a backend call is made on behalf of.
///
/// Cheap to clone; the token stays wrapped in a `SecretString` so it never
/// shows up in `Debug` output or logs.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    token: Option<SecretString>,
    cart_session: Option<String>,
}

impl Caller {
    /// An anonymous caller with a guest cart session.
    #[must_use]
    pub fn guest(cart_session: impl Into<String>) -> Self {
        Self {
            token: None,
            cart_session: Some(cart_session.into()),
        }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// The bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// The guest cart session id, if any.
    #[must_use]
    pub fn cart_session(&self) -> Option<&str> {
        self.cart_session.as_deref()
    }

    /// Whether the caller is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Client for the commerce backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend init).
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vitrina-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// The underlying HTTP client (shared with the proxy routes).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// The backend base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub(super) fn cache(&self) -> &Cache<String, CacheValue> {
        &self.inner.cache
    }

    /// Resolve a backend-relative path (optionally with a query) to a full URL.
    ///
    /// Segments are appended to the base path one by one, so the result can
    /// never point at another host or climb above the base path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for `.`/`..` segments.
    pub fn url(&self, path: &str) -> Result<Url, BackendError> {
        let (path, query) = path
            .split_once('?')
            .map_or((path, None), |(p, q)| (p, Some(q)));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.iter().any(|s| *s == ".." || *s == ".") {
            return Err(BackendError::InvalidPath(path.to_string()));
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidPath(path.to_string()))?
            .pop_if_empty()
            .extend(&segments);
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Start a request with the caller's credentials attached.
    pub(super) fn request(
        &self,
        method: Method,
        path: &str,
        caller: &Caller,
    ) -> Result<RequestBuilder, BackendError> {
        let mut request = self.inner.http.request(method, self.url(path)?);
        if let Some(token) = caller.token() {
            request = request.bearer_auth(token);
        }
        if let Some(session) = caller.cart_session() {
            request = request.header(CART_SESSION_HEADER, session);
        }
        Ok(request)
    }

    /// Send a request and decode a JSON response body.
    pub(super) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.execute_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    pub(super) async fn execute_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.execute_raw(request).await.map(|_| ())
    }

    /// Send a request and return the body text of a successful response.
    async fn execute_raw(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(error_message(status, &body))),
            _ => {
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        body = %body.chars().take(500).collect::<String>(),
                        "Backend returned server error"
                    );
                } else {
                    tracing::debug!(status = %status, "Backend rejected request");
                }
                Err(BackendError::Rejected {
                    status,
                    message: error_message(status, &body),
                })
            }
        }
    }

    /// Check that the backend answers its health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let request = self.request(Method::GET, "health", &Caller::default())?;
        self.execute_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            api_url: parse_base_url("https://api.shop.test/v1").unwrap(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let client = client();
        assert_eq!(
            client.url("/orders/5/confirm").unwrap().as_str(),
            "https://api.shop.test/v1/orders/5/confirm"
        );
        assert_eq!(
            client.url("products?page=2").unwrap().as_str(),
            "https://api.shop.test/v1/products?page=2"
        );
    }

    #[test]
    fn test_url_rejects_dot_segments() {
        let client = client();
        assert!(matches!(
            client.url("orders/../admin"),
            Err(BackendError::InvalidPath(_))
        ));
        assert!(client.url("./cart").is_err());
    }

    #[test]
    fn test_url_cannot_switch_host() {
        let url = client().url("http://evil.test/steal").unwrap();
        assert_eq!(url.host_str(), Some("api.shop.test"));
        assert!(url.path().starts_with("/v1/"));
    }

    #[test]
    fn test_caller_debug_hides_token() {
        let caller = Caller::guest("abc").with_token(SecretString::from("tok_live_123"));
        let debug = format!("{caller:?}");
        assert!(!debug.contains("tok_live_123"));
        assert_eq!(caller.token(), Some("tok_live_123"));
        assert_eq!(caller.cart_session(), Some("abc"));
        assert!(caller.is_authenticated());
    }
}
