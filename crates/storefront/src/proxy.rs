//! Pass-through proxy to the commerce backend.
//!
//! - `ANY /api/proxy/{*path}` forwards with whatever credentials the session has.
//! - `ANY /api/auth-proxy/{*path}` requires a signed-in session and turns an
//!   upstream 401 into the login affordance.
//!
//! Method, query string and body are preserved. Hop-by-hop headers are
//! dropped in both directions, and upstream cookies are rewritten so the
//! browser accepts them on the storefront's own origin.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_LENGTH, COOKIE, HOST, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{instrument, warn};

use crate::backend::{CART_SESSION_HEADER, Caller};
use crate::error::AppError;
use crate::middleware::{SESSION_COOKIE_NAME, SessionContext};
use crate::state::AppState;

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Whether an upstream 401 should become the login affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Public,
    Authenticated,
}

/// `ANY /api/proxy/{*path}`
pub async fn public(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = ProxyRequest {
        path,
        query,
        method,
        headers,
        body,
    };
    forward(&state, &ctx.caller, request, Mode::Public).await
}

/// `ANY /api/auth-proxy/{*path}`
pub async fn authenticated(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if !ctx.caller.is_authenticated() {
        return Err(AppError::sign_in_required());
    }
    let request = ProxyRequest {
        path,
        query,
        method,
        headers,
        body,
    };
    forward(&state, &ctx.caller, request, Mode::Authenticated).await
}

struct ProxyRequest {
    path: String,
    query: Option<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
}

#[instrument(skip(state, caller, request), fields(method = %request.method, path = %request.path))]
async fn forward(
    state: &AppState,
    caller: &Caller,
    request: ProxyRequest,
    mode: Mode,
) -> Result<Response, AppError> {
    // A decoded '?' or '#' would change what the path means upstream
    if request.path.contains(['?', '#']) {
        return Err(AppError::BadRequest("Invalid proxy path".to_string()));
    }
    let mut url = state
        .backend()
        .url(&request.path)
        .map_err(|_| AppError::BadRequest("Invalid proxy path".to_string()))?;
    url.set_query(request.query.as_deref().filter(|q| !q.is_empty()));

    let mut upstream = state
        .backend()
        .http()
        .request(request.method, url)
        .headers(outbound_headers(&request.headers))
        .body(request.body);
    if let Some(token) = caller.token() {
        upstream = upstream.bearer_auth(token);
    }
    if let Some(cart_session) = caller.cart_session() {
        upstream = upstream.header(CART_SESSION_HEADER, cart_session);
    }

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(e) => return Ok(unavailable(&e)),
    };

    let status = response.status();
    if mode == Mode::Authenticated && status == StatusCode::UNAUTHORIZED {
        return Err(AppError::sign_in_required());
    }

    let headers = inbound_headers(response.headers(), state.config().is_secure());
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return Ok(unavailable(&e)),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// 502 for transport failures (DNS, connect, timeout, truncated body).
fn unavailable(err: &reqwest::Error) -> Response {
    warn!(error = %err, "Proxy request failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": "Backend unavailable", "detail": err.to_string() })),
    )
        .into_response()
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Browser headers to send upstream.
///
/// Credentials are replaced by the session's own, and the storefront
/// session cookie is never leaked to the backend.
fn outbound_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name)
            || name == HOST
            || name == CONTENT_LENGTH
            || name == AUTHORIZATION
            || name.as_str() == CART_SESSION_HEADER
        {
            continue;
        }
        if name == COOKIE {
            if let Some(value) = value
                .to_str()
                .ok()
                .and_then(strip_session_cookie)
                .and_then(|v| HeaderValue::from_str(&v).ok())
            {
                headers.append(COOKIE, value);
            }
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Upstream headers to return to the browser.
fn inbound_headers(upstream: &HeaderMap, secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || name == CONTENT_LENGTH {
            continue;
        }
        if name == SET_COOKIE {
            if let Some(value) = value
                .to_str()
                .ok()
                .map(|v| rewrite_set_cookie(v, secure))
                .and_then(|v| HeaderValue::from_str(&v).ok())
            {
                headers.append(SET_COOKIE, value);
            }
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Remove the storefront session cookie from a `Cookie` header value.
///
/// Returns `None` when nothing else is left.
fn strip_session_cookie(value: &str) -> Option<String> {
    let kept: Vec<&str> = value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next().map(str::trim) != Some(SESSION_COOKIE_NAME))
        .collect();
    (!kept.is_empty()).then(|| kept.join("; "))
}

/// Rewrite an upstream `Set-Cookie` so it applies to the storefront origin.
///
/// `Domain` is always dropped. On plain HTTP `Secure` is dropped too, and
/// `SameSite=None` (which requires `Secure`) becomes `Lax`.
pub fn rewrite_set_cookie(value: &str, secure: bool) -> String {
    let mut parts = value.split(';').map(str::trim);
    let mut rewritten = parts.next().unwrap_or_default().to_string();

    for attribute in parts.filter(|a| !a.is_empty()) {
        let name = attribute.split('=').next().unwrap_or_default().trim();
        if name.eq_ignore_ascii_case("domain") {
            continue;
        }
        if !secure && name.eq_ignore_ascii_case("secure") {
            continue;
        }
        rewritten.push_str("; ");
        if !secure && attribute.eq_ignore_ascii_case("samesite=none") {
            rewritten.push_str("SameSite=Lax");
        } else {
            rewritten.push_str(attribute);
        }
    }
    rewritten
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_set_cookie_drops_domain() {
        assert_eq!(
            rewrite_set_cookie("mp=1; Domain=.api.shop.test; Path=/; Secure; HttpOnly", true),
            "mp=1; Path=/; Secure; HttpOnly"
        );
    }

    #[test]
    fn test_rewrite_set_cookie_plain_http() {
        assert_eq!(
            rewrite_set_cookie("mp=1; domain=api.shop.test; secure; SameSite=None", false),
            "mp=1; SameSite=Lax"
        );
    }

    #[test]
    fn test_rewrite_set_cookie_keeps_expires_commas() {
        let value = "mp=1; Expires=Wed, 21 Oct 2026 07:28:00 GMT; Path=/";
        assert_eq!(rewrite_set_cookie(value, true), value);
    }

    #[test]
    fn test_strip_session_cookie() {
        assert_eq!(
            strip_session_cookie("a=1; vitrina_session=abc; b=2").as_deref(),
            Some("a=1; b=2")
        );
        assert_eq!(strip_session_cookie("vitrina_session=abc"), None);
    }

    #[test]
    fn test_outbound_headers_filtered() {
        let mut incoming = HeaderMap::new();
        incoming.insert(HOST, HeaderValue::from_static("shop.test"));
        incoming.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        incoming.insert("connection", HeaderValue::from_static("keep-alive"));
        incoming.insert(CART_SESSION_HEADER, HeaderValue::from_static("someone-else"));
        incoming.insert(COOKIE, HeaderValue::from_static("vitrina_session=x; mp=1"));
        incoming.insert("accept", HeaderValue::from_static("application/json"));

        let headers = outbound_headers(&incoming);
        assert!(headers.get(HOST).is_none());
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers.get("connection").is_none());
        assert!(headers.get(CART_SESSION_HEADER).is_none());
        assert_eq!(headers[COOKIE], "mp=1");
        assert_eq!(headers["accept"], "application/json");
    }

    #[test]
    fn test_inbound_headers_rewrite_cookies() {
        let mut upstream = HeaderMap::new();
        upstream.append(SET_COOKIE, HeaderValue::from_static("a=1; Domain=x.test"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("b=2; Secure"));
        upstream.insert("transfer-encoding", HeaderValue::from_static("chunked"));

        let headers = inbound_headers(&upstream, false);
        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert!(headers.get("transfer-encoding").is_none());
    }
}
