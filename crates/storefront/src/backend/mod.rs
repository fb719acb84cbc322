//! Commerce backend REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local persistence, direct API calls
//! - Plain JSON over HTTPS via `reqwest`
//! - Catalog responses (products, facets, banners) are cached with `moka`
//!   for 5 minutes; user-specific data is never cached
//!
//! Every call takes a [`Caller`]: the session's bearer token (if signed in)
//! and the guest cart session id sent as `X-Cart-Session`.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrina_storefront::backend::{BackendClient, Caller};
//!
//! let client = BackendClient::new(&config.backend)?;
//! let caller = Caller::guest("2f0c9f0e-...");
//! let cart = client.get_cart(&caller).await?;
//! ```

mod account;
mod cache;
mod cart;
mod catalog;
mod client;
mod orders;

pub use account::AuthGrant;
pub use client::{BackendClient, CART_SESSION_HEADER, Caller};
pub use orders::{ConfirmRequest, ConfirmResponse};

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (DNS, connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request (validation or state conflict).
    #[error("{message}")]
    Rejected {
        /// Status returned by the backend.
        status: StatusCode,
        /// User-facing message from the error body.
        message: String,
    },

    /// The backend requires (re-)authentication.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A request path could not be joined onto the base URL.
    #[error("Invalid backend path: {0}")]
    InvalidPath(String),
}

impl BackendError {
    /// Whether the request never got an answer from the backend.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized => "Please sign in to continue".to_string(),
            Self::NotFound(_) => "The requested item no longer exists".to_string(),
            Self::RateLimited(_) => "Too many requests, please try again shortly".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::InvalidPath(_) => {
                "The store is temporarily unavailable, please try again".to_string()
            }
        }
    }
}

/// Error body shapes returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Accepts `{"message": ...}`, `{"error": ...}` or plain text; anything
/// else falls back to the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.trim().is_empty()
    {
        return message;
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') && !text.starts_with('<') {
        return text.chars().take(200).collect();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_message_field() {
        let message = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Cart is empty"}"#,
        );
        assert_eq!(message, "Cart is empty");
    }

    #[test]
    fn test_error_message_from_error_field() {
        let message = error_message(StatusCode::CONFLICT, r#"{"error": "Order already confirmed"}"#);
        assert_eq!(message, "Order already confirmed");
    }

    #[test]
    fn test_error_message_plain_text_and_fallback() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "quantity must be positive"),
            "quantity must be positive"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "<html>oops</html>"),
            "Bad Request"
        );
        assert_eq!(error_message(StatusCode::CONFLICT, "{}"), "Conflict");
    }

    #[test]
    fn test_rejected_display_is_backend_message() {
        let err = BackendError::Rejected {
            status: StatusCode::CONFLICT,
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "Out of stock");
        assert_eq!(err.user_message(), "Out of stock");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = BackendError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
