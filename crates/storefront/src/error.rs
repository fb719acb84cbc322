//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as JSON: `{"error": "..."}`. A 401 additionally carries
//! `"login_url"` so the browser client can send the shopper to sign in.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// Where the browser should go to sign in.
pub const LOGIN_URL: &str = "/auth/login";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Confirmation attempted before every required selection was made.
    #[error("Select a {} before confirming", .0.join(", "))]
    CheckoutIncomplete(Vec<&'static str>),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The login affordance returned for unauthenticated requests.
    #[must_use]
    pub fn sign_in_required() -> Self {
        Self::Unauthorized("Please sign in to continue".to_string())
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => backend_status(err),
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::EmptyCart | Self::CheckoutIncomplete(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details are never exposed.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Backend(err) => match err {
                BackendError::Http(_) => "Backend unavailable".to_string(),
                BackendError::Rejected { status, .. } if status.is_server_error() => {
                    "Backend unavailable".to_string()
                }
                _ => err.user_message(),
            },
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::BadRequest(message) => message.clone(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::EmptyCart | Self::CheckoutIncomplete(_) => self.to_string(),
            Self::RateLimited => "Too many requests, please try again shortly".to_string(),
        }
    }

    /// Whether this error is our fault (or the backend's) rather than the client's.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(err) => match err {
                BackendError::Http(_) | BackendError::Parse(_) => true,
                BackendError::Rejected { status, .. } => status.is_server_error(),
                _ => false,
            },
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }
}

/// Map a backend failure onto the status returned to the browser.
fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        BackendError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        BackendError::Rejected { status, .. } if status.is_client_error() => *status,
        BackendError::Rejected { .. } | BackendError::Http(_) | BackendError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();

        let body = match &self {
            _ if status == StatusCode::UNAUTHORIZED => {
                json!({ "error": message, "login_url": LOGIN_URL })
            }
            Self::CheckoutIncomplete(missing) => json!({ "error": message, "missing": missing }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::CheckoutIncomplete(vec!["shipping address", "billing profile"]);
        assert_eq!(
            err.to_string(),
            "Select a shipping address, billing profile before confirming"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::EmptyCart.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Backend(BackendError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_rejected_keeps_client_status_and_message() {
        let err = AppError::Backend(BackendError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Postal code is invalid".to_string(),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.public_message(), "Postal code is invalid");

        let err = AppError::Backend(BackendError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "stack trace here".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "Backend unavailable");
    }

    #[tokio::test]
    async fn test_unauthorized_carries_login_url() {
        let (status, body) = body_json(AppError::Backend(BackendError::Unauthorized)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["login_url"], LOGIN_URL);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_json(AppError::Internal("db password=hunter2".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_checkout_incomplete_lists_missing() {
        let (status, body) = body_json(AppError::CheckoutIncomplete(vec!["billing profile"])).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["missing"][0], "billing profile");
    }
}
