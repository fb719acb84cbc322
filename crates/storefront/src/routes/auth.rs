//! Authentication route handlers.
//!
//! - Credentials: `POST /auth/login`, `POST /auth/logout`
//! - OAuth: `GET /auth/oauth/{provider}/login` redirects to the provider,
//!   `GET /auth/oauth/{provider}/callback` finishes the flow
//!
//! Both paths end in [`establish_session`]: the session id is cycled, the
//! user and backend token are stored server-side and the guest cart is
//! attached to the account.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::{Email, SessionUser};

use crate::backend::{AuthGrant, BackendError};
use crate::error::{AppError, LOGIN_URL, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, SessionContext, sign_in, sign_out};
use crate::models::session_keys;
use crate::services::OAuthProvider;
use crate::services::identity::generate_state;
use crate::state::AppState;

/// Where the browser lands after an OAuth login.
const AFTER_LOGIN_URL: &str = "/";

/// The signed-in user, if any. Never carries the backend token.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: Option<SessionUser>,
}

/// Credentials login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// What the login page needs to render.
#[derive(Debug, Serialize)]
pub struct LoginOptions {
    pub user: Option<SessionUser>,
    pub providers: Vec<&'static str>,
    pub error: Option<String>,
}

/// Query parameters on the login page (set by failed OAuth callbacks).
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Query parameters from the provider's OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Store the grant in the session and merge the guest cart.
///
/// A failed cart merge is logged and does not fail the login.
async fn establish_session(
    state: &AppState,
    session: Session,
    grant: &AuthGrant,
) -> Result<SessionUser> {
    sign_in(&session, grant).await?;
    let ctx = SessionContext::load(session).await?;

    let cart = state.cart(&ctx).await;
    if let Err(e) = cart.attach(&ctx.store_key).await {
        tracing::warn!(error = %e, "Failed to attach guest cart after login");
    }

    set_sentry_user(&grant.user.id, Some(grant.user.email.as_str()));
    tracing::info!(user_id = %grant.user.id, "User signed in");
    Ok(grant.user.clone())
}

/// Login page data: configured providers and the last OAuth error.
///
/// # Route
///
/// `GET /auth/login`
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Json<LoginOptions> {
    Json(LoginOptions {
        user,
        providers: state
            .identity()
            .providers()
            .into_iter()
            .map(OAuthProvider::as_str)
            .collect(),
        error: query.error,
    })
}

/// Credentials login.
///
/// # Route
///
/// `POST /auth/login`
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(form): Json<LoginRequest>,
) -> Result<Json<SessionView>> {
    let email = Email::parse(&form.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if form.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let grant = match state.backend().login(&email, &form.password).await {
        Ok(grant) => grant,
        Err(BackendError::Unauthorized) => {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let user = establish_session(&state, ctx.session, &grant).await?;
    Ok(Json(SessionView { user: Some(user) }))
}

/// Logout: drops the session and its client store.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<SessionView>> {
    sign_out(&ctx.session).await?;
    state.stores().remove(&ctx.store_key).await;
    clear_sentry_user();
    Ok(Json(SessionView { user: None }))
}

/// Redirect to the login page with an error code.
fn login_error(code: &str) -> Response {
    Redirect::to(&format!("{LOGIN_URL}?error={code}")).into_response()
}

/// Start an OAuth login.
///
/// # Route
///
/// `GET /auth/oauth/{provider}/login`
pub async fn oauth_login(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Response> {
    let provider: OAuthProvider = provider
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown provider: {provider}")))?;

    let oauth_state = generate_state();
    let url = state
        .identity()
        .authorization_url(provider, &oauth_state)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await?;
    session
        .insert(session_keys::OAUTH_PROVIDER, provider.as_str())
        .await?;

    Ok(Redirect::to(&url).into_response())
}

/// Finish an OAuth login.
///
/// Failures redirect to the login page with an `error` code instead of
/// rendering JSON, since the browser arrives here by navigation.
///
/// # Route
///
/// `GET /auth/oauth/{provider}/callback`
#[instrument(skip_all, fields(provider = %provider))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Ok(provider) = provider.parse::<OAuthProvider>() else {
        return login_error("unknown_provider");
    };

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(%error, %description, "OAuth provider returned an error");
        return login_error("provider_denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return login_error("missing_code");
    };

    // One-time use: remove before comparing
    let stored_state = session
        .remove::<String>(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();
    let stored_provider = session
        .remove::<String>(session_keys::OAUTH_PROVIDER)
        .await
        .ok()
        .flatten();

    if query.state.is_none()
        || stored_state != query.state
        || stored_provider.as_deref() != Some(provider.as_str())
    {
        tracing::warn!("OAuth state mismatch");
        return login_error("invalid_state");
    }

    let token = match state.identity().exchange_code(provider, &code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OAuth code");
            return login_error("token_exchange");
        }
    };

    let grant = match state
        .backend()
        .oauth_login(
            provider.as_str(),
            &token.access_token,
            token.id_token.as_deref(),
        )
        .await
    {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!(error = %e, "Backend rejected OAuth login");
            return login_error("backend_rejected");
        }
    };

    match establish_session(&state, session, &grant).await {
        Ok(_) => Redirect::to(AFTER_LOGIN_URL).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to store OAuth session");
            login_error("session")
        }
    }
}

/// The current session's user.
///
/// # Route
///
/// `GET /api/session`
pub async fn current(OptionalAuth(user): OptionalAuth) -> Json<SessionView> {
    Json(SessionView { user })
}
