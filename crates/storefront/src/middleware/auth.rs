//! Session-backed extractors and sign-in helpers.
//!
//! Every request gets a [`SessionContext`]: the session handle, the key of
//! the session's client store (which doubles as the guest cart id) and the
//! [`Caller`] used for backend calls. The backend token never leaves the
//! server-side session.

use axum::{extract::FromRequestParts, http::request::Parts};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;
use uuid::Uuid;
use vitrina_core::SessionUser;

use crate::backend::{AuthGrant, Caller};
use crate::error::AppError;
use crate::models::session_keys;

/// Session state resolved for the current request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<CartView>> {
///     Ok(Json(state.cart(&ctx).await.fetch().await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session: Session,
    /// Key of the client store; also sent as the guest cart session.
    pub store_key: String,
    pub user: Option<SessionUser>,
    pub caller: Caller,
}

impl SessionContext {
    /// Resolve the context from a session, creating the store key on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: Session) -> Result<Self, AppError> {
        let store_key = match session.get::<String>(session_keys::STORE_KEY).await? {
            Some(key) => key,
            None => {
                let key = Uuid::new_v4().to_string();
                session.insert(session_keys::STORE_KEY, &key).await?;
                key
            }
        };

        let user: Option<SessionUser> = session.get(session_keys::CURRENT_USER).await?;
        let mut caller = Caller::guest(store_key.clone());
        // A token without a user is left over from a half-finished sign in
        if user.is_some()
            && let Some(token) = session.get::<String>(session_keys::BACKEND_TOKEN).await?
        {
            caller = caller.with_token(SecretString::from(token));
        }

        Ok(Self {
            session,
            store_key,
            user,
            caller,
        })
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;
        Self::load(session).await
    }
}

/// Extractor that requires a signed-in user.
///
/// Rejects with 401 and the login affordance otherwise.
pub struct RequireAuth {
    pub user: SessionUser,
    pub ctx: SessionContext,
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state).await?;
        match (ctx.user.clone(), ctx.caller.is_authenticated()) {
            (Some(user), true) => Ok(Self { user, ctx }),
            _ => Err(AppError::sign_in_required()),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; a broken session reads as signed out.
pub struct OptionalAuth(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<SessionUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store a backend grant in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
/// The store key survives, so the guest cart can still be attached.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    grant: &AuthGrant,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_USER, &grant.user)
        .await?;
    session
        .insert(session_keys::BACKEND_TOKEN, grant.token.expose_secret())
        .await
}

/// Drop everything the session holds (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use vitrina_core::{Email, UserId};

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn grant() -> AuthGrant {
        AuthGrant {
            token: SecretString::from("tok_123"),
            user: SessionUser {
                id: UserId::new(7),
                email: Email::parse("ana@example.com").unwrap(),
                name: Some("Ana".to_string()),
                roles: vec![],
                email_verified: true,
            },
        }
    }

    #[tokio::test]
    async fn test_guest_context_gets_stable_store_key() {
        let session = session();
        let first = SessionContext::load(session.clone()).await.unwrap();
        let second = SessionContext::load(session).await.unwrap();

        assert_eq!(first.store_key, second.store_key);
        assert_eq!(first.caller.cart_session(), Some(first.store_key.as_str()));
        assert!(!first.is_authenticated());
        assert!(first.caller.token().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_attaches_token_and_keeps_store_key() {
        let session = session();
        let guest = SessionContext::load(session.clone()).await.unwrap();

        sign_in(&session, &grant()).await.unwrap();
        let ctx = SessionContext::load(session.clone()).await.unwrap();

        assert_eq!(ctx.store_key, guest.store_key);
        assert_eq!(ctx.user.as_ref().map(|u| u.id), Some(UserId::new(7)));
        assert_eq!(ctx.caller.token(), Some("tok_123"));

        sign_out(&session).await.unwrap();
        let ctx = SessionContext::load(session).await.unwrap();
        assert!(ctx.user.is_none());
        assert_ne!(ctx.store_key, guest.store_key);
    }

    #[tokio::test]
    async fn test_token_without_user_is_ignored() {
        let session = session();
        session
            .insert(session_keys::BACKEND_TOKEN, "dangling")
            .await
            .unwrap();

        let ctx = SessionContext::load(session).await.unwrap();
        assert!(ctx.caller.token().is_none());
    }
}
