//! Session-related types.
//!
//! The session is stored server-side (the cookie only carries a signed id),
//! so the backend token can live here without ever reaching the browser.

/// Session keys for authentication and store data.
pub mod keys {
    /// Key for the signed-in [`vitrina_core::SessionUser`].
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the backend bearer token.
    pub const BACKEND_TOKEN: &str = "backend_token";

    /// Key for the per-session store key (doubles as the guest cart session id).
    pub const STORE_KEY: &str = "store_key";

    /// Key for the OAuth CSRF state.
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the provider the OAuth state was issued for.
    pub const OAUTH_PROVIDER: &str = "oauth_provider";
}
