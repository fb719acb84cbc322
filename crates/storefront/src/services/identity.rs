//! OAuth identity providers.
//!
//! The storefront runs the authorization-code flow itself, then hands the
//! provider's access token to the backend (`POST /auth/oauth/{provider}`),
//! which issues our own bearer token.

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::{OAuthClientConfig, StorefrontConfig};

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    /// Path segment and backend provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }

    const fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
        }
    }

    const fn token_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Facebook => "https://graph.facebook.com/v19.0/oauth/access_token",
        }
    }

    const fn scope(self) -> &'static str {
        match self {
            Self::Google => "openid email profile",
            Self::Facebook => "email public_profile",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            other => Err(IdentityError::UnknownProvider(other.to_string())),
        }
    }
}

/// Errors from the OAuth flow.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Unknown identity provider: {0}")]
    UnknownProvider(String),

    #[error("Identity provider {0} is not configured")]
    NotConfigured(OAuthProvider),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the authorization code: {0}")]
    Exchange(String),
}

/// Tokens returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// OAuth client for the configured providers.
#[derive(Clone)]
pub struct IdentityService {
    http: reqwest::Client,
    base_url: String,
    google: OAuthClientConfig,
    facebook: Option<OAuthClientConfig>,
}

impl IdentityService {
    /// Create the service from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            google: config.oauth.google.clone(),
            facebook: config.oauth.facebook.clone(),
        }
    }

    fn client(&self, provider: OAuthProvider) -> Result<&OAuthClientConfig, IdentityError> {
        match provider {
            OAuthProvider::Google => Ok(&self.google),
            OAuthProvider::Facebook => self
                .facebook
                .as_ref()
                .ok_or(IdentityError::NotConfigured(provider)),
        }
    }

    /// Providers with credentials configured.
    #[must_use]
    pub fn providers(&self) -> Vec<OAuthProvider> {
        [OAuthProvider::Google, OAuthProvider::Facebook]
            .into_iter()
            .filter(|p| self.client(*p).is_ok())
            .collect()
    }

    /// Callback URL registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!("{}/auth/oauth/{provider}/callback", self.base_url)
    }

    /// Provider authorization URL carrying the CSRF `state`.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` for an optional provider without credentials.
    pub fn authorization_url(
        &self,
        provider: OAuthProvider,
        state: &str,
    ) -> Result<String, IdentityError> {
        let client = self.client(provider)?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            provider.authorize_endpoint(),
            urlencoding::encode(&client.client_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(provider.scope()),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for provider tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
    ) -> Result<ProviderToken, IdentityError> {
        let client = self.client(provider)?;
        let redirect_uri = self.redirect_uri(provider);
        let response = self
            .http
            .post(provider.token_endpoint())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, provider = %provider, "OAuth code exchange failed");
            return Err(IdentityError::Exchange(body.chars().take(200).collect()));
        }

        Ok(response.json().await?)
    }
}

/// Generate a random CSRF state value.
#[must_use]
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn service(config: &StorefrontConfig) -> IdentityService {
        IdentityService::new(config, reqwest::Client::new())
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert_eq!(
            "facebook".parse::<OAuthProvider>().unwrap(),
            OAuthProvider::Facebook
        );
        assert!(matches!(
            "github".parse::<OAuthProvider>(),
            Err(IdentityError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_authorization_url_contains_state_and_callback() {
        let config = test_config("http://backend.test");
        let url = service(&config)
            .authorization_url(OAuthProvider::Google, "abc123")
            .unwrap();
        assert!(url.starts_with("https://accounts.google.com/"));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Foauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_unconfigured_facebook() {
        let config = test_config("http://backend.test");
        assert!(matches!(
            service(&config).authorization_url(OAuthProvider::Facebook, "s"),
            Err(IdentityError::NotConfigured(OAuthProvider::Facebook))
        ));
        assert_eq!(service(&config).providers(), vec![OAuthProvider::Google]);
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, generate_state());
    }
}
