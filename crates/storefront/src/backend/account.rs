//! Identity, account, address and billing-profile endpoints.

use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;
use vitrina_core::{
    AccountPatch, Address, AddressId, AddressKind, AddressPatch, BillingProfile,
    BillingProfileId, BillingProfilePatch, Email, NewAddress, NewBillingProfile, SessionUser,
};

use super::{BackendClient, BackendError, Caller};

/// Token and identity issued by the backend after a successful login.
#[derive(Debug, Deserialize)]
pub struct AuthGrant {
    /// Backend bearer token. Stays server-side.
    pub token: SecretString,
    /// The authenticated user.
    pub user: SessionUser,
}

impl BackendClient {
    // =========================================================================
    // Identity
    // =========================================================================

    /// Exchange email and password for a backend token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for wrong credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthGrant, BackendError> {
        let request = self
            .request(Method::POST, "auth/login", &Caller::default())?
            .json(&json!({ "email": email, "password": password }));
        self.execute(request).await
    }

    /// Exchange an identity-provider access token for a backend token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not accept the provider token.
    #[instrument(skip(self, access_token, id_token))]
    pub async fn oauth_login(
        &self,
        provider: &str,
        access_token: &str,
        id_token: Option<&str>,
    ) -> Result<AuthGrant, BackendError> {
        let path = format!("auth/oauth/{provider}");
        let request = self
            .request(Method::POST, &path, &Caller::default())?
            .json(&json!({ "access_token": access_token, "id_token": id_token }));
        self.execute(request).await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Fetch the signed-in user's account.
    ///
    /// The shape is passed through untouched; the storefront does not model
    /// every profile field.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is missing or expired.
    #[instrument(skip(self, caller))]
    pub async fn get_account(&self, caller: &Caller) -> Result<Value, BackendError> {
        let request = self.request(Method::GET, "me", caller)?;
        self.execute(request).await
    }

    /// Update editable account fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, caller))]
    pub async fn update_account(
        &self,
        caller: &Caller,
        patch: &AccountPatch,
    ) -> Result<Value, BackendError> {
        let request = self.request(Method::PATCH, "me", caller)?.json(patch);
        self.execute(request).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// List the user's addresses, optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn list_addresses(
        &self,
        caller: &Caller,
        kind: Option<AddressKind>,
    ) -> Result<Vec<Address>, BackendError> {
        let mut request = self.request(Method::GET, "addresses", caller)?;
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }
        self.execute(request).await
    }

    /// Create an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, caller, address))]
    pub async fn create_address(
        &self,
        caller: &Caller,
        address: &NewAddress,
    ) -> Result<Address, BackendError> {
        let request = self.request(Method::POST, "addresses", caller)?.json(address);
        self.execute(request).await
    }

    /// Update an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, caller, patch))]
    pub async fn update_address(
        &self,
        caller: &Caller,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Address, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("addresses/{id}"), caller)?
            .json(patch);
        self.execute(request).await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn delete_address(&self, caller: &Caller, id: AddressId) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("addresses/{id}"), caller)?;
        self.execute_empty(request).await
    }

    // =========================================================================
    // Billing profiles
    // =========================================================================

    /// List the user's billing profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn list_billing_profiles(
        &self,
        caller: &Caller,
    ) -> Result<Vec<BillingProfile>, BackendError> {
        let request = self.request(Method::GET, "billing-profiles", caller)?;
        self.execute(request).await
    }

    /// Create a billing profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the profile (e.g. invalid CUIT).
    #[instrument(skip(self, caller, profile))]
    pub async fn create_billing_profile(
        &self,
        caller: &Caller,
        profile: &NewBillingProfile,
    ) -> Result<BillingProfile, BackendError> {
        let request = self
            .request(Method::POST, "billing-profiles", caller)?
            .json(profile);
        self.execute(request).await
    }

    /// Update a billing profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, caller, patch))]
    pub async fn update_billing_profile(
        &self,
        caller: &Caller,
        id: BillingProfileId,
        patch: &BillingProfilePatch,
    ) -> Result<BillingProfile, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("billing-profiles/{id}"), caller)?
            .json(patch);
        self.execute(request).await
    }

    /// Delete a billing profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn delete_billing_profile(
        &self,
        caller: &Caller,
        id: BillingProfileId,
    ) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("billing-profiles/{id}"), caller)?;
        self.execute_empty(request).await
    }
}
