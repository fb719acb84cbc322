//! Cart endpoints.
//!
//! Every mutation returns the full updated cart; callers replace their
//! local copy wholesale.

use reqwest::Method;
use serde_json::json;
use tracing::instrument;
use vitrina_core::{Cart, CartItemId, NewCartItem};

use super::{BackendClient, BackendError, Caller};

impl BackendClient {
    /// Fetch the caller's cart (guest or authenticated).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn get_cart(&self, caller: &Caller) -> Result<Cart, BackendError> {
        let request = self.request(Method::GET, "cart", caller)?;
        self.execute(request).await
    }

    /// Add a product (or one of its variants) to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it
    /// (e.g. out of stock).
    #[instrument(skip(self, caller))]
    pub async fn add_cart_item(
        &self,
        caller: &Caller,
        item: &NewCartItem,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::POST, "cart/items", caller)?.json(item);
        self.execute(request).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, caller))]
    pub async fn update_cart_item(
        &self,
        caller: &Caller,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("cart/items/{item_id}"), caller)?
            .json(&json!({ "quantity": quantity }));
        self.execute(request).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn remove_cart_item(
        &self,
        caller: &Caller,
        item_id: CartItemId,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::DELETE, &format!("cart/items/{item_id}"), caller)?;
        self.execute(request).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn clear_cart(&self, caller: &Caller) -> Result<Cart, BackendError> {
        let request = self.request(Method::DELETE, "cart", caller)?;
        self.execute(request).await
    }

    /// Merge the guest cart identified by `guest_session` into the signed-in
    /// user's cart. The backend makes this idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller has no token.
    #[instrument(skip(self, caller, guest_session))]
    pub async fn attach_cart(
        &self,
        caller: &Caller,
        guest_session: &str,
    ) -> Result<Cart, BackendError> {
        if !caller.is_authenticated() {
            return Err(BackendError::Unauthorized);
        }
        let request = self
            .request(Method::POST, "cart/attach", caller)?
            .json(&json!({ "session_id": guest_session }));
        self.execute(request).await
    }
}
