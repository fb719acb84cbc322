//! Order endpoints: creation from cart, incremental patches, confirmation
//! and history.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use vitrina_core::{AddressId, BillingProfileId, Order, OrderId, OrderPage, PaymentMethod};

use super::{BackendClient, BackendError, Caller};

/// Callback URLs sent with the confirm call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmRequest {
    pub success_url: String,
    pub failure_url: String,
    pub pending_url: String,
    pub webhook_url: String,
}

/// Response to the confirm call.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmResponse {
    pub order: Order,
    /// External payment processor page, when the method requires one.
    #[serde(default)]
    pub payment_url: Option<String>,
}

impl BackendClient {
    /// Create an order from the caller's server-side cart.
    ///
    /// No body is sent; the backend derives the lines from the cart.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the cart is empty or not purchasable.
    #[instrument(skip(self, caller))]
    pub async fn create_order(&self, caller: &Caller) -> Result<Order, BackendError> {
        let request = self.request(Method::POST, "orders", caller)?;
        self.execute(request).await
    }

    /// Associate a shipping address with the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, caller))]
    pub async fn set_order_shipping_address(
        &self,
        caller: &Caller,
        order_id: OrderId,
        address_id: AddressId,
    ) -> Result<Order, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("orders/{order_id}/shipping-address"),
                caller,
            )?
            .json(&json!({ "address_id": address_id }));
        self.execute(request).await
    }

    /// Associate a billing profile with the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the profile.
    #[instrument(skip(self, caller))]
    pub async fn set_order_billing_profile(
        &self,
        caller: &Caller,
        order_id: OrderId,
        billing_profile_id: BillingProfileId,
    ) -> Result<Order, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("orders/{order_id}/billing-profile"),
                caller,
            )?
            .json(&json!({ "billing_profile_id": billing_profile_id }));
        self.execute(request).await
    }

    /// Set the order's payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the method.
    #[instrument(skip(self, caller))]
    pub async fn set_order_payment_method(
        &self,
        caller: &Caller,
        order_id: OrderId,
        method: PaymentMethod,
    ) -> Result<Order, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("orders/{order_id}/payment-method"),
                caller,
            )?
            .json(&json!({ "payment_method": method }));
        self.execute(request).await
    }

    /// Freeze the order and start the payment.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the backend refuses to confirm (missing data,
    /// stock changes, already confirmed).
    #[instrument(skip(self, caller, callbacks))]
    pub async fn confirm_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
        callbacks: &ConfirmRequest,
    ) -> Result<ConfirmResponse, BackendError> {
        let request = self
            .request(Method::POST, &format!("orders/{order_id}/confirm"), caller)?
            .json(callbacks);
        self.execute(request).await
    }

    /// One page of the user's order history (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn list_orders(&self, caller: &Caller, page: u32) -> Result<OrderPage, BackendError> {
        let request = self
            .request(Method::GET, "orders", caller)?
            .query(&[("page", page.max(1))]);
        self.execute(request).await
    }

    /// Fetch an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist for this caller.
    #[instrument(skip(self, caller))]
    pub async fn get_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order, BackendError> {
        let request = self.request(Method::GET, &format!("orders/{order_id}"), caller)?;
        self.execute(request).await
    }

    /// Fetch an order by its human-readable number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no order has that number.
    #[instrument(skip(self, caller))]
    pub async fn get_order_by_number(
        &self,
        caller: &Caller,
        number: &str,
    ) -> Result<Order, BackendError> {
        let request = self.request(Method::GET, &format!("orders/by-number/{number}"), caller)?;
        self.execute(request).await
    }
}
