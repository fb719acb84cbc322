//! Checkout orchestration.
//!
//! Each step is independent: nothing rolls back and nothing retries. A
//! failed patch reverts the selection to the last applied id and becomes an
//! error notice; only a missing/expired sign-in aborts the request.

use serde::Serialize;
use tracing::{instrument, warn};
use vitrina_core::{
    AddressId, AddressKind, BillingProfileId, Cart, NewAddress, NewBillingProfile, OrderId,
    PaymentChoice,
};

use super::cart::settle;
use super::{Notice, WithNotices};
use crate::backend::{BackendClient, BackendError, Caller, ConfirmRequest};
use crate::checkout::{CheckoutAction, CheckoutState, Patch};
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::store::{Action, SharedStore, Store};

/// Checkout state as returned to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    #[serde(flatten)]
    pub state: CheckoutState,
    pub can_confirm: bool,
    pub missing: Vec<&'static str>,
    pub transfer_discount: Option<TransferDiscount>,
}

/// Informational banner for the bank transfer discount.
///
/// The percentage is advertised only; the backend computes the price.
#[derive(Debug, Clone, Serialize)]
pub struct TransferDiscount {
    pub percent: u8,
    pub message: String,
}

/// Where the browser goes after confirming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    /// Off to the payment processor.
    Redirect { url: String },
    /// Nothing to pay online (e.g. bank transfer): show the pending result.
    Pending { location: String },
}

/// Checkout operations for one session.
pub struct CheckoutService<'a> {
    backend: &'a BackendClient,
    config: &'a StorefrontConfig,
    store: SharedStore,
    caller: Caller,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a BackendClient,
        config: &'a StorefrontConfig,
        store: SharedStore,
        caller: Caller,
    ) -> Self {
        Self {
            backend,
            config,
            store,
            caller,
        }
    }

    /// Create an order from the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` without calling `POST /orders` when the cart has
    /// no lines, or the backend's rejection.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<CheckoutView, AppError> {
        let mut store = self.store.lock().await;

        // A stored empty cart may be stale; only trust a non-empty one.
        let has_items = store
            .state()
            .cart
            .cart
            .as_ref()
            .is_some_and(|cart| !cart.is_empty());
        if !has_items {
            let ticket = store.issue_ticket();
            let result = self.backend.get_cart(&self.caller).await;
            settle(&mut store, ticket, result)?;
        }
        if store.state().cart.cart.as_ref().is_none_or(Cart::is_empty) {
            return Err(AppError::EmptyCart);
        }

        let order = self.backend.create_order(&self.caller).await?;
        tracing::info!(order_id = %order.id, number = %order.number, "Checkout started");
        store.dispatch(Action::CheckoutCleared);
        store.dispatch(Action::Checkout(CheckoutAction::OrderStarted {
            order_id: order.id,
            number: Some(order.number),
        }));

        Ok(self.view(&store))
    }

    /// Load addresses and billing profiles for the order and run the
    /// readiness gate.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session's token is missing or expired.
    /// Other failures become notices.
    #[instrument(skip(self))]
    pub async fn load(&self, order_id: OrderId) -> Result<WithNotices<CheckoutView>, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);

        let (shipping, billing, profiles) = tokio::join!(
            self.backend
                .list_addresses(&self.caller, Some(AddressKind::Shipping)),
            self.backend
                .list_addresses(&self.caller, Some(AddressKind::Billing)),
            self.backend.list_billing_profiles(&self.caller),
        );

        let mut notices = Vec::new();
        let loaded = [
            shipping.map(CheckoutAction::ShippingAddressesLoaded),
            billing.map(CheckoutAction::BillingAddressesLoaded),
            profiles.map(CheckoutAction::BillingProfilesLoaded),
        ];
        for result in loaded {
            match result {
                Ok(action) => store.dispatch(Action::Checkout(action)),
                Err(e) => notices.push(Self::notice_for(e)?),
            }
        }

        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Select the shipping address and apply it to the order.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an address that is not one of the options.
    #[instrument(skip(self))]
    pub async fn select_shipping_address(
        &self,
        order_id: OrderId,
        address_id: AddressId,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);
        if let Some(checkout) = store.checkout()
            && checkout.shipping.options.is_some()
            && !checkout.shipping.offers(address_id)
        {
            return Err(AppError::BadRequest("Unknown shipping address".to_string()));
        }

        store.dispatch(Action::Checkout(CheckoutAction::ShippingAddressSelected(
            address_id,
        )));
        let mut notices = Vec::new();
        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Select the billing address (local) and apply the default linked profile.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an address that is not one of the options.
    #[instrument(skip(self))]
    pub async fn select_billing_address(
        &self,
        order_id: OrderId,
        address_id: AddressId,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);
        if let Some(checkout) = store.checkout()
            && checkout.billing_address.options.is_some()
            && !checkout.billing_address.offers(address_id)
        {
            return Err(AppError::BadRequest("Unknown billing address".to_string()));
        }

        store.dispatch(Action::Checkout(CheckoutAction::BillingAddressSelected(
            address_id,
        )));
        let mut notices = Vec::new();
        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Select the billing profile and apply it to the order.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a profile that is not one of the options.
    #[instrument(skip(self))]
    pub async fn select_billing_profile(
        &self,
        order_id: OrderId,
        profile_id: BillingProfileId,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);
        if let Some(checkout) = store.checkout()
            && checkout.billing_profiles_loaded()
            && !checkout.offers_billing_profile(profile_id)
        {
            return Err(AppError::BadRequest("Unknown billing profile".to_string()));
        }

        store.dispatch(Action::Checkout(CheckoutAction::BillingProfileSelected(
            profile_id,
        )));
        let mut notices = Vec::new();
        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Choose the payment option. Selected optimistically; reverted if the
    /// backend refuses it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session's token is missing or expired.
    #[instrument(skip(self))]
    pub async fn select_payment(
        &self,
        order_id: OrderId,
        choice: PaymentChoice,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);
        let previous = store.checkout().and_then(|c| c.payment);

        store.dispatch(Action::Checkout(CheckoutAction::PaymentSelected(choice)));
        let result = self
            .backend
            .set_order_payment_method(&self.caller, order_id, choice.method())
            .await;

        let mut notices = Vec::new();
        match result {
            Ok(_) => {
                store.dispatch(Action::Checkout(CheckoutAction::PaymentApplied(choice)));
                notices.push(Notice::success("Payment method updated"));
            }
            Err(e) => {
                store.dispatch(Action::Checkout(CheckoutAction::PaymentReverted(previous)));
                notices.push(Self::notice_for(e)?);
            }
        }
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Create an address from inside the checkout, refetch the list and
    /// pre-select the new address.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for missing fields, or the backend's rejection.
    #[instrument(skip(self, input))]
    pub async fn create_address(
        &self,
        order_id: OrderId,
        input: &NewAddress,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing fields: {}",
                missing.join(", ")
            )));
        }

        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);

        let created = self.backend.create_address(&self.caller, input).await?;
        let addresses = self
            .backend
            .list_addresses(&self.caller, Some(created.kind))
            .await?;
        let (loaded, selected) = match created.kind {
            AddressKind::Shipping => (
                CheckoutAction::ShippingAddressesLoaded(addresses),
                CheckoutAction::ShippingAddressSelected(created.id),
            ),
            AddressKind::Billing => (
                CheckoutAction::BillingAddressesLoaded(addresses),
                CheckoutAction::BillingAddressSelected(created.id),
            ),
        };
        store.dispatch(Action::Checkout(loaded));
        store.dispatch(Action::Checkout(selected));

        let mut notices = vec![Notice::success("Address saved")];
        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Create a billing profile from inside the checkout, refetch the list
    /// and pre-select the new profile.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (e.g. invalid document number).
    #[instrument(skip(self, input))]
    pub async fn create_billing_profile(
        &self,
        order_id: OrderId,
        input: NewBillingProfile,
    ) -> Result<WithNotices<CheckoutView>, AppError> {
        let input = input.normalized();
        if input.document_number.is_empty() {
            return Err(AppError::BadRequest(
                "Document number is required".to_string(),
            ));
        }

        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);

        let created = self
            .backend
            .create_billing_profile(&self.caller, &input)
            .await?;
        let profiles = self.backend.list_billing_profiles(&self.caller).await?;
        store.dispatch(Action::Checkout(CheckoutAction::BillingProfilesLoaded(
            profiles,
        )));
        store.dispatch(Action::Checkout(CheckoutAction::BillingProfileSelected(
            created.id,
        )));

        let mut notices = vec![Notice::success("Billing profile saved")];
        self.apply_pending(&mut store, &mut notices).await?;
        Ok(WithNotices::new(self.view(&store), notices))
    }

    /// Confirm the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutIncomplete` without calling the backend unless the
    /// shipping address, billing address and billing profile are selected.
    /// Returns the backend's rejection if a pending patch or the confirm
    /// call fails.
    #[instrument(skip(self))]
    pub async fn confirm(&self, order_id: OrderId) -> Result<ConfirmOutcome, AppError> {
        let mut store = self.store.lock().await;
        Self::ensure_order(&mut store, order_id);

        let (missing, pending) = store.checkout().map_or_else(
            || (CheckoutState::default().missing_selections(), Vec::new()),
            |c| (c.missing_selections(), c.pending_patches()),
        );
        if !missing.is_empty() {
            return Err(AppError::CheckoutIncomplete(missing));
        }

        for patch in pending {
            if let Err(e) = self.send_patch(order_id, patch).await {
                store.dispatch(Action::Checkout(CheckoutAction::PatchFailed(patch)));
                return Err(e.into());
            }
            store.dispatch(Action::Checkout(CheckoutAction::PatchApplied(patch)));
        }

        let callbacks = ConfirmRequest {
            success_url: self.config.absolute_url("/checkout/result/success"),
            failure_url: self.config.absolute_url("/checkout/result/failure"),
            pending_url: self.config.absolute_url("/checkout/result/pending"),
            webhook_url: self.config.checkout.webhook_url.clone(),
        };
        let response = self
            .backend
            .confirm_order(&self.caller, order_id, &callbacks)
            .await?;

        store.dispatch(Action::Checkout(CheckoutAction::Confirmed));
        // The backend consumed the cart.
        store.dispatch(Action::CartInvalidated);
        tracing::info!(order_id = %order_id, redirect = response.payment_url.is_some(), "Order confirmed");

        Ok(match response.payment_url {
            Some(url) => ConfirmOutcome::Redirect { url },
            None => ConfirmOutcome::Pending {
                location: format!(
                    "/checkout/result/pending?external_reference={}",
                    urlencoding::encode(&response.order.external_reference())
                ),
            },
        })
    }

    /// Current view of the checkout.
    pub async fn current(&self) -> CheckoutView {
        self.view(&*self.store.lock().await)
    }

    /// Point the checkout at `order_id` (no-op when it already is).
    fn ensure_order(store: &mut Store, order_id: OrderId) {
        store.dispatch(Action::Checkout(CheckoutAction::OrderStarted {
            order_id,
            number: None,
        }));
    }

    /// Push every pending selection to the order.
    async fn apply_pending(
        &self,
        store: &mut Store,
        notices: &mut Vec<Notice>,
    ) -> Result<(), AppError> {
        let Some(order_id) = store.checkout().and_then(|c| c.order_id) else {
            return Ok(());
        };
        let patches = store
            .checkout()
            .map(CheckoutState::pending_patches)
            .unwrap_or_default();

        for patch in patches {
            match self.send_patch(order_id, patch).await {
                Ok(()) => {
                    store.dispatch(Action::Checkout(CheckoutAction::PatchApplied(patch)));
                    notices.push(Notice::success(match patch {
                        Patch::ShippingAddress(_) => "Shipping address updated",
                        Patch::BillingProfile(_) => "Billing details updated",
                    }));
                }
                Err(e) => {
                    store.dispatch(Action::Checkout(CheckoutAction::PatchFailed(patch)));
                    notices.push(Self::notice_for(e)?);
                }
            }
        }
        Ok(())
    }

    async fn send_patch(&self, order_id: OrderId, patch: Patch) -> Result<(), BackendError> {
        match patch {
            Patch::ShippingAddress(id) => self
                .backend
                .set_order_shipping_address(&self.caller, order_id, id)
                .await
                .map(drop),
            Patch::BillingProfile(id) => self
                .backend
                .set_order_billing_profile(&self.caller, order_id, id)
                .await
                .map(drop),
        }
    }

    /// Turn a failed step into an error notice; an auth failure aborts.
    fn notice_for(e: BackendError) -> Result<Notice, AppError> {
        if matches!(e, BackendError::Unauthorized) {
            return Err(e.into());
        }
        warn!(error = %e, "Checkout step failed");
        Ok(Notice::error(e.user_message()))
    }

    fn view(&self, store: &Store) -> CheckoutView {
        let state = store.checkout().cloned().unwrap_or_default();
        let percent = self.config.checkout.transfer_discount_percent;
        CheckoutView {
            can_confirm: state.can_confirm(),
            missing: state.missing_selections(),
            transfer_discount: (percent > 0).then(|| TransferDiscount {
                percent,
                message: format!("Pay by bank transfer and get {percent}% off"),
            }),
            state,
        }
    }
}
