//! Cart operations.
//!
//! Every backend call takes a ticket from the session store first (see
//! [`crate::store`]). Mutations hold the store lock for their whole duration;
//! plain fetches only lock to take the ticket and to apply the response.

use serde::Serialize;
use tracing::instrument;
use vitrina_core::{Cart, CartItemId, Money, NewCartItem};

use super::{Notice, WithNotices};
use crate::backend::{BackendClient, BackendError, Caller};
use crate::error::AppError;
use crate::store::{Action, CartSlice, SharedStore, Store};

/// Cart as returned to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: CartSlice,
    pub item_count: u32,
    /// Backend total (or the display-only fallback sum).
    pub total: Option<Money>,
}

impl From<&CartSlice> for CartView {
    fn from(slice: &CartSlice) -> Self {
        Self {
            cart: slice.clone(),
            item_count: slice.cart.as_ref().map_or(0, Cart::item_count),
            total: slice.cart.as_ref().map(Cart::display_total),
        }
    }
}

/// Apply a ticketed cart response to the store.
pub(super) fn settle(
    store: &mut Store,
    ticket: u64,
    result: Result<Cart, BackendError>,
) -> Result<(), AppError> {
    match result {
        Ok(cart) => {
            store.dispatch(Action::CartReceived { ticket, cart });
            Ok(())
        }
        Err(e) => {
            store.dispatch(Action::CartFailed {
                ticket,
                message: e.user_message(),
            });
            Err(e.into())
        }
    }
}

/// Cart operations for one session.
pub struct CartService<'a> {
    backend: &'a BackendClient,
    store: SharedStore,
    caller: Caller,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, store: SharedStore, caller: Caller) -> Self {
        Self {
            backend,
            store,
            caller,
        }
    }

    /// Fetch the cart.
    ///
    /// The response only replaces the stored cart if no newer request was
    /// issued in the meantime; the returned view is always the newest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<CartView, AppError> {
        let ticket = self.store.lock().await.issue_ticket();
        let result = self.backend.get_cart(&self.caller).await;

        let mut store = self.store.lock().await;
        settle(&mut store, ticket, result)?;
        Ok(CartView::from(&store.state().cart))
    }

    /// Add a product (or variant) to the cart.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a zero quantity, or the backend's rejection
    /// (e.g. out of stock).
    #[instrument(skip(self))]
    pub async fn add(&self, item: &NewCartItem) -> Result<WithNotices<CartView>, AppError> {
        if item.quantity == 0 {
            return Err(AppError::BadRequest(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let mut store = self.store.lock().await;
        let ticket = store.issue_ticket();
        let result = self.backend.add_cart_item(&self.caller, item).await;
        settle(&mut store, ticket, result)?;

        let product_id = item.product_id.to_string();
        crate::error::add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        Ok(WithNotices::new(
            CartView::from(&store.state().cart),
            vec![Notice::success("Added to cart")],
        ))
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<WithNotices<CartView>, AppError> {
        let mut store = self.store.lock().await;
        self.write_quantity(&mut store, item_id, quantity).await
    }

    /// Add one unit to a line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line is not in the cart.
    #[instrument(skip(self))]
    pub async fn increment(&self, item_id: CartItemId) -> Result<WithNotices<CartView>, AppError> {
        let mut store = self.store.lock().await;
        let current = self.current_quantity(&mut store, item_id).await?;
        self.write_quantity(&mut store, item_id, current.saturating_add(1))
            .await
    }

    /// Remove one unit from a line; the last unit removes the line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line is not in the cart.
    #[instrument(skip(self))]
    pub async fn decrement(&self, item_id: CartItemId) -> Result<WithNotices<CartView>, AppError> {
        let mut store = self.store.lock().await;
        let current = self.current_quantity(&mut store, item_id).await?;
        self.write_quantity(&mut store, item_id, current.saturating_sub(1))
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: CartItemId) -> Result<WithNotices<CartView>, AppError> {
        let mut store = self.store.lock().await;
        self.write_quantity(&mut store, item_id, 0).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<WithNotices<CartView>, AppError> {
        let mut store = self.store.lock().await;
        let ticket = store.issue_ticket();
        let result = self.backend.clear_cart(&self.caller).await;
        settle(&mut store, ticket, result)?;
        Ok(WithNotices::new(
            CartView::from(&store.state().cart),
            vec![Notice::info("Your cart is now empty")],
        ))
    }

    /// Merge the guest cart identified by `guest_session` into the signed-in
    /// user's cart. The backend makes this idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller is not signed in.
    #[instrument(skip(self, guest_session))]
    pub async fn attach(&self, guest_session: &str) -> Result<CartView, AppError> {
        let mut store = self.store.lock().await;
        let ticket = store.issue_ticket();
        let result = self.backend.attach_cart(&self.caller, guest_session).await;
        settle(&mut store, ticket, result)?;
        Ok(CartView::from(&store.state().cart))
    }

    /// Quantity of a line, loading the cart first if the store has none.
    async fn current_quantity(
        &self,
        store: &mut Store,
        item_id: CartItemId,
    ) -> Result<u32, AppError> {
        if store.state().cart.cart.is_none() {
            let ticket = store.issue_ticket();
            let result = self.backend.get_cart(&self.caller).await;
            settle(store, ticket, result)?;
        }
        store
            .state()
            .cart
            .quantity_of(item_id)
            .ok_or_else(|| AppError::NotFound(format!("Cart item {item_id}")))
    }

    async fn write_quantity(
        &self,
        store: &mut Store,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<WithNotices<CartView>, AppError> {
        let ticket = store.issue_ticket();
        let (result, notice) = if quantity == 0 {
            (
                self.backend.remove_cart_item(&self.caller, item_id).await,
                Some(Notice::success("Removed from cart")),
            )
        } else {
            (
                self.backend
                    .update_cart_item(&self.caller, item_id, quantity)
                    .await,
                None,
            )
        };
        settle(store, ticket, result)?;
        Ok(WithNotices::new(
            CartView::from(&store.state().cart),
            notice.into_iter().collect(),
        ))
    }
}
