//! Per-session client state store.
//!
//! The store is an explicit, serializable value ([`StoreState`]) changed only
//! by dispatching [`Action`]s through the pure [`reduce`] function. A fetch
//! replaces the whole cart sub-state; totals always come from the backend.
//!
//! # Cart sequencing
//!
//! Every cart request takes a ticket from [`Store::issue_ticket`] before it
//! is sent. A response is applied only if its ticket is newer than the last
//! one applied, so the response to the most recently *issued* request wins
//! even when an older request resolves later.

pub mod registry;

pub use registry::{SharedStore, StoreRegistry};

use serde::Serialize;
use vitrina_core::{Cart, CartItemId, ProductId};

use crate::checkout::{CheckoutAction, CheckoutState};

/// Fetch status of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Cart slice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartSlice {
    pub cart: Option<Cart>,
    pub status: LoadStatus,
    pub error: Option<String>,
    /// Last ticket handed out.
    pub issued: u64,
    /// Ticket of the response currently shown.
    pub applied: u64,
}

impl CartSlice {
    /// Quantity of a line, if the cart is loaded and has it.
    #[must_use]
    pub fn quantity_of(&self, item_id: CartItemId) -> Option<u32> {
        self.cart
            .as_ref()
            .and_then(|cart| cart.item(item_id))
            .map(|item| item.quantity)
    }
}

/// Wishlist slice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WishlistSlice {
    pub product_ids: Vec<ProductId>,
    pub status: LoadStatus,
}

/// UI selections that survive navigation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UiSlice {
    /// Slug of the product open in the quick-view modal.
    pub quick_view: Option<String>,
    /// Current slide of the product preview slider.
    pub preview_slide: u32,
}

/// Everything the storefront remembers for one browser session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreState {
    pub cart: CartSlice,
    pub wishlist: WishlistSlice,
    pub ui: UiSlice,
    pub checkout: Option<CheckoutState>,
}

/// Store actions.
#[derive(Debug, Clone)]
pub enum Action {
    /// A cart request is about to be sent; issues the next ticket.
    CartRequested,
    CartReceived { ticket: u64, cart: Cart },
    CartFailed { ticket: u64, message: String },
    /// The server-side cart changed outside our requests (order confirmed).
    CartInvalidated,
    WishlistRequested,
    WishlistReceived(Vec<ProductId>),
    WishlistFailed,
    QuickViewOpened(String),
    QuickViewClosed,
    PreviewSlid(u32),
    Checkout(CheckoutAction),
    CheckoutCleared,
}

/// The reducer.
#[must_use]
pub fn reduce(mut state: StoreState, action: Action) -> StoreState {
    match action {
        Action::CartRequested => {
            state.cart.issued += 1;
            state.cart.status = LoadStatus::Loading;
        }
        Action::CartReceived { ticket, cart } => {
            if ticket > state.cart.applied {
                let status = if ticket >= state.cart.issued {
                    LoadStatus::Ready
                } else {
                    LoadStatus::Loading
                };
                state.cart = CartSlice {
                    cart: Some(cart),
                    status,
                    error: None,
                    issued: state.cart.issued,
                    applied: ticket,
                };
            } else {
                tracing::debug!(ticket, applied = state.cart.applied, "Discarding stale cart");
            }
        }
        Action::CartFailed { ticket, message } => {
            if ticket > state.cart.applied {
                state.cart.applied = ticket;
                state.cart.status = LoadStatus::Failed;
                state.cart.error = Some(message);
            }
        }
        Action::CartInvalidated => {
            state.cart.cart = None;
            state.cart.status = LoadStatus::Idle;
            state.cart.error = None;
            // Anything still in flight predates the invalidation.
            state.cart.applied = state.cart.issued;
        }
        Action::WishlistRequested => state.wishlist.status = LoadStatus::Loading,
        Action::WishlistReceived(product_ids) => {
            state.wishlist = WishlistSlice {
                product_ids,
                status: LoadStatus::Ready,
            };
        }
        Action::WishlistFailed => state.wishlist.status = LoadStatus::Failed,
        Action::QuickViewOpened(slug) => state.ui.quick_view = Some(slug),
        Action::QuickViewClosed => state.ui.quick_view = None,
        Action::PreviewSlid(slide) => state.ui.preview_slide = slide,
        Action::Checkout(action) => {
            state.checkout = Some(state.checkout.take().unwrap_or_default().apply(action));
        }
        Action::CheckoutCleared => state.checkout = None,
    }
    state
}

/// A session's store.
#[derive(Debug, Default)]
pub struct Store {
    state: StoreState,
}

impl Store {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &StoreState {
        &self.state
    }

    /// Dispatch an action through the reducer.
    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    /// Take the ticket for a cart request about to be sent.
    pub fn issue_ticket(&mut self) -> u64 {
        self.dispatch(Action::CartRequested);
        self.state.cart.issued
    }

    /// Checkout state, if a checkout was started in this session.
    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutState> {
        self.state.checkout.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use vitrina_core::{CartItem, CurrencyCode, Money, OrderId};

    use super::*;

    fn cart(quantity: u32) -> Cart {
        Cart {
            id: 1,
            session_id: Some("guest".to_string()),
            items: vec![CartItem {
                id: CartItemId::new(5),
                product_id: ProductId::new(9),
                variant_id: None,
                name: "Mate".to_string(),
                quantity,
                unit_price: Money::new(Decimal::from(100), CurrencyCode::ARS),
                discounted_price: None,
                image: None,
            }],
            totals: None,
        }
    }

    #[test]
    fn test_stale_cart_response_is_discarded() {
        let mut store = Store::default();
        let first = store.issue_ticket();
        let second = store.issue_ticket();

        // The newer request resolves first...
        store.dispatch(Action::CartReceived {
            ticket: second,
            cart: cart(3),
        });
        // ...and the older one arrives late.
        store.dispatch(Action::CartReceived {
            ticket: first,
            cart: cart(1),
        });

        assert_eq!(store.state().cart.quantity_of(CartItemId::new(5)), Some(3));
        assert_eq!(store.state().cart.applied, second);
        assert_eq!(store.state().cart.status, LoadStatus::Ready);
    }

    #[test]
    fn test_older_response_shows_loading_until_newest_arrives() {
        let mut store = Store::default();
        let first = store.issue_ticket();
        let _second = store.issue_ticket();
        store.dispatch(Action::CartReceived {
            ticket: first,
            cart: cart(1),
        });
        assert_eq!(store.state().cart.status, LoadStatus::Loading);
        assert!(store.state().cart.cart.is_some());
    }

    #[test]
    fn test_stale_failure_does_not_mark_cart_failed() {
        let mut store = Store::default();
        let first = store.issue_ticket();
        let second = store.issue_ticket();
        store.dispatch(Action::CartReceived {
            ticket: second,
            cart: cart(2),
        });
        store.dispatch(Action::CartFailed {
            ticket: first,
            message: "timeout".to_string(),
        });
        assert_eq!(store.state().cart.status, LoadStatus::Ready);
        assert_eq!(store.state().cart.error, None);
    }

    #[test]
    fn test_failure_keeps_previous_cart() {
        let mut store = Store::default();
        let first = store.issue_ticket();
        store.dispatch(Action::CartReceived {
            ticket: first,
            cart: cart(2),
        });
        let second = store.issue_ticket();
        store.dispatch(Action::CartFailed {
            ticket: second,
            message: "Out of stock".to_string(),
        });
        assert_eq!(store.state().cart.status, LoadStatus::Failed);
        assert_eq!(store.state().cart.error.as_deref(), Some("Out of stock"));
        assert_eq!(store.state().cart.quantity_of(CartItemId::new(5)), Some(2));
    }

    #[test]
    fn test_invalidation_drops_in_flight_responses() {
        let mut store = Store::default();
        let ticket = store.issue_ticket();
        store.dispatch(Action::CartInvalidated);
        store.dispatch(Action::CartReceived {
            ticket,
            cart: cart(1),
        });
        assert!(store.state().cart.cart.is_none());
    }

    #[test]
    fn test_ui_and_wishlist_slices() {
        let state = [
            Action::QuickViewOpened("yerba-500g".to_string()),
            Action::PreviewSlid(2),
            Action::WishlistReceived(vec![ProductId::new(1), ProductId::new(2)]),
            Action::QuickViewClosed,
        ]
        .into_iter()
        .fold(StoreState::default(), reduce);

        assert_eq!(state.ui.quick_view, None);
        assert_eq!(state.ui.preview_slide, 2);
        assert_eq!(state.wishlist.product_ids.len(), 2);
        assert_eq!(state.wishlist.status, LoadStatus::Ready);
    }

    #[test]
    fn test_checkout_actions_create_state() {
        let state = reduce(
            StoreState::default(),
            Action::Checkout(CheckoutAction::OrderStarted {
                order_id: OrderId::new(3),
                number: None,
            }),
        );
        assert_eq!(state.checkout.unwrap().order_id, Some(OrderId::new(3)));
    }

    #[test]
    fn test_state_serializes() {
        let json = serde_json::to_value(StoreState::default()).unwrap();
        assert_eq!(json["cart"]["status"], "idle");
        assert!(json["checkout"].is_null());
    }
}
