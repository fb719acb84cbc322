//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart operations, ticketed through the session store
//! - `checkout` - Checkout orchestration (order creation, patches, confirm)
//! - `identity` - OAuth providers (authorization URL, code exchange)
//! - `wishlist` - Wishlist operations for signed-in users
//!
//! Mutations return their payload together with [`Notice`]s, the messages
//! the browser shows as toasts.

pub mod cart;
pub mod checkout;
pub mod identity;
pub mod wishlist;

pub use cart::{CartService, CartView};
pub use checkout::{CheckoutService, CheckoutView, ConfirmOutcome};
pub use identity::{IdentityError, IdentityService, OAuthProvider};
pub use wishlist::WishlistService;

use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// A payload with the notices produced while computing it.
#[derive(Debug, Clone, Serialize)]
pub struct WithNotices<T> {
    #[serde(flatten)]
    pub data: T,
    pub notices: Vec<Notice>,
}

impl<T> WithNotices<T> {
    #[must_use]
    pub const fn new(data: T, notices: Vec<Notice>) -> Self {
        Self { data, notices }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        count: u32,
    }

    #[test]
    fn test_notices_serialize_next_to_payload() {
        let value = serde_json::to_value(WithNotices::new(
            Payload { count: 2 },
            vec![Notice::success("Added to cart")],
        ))
        .unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["notices"][0]["level"], "success");
        assert_eq!(value["notices"][0]["message"], "Added to cart");
    }
}
