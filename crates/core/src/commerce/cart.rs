//! Server-owned shopping cart.

use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, CurrencyCode, Money, ProductId, VariantId};

/// A cart as returned by the backend.
///
/// The backend is authoritative for totals. [`Cart::display_total`] only
/// falls back to a local sum when the response omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Backend cart ID.
    pub id: i64,
    /// Guest session identifier the cart is bound to, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Line items.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Totals computed by the backend.
    #[serde(default)]
    pub totals: Option<CartTotals>,
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub quantity: u32,
    /// Unit price snapshot at the time the item was added.
    pub unit_price: Money,
    /// Discounted unit price snapshot, when a promotion applies.
    #[serde(default)]
    pub discounted_price: Option<Money>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    /// Unit price after any discount.
    #[must_use]
    pub fn effective_unit_price(&self) -> Money {
        self.discounted_price.unwrap_or(self.unit_price)
    }

    /// Line subtotal (`effective_unit_price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.effective_unit_price() * self.quantity
    }
}

/// Cart totals computed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    #[serde(default)]
    pub discount: Option<Money>,
    pub total: Money,
}

impl Cart {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Total to display: the backend's, or a local sum when it is missing.
    #[must_use]
    pub fn display_total(&self) -> Money {
        if let Some(totals) = &self.totals {
            return totals.total;
        }
        let currency = self
            .items
            .first()
            .map_or(CurrencyCode::default(), |item| item.unit_price.currency);
        self.items
            .iter()
            .fold(Money::zero(currency), |acc, item| acc + item.line_total())
    }
}

/// Request body for adding an item to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: i64, quantity: u32, price: i64, discounted: Option<i64>) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(id * 10),
            variant_id: None,
            name: format!("Item {id}"),
            quantity,
            unit_price: Money::new(Decimal::from(price), CurrencyCode::ARS),
            discounted_price: discounted
                .map(|p| Money::new(Decimal::from(p), CurrencyCode::ARS)),
            image: None,
        }
    }

    #[test]
    fn test_display_total_prefers_backend_totals() {
        let cart = Cart {
            id: 1,
            session_id: None,
            items: vec![item(1, 2, 100, None)],
            totals: Some(CartTotals {
                subtotal: Money::new(Decimal::from(200), CurrencyCode::ARS),
                discount: Some(Money::new(Decimal::from(20), CurrencyCode::ARS)),
                total: Money::new(Decimal::from(180), CurrencyCode::ARS),
            }),
        };
        assert_eq!(cart.display_total().amount, Decimal::from(180));
    }

    #[test]
    fn test_item_count_saturates() {
        let cart = Cart {
            id: 1,
            session_id: None,
            items: vec![item(1, u32::MAX, 100, None), item(2, 3, 50, None)],
            totals: None,
        };
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_display_total_falls_back_to_local_sum() {
        let cart = Cart {
            id: 1,
            session_id: None,
            items: vec![item(1, 2, 100, None), item(2, 1, 50, Some(40))],
            totals: None,
        };
        assert_eq!(cart.display_total().amount, Decimal::from(240));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart() {
        let cart: Cart = serde_json::from_str(r#"{"id": 9}"#).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.display_total().amount, Decimal::ZERO);
    }

    #[test]
    fn test_new_item_defaults_quantity() {
        let input: NewCartItem = serde_json::from_str(r#"{"product_id": 3}"#).unwrap();
        assert_eq!(input.quantity, 1);
        assert_eq!(input.variant_id, None);
    }
}
