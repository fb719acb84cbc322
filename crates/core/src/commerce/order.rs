//! Orders and their denormalized snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    DocumentType, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    TaxCondition, VariantId,
};

/// An order: a checkout in progress or a completed purchase.
///
/// Created once from the server-side cart, patched step by step (shipping,
/// billing profile, payment method) and frozen by the confirm call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable number, e.g. `"A1B2C3"`.
    pub number: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping: Option<ShippingSnapshot>,
    #[serde(default)]
    pub billing: Option<BillingSnapshot>,
    #[serde(default)]
    pub payment: Option<PaymentSummary>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The external reference sent to the payment processor.
    #[must_use]
    pub fn external_reference(&self) -> String {
        format!("ORD-{}", self.number)
    }

    /// Payment status, if a payment has been attempted.
    #[must_use]
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment.as_ref().and_then(|p| p.status)
    }
}

/// Shipping address copied onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    pub recipient: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub apartment: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

/// Billing profile and address copied onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub document_type: DocumentType,
    pub document_number: String,
    pub tax_condition: TaxCondition,
    #[serde(default)]
    pub business_name: Option<String>,
    pub street: String,
    pub number: String,
    pub city: String,
    pub postal_code: String,
}

/// Payment summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub amount: Option<Money>,
}

/// A line item frozen on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub discounted_price: Option<Money>,
}

/// One page of the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}
