//! Status and enumeration types shared with the backend.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment method enumeration understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
}

/// Payment option offered to the shopper at checkout.
///
/// Several choices collapse into the same backend [`PaymentMethod`]: every
/// option other than a bank transfer is processed by the card processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChoice {
    Transfer,
    CreditCard,
    DebitCard,
    Wallet,
}

impl PaymentChoice {
    /// Map the shopper's choice to the backend enumeration.
    #[must_use]
    pub const fn method(self) -> PaymentMethod {
        match self {
            Self::Transfer => PaymentMethod::BankTransfer,
            Self::CreditCard | Self::DebitCard | Self::Wallet => PaymentMethod::Card,
        }
    }
}

/// Payment status as reported by the backend (mirrors the processor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    /// The checkout result this payment status corresponds to.
    #[must_use]
    pub const fn outcome(self) -> CheckoutOutcome {
        match self {
            Self::Approved => CheckoutOutcome::Success,
            Self::Pending | Self::InProcess => CheckoutOutcome::Pending,
            Self::Rejected | Self::Cancelled | Self::Refunded => CheckoutOutcome::Failure,
        }
    }
}

/// Result of a checkout as shown on the result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Success,
    Failure,
    Pending,
}

impl CheckoutOutcome {
    /// Path segment used by the result routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
        }
    }
}

impl std::str::FromStr for CheckoutOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("invalid checkout outcome: {s}")),
        }
    }
}

/// Address usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    /// Value used in the backend's `type` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "SHIPPING",
            Self::Billing => "BILLING",
        }
    }
}

/// Tax identity document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Dni,
    Cuit,
    Cuil,
    Passport,
}

/// Tax condition of a billing profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCondition {
    FinalConsumer,
    RegisteredTaxpayer,
    Monotax,
    Exempt,
}
