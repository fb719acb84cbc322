//! Mirrors of the backend's commerce resources.
//!
//! These are wire types: field names follow the backend's JSON (`snake_case`),
//! and every optional field is tolerated as missing.

pub mod address;
pub mod billing;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use address::{Address, AddressPatch, NewAddress};
pub use billing::{BillingProfile, BillingProfilePatch, NewBillingProfile};
pub use cart::{Cart, CartItem, CartTotals, NewCartItem};
pub use catalog::{
    Banner, FacetValue, NewReview, Product, ProductFacets, Review, ReviewError, Variant,
};
pub use order::{BillingSnapshot, Order, OrderLine, OrderPage, PaymentSummary, ShippingSnapshot};
pub use user::{AccountPatch, SessionUser};
