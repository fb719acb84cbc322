//! Vitrina Core - Shared domain types.
//!
//! This crate provides the types exchanged between the storefront and the
//! commerce backend:
//! - [`types`] - Newtype IDs, email, money and status enums
//! - [`commerce`] - Mirrors of remote resources (cart, order, address, ...)
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. Every entity here is owned by the backend; the storefront only
//! caches and displays what the backend returns.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod types;

pub use commerce::*;
pub use types::*;
