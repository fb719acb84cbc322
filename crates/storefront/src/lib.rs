//! Vitrina Storefront library.
//!
//! The storefront is the browser-facing gateway in front of the commerce
//! backend: it owns the session, keeps a per-session client store, drives
//! the checkout and proxies everything else. Exposed as a library so the
//! binary and the integration tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
