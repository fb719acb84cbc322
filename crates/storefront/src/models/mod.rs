//! Domain models owned by the storefront itself.
//!
//! Commerce entities live in `vitrina-core`; this module only holds what the
//! storefront keeps in its own session.

pub mod session;

pub use session::keys as session_keys;
