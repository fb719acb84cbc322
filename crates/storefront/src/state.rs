//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::config::StorefrontConfig;
use crate::middleware::SessionContext;
use crate::services::{CartService, CheckoutService, IdentityService, WishlistService};
use crate::store::{SharedStore, StoreRegistry};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and the session stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    identity: IdentityService,
    stores: StoreRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let identity = IdentityService::new(&config, backend.http().clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                identity,
                stores: StoreRegistry::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the OAuth identity service.
    #[must_use]
    pub fn identity(&self) -> &IdentityService {
        &self.inner.identity
    }

    /// Get a reference to the session store registry.
    #[must_use]
    pub fn stores(&self) -> &StoreRegistry {
        &self.inner.stores
    }

    /// The store of the current session.
    pub async fn store(&self, ctx: &SessionContext) -> SharedStore {
        self.inner.stores.get(&ctx.store_key).await
    }

    /// Cart operations on behalf of the current session.
    pub async fn cart(&self, ctx: &SessionContext) -> CartService<'_> {
        CartService::new(self.backend(), self.store(ctx).await, ctx.caller.clone())
    }

    /// Checkout operations on behalf of the current session.
    pub async fn checkout(&self, ctx: &SessionContext) -> CheckoutService<'_> {
        CheckoutService::new(
            self.backend(),
            self.config(),
            self.store(ctx).await,
            ctx.caller.clone(),
        )
    }

    /// Wishlist operations on behalf of the current session.
    pub async fn wishlist(&self, ctx: &SessionContext) -> WishlistService<'_> {
        WishlistService::new(self.backend(), self.store(ctx).await, ctx.caller.clone())
    }
}
