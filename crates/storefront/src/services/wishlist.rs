//! Wishlist operations.
//!
//! Every backend response replaces the whole wishlist slice.

use tracing::instrument;
use vitrina_core::ProductId;

use super::{Notice, WithNotices};
use crate::backend::{BackendClient, BackendError, Caller};
use crate::error::AppError;
use crate::store::{Action, SharedStore, Store, WishlistSlice};

/// Wishlist operations for one signed-in session.
pub struct WishlistService<'a> {
    backend: &'a BackendClient,
    store: SharedStore,
    caller: Caller,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, store: SharedStore, caller: Caller) -> Self {
        Self {
            backend,
            store,
            caller,
        }
    }

    /// Fetch the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<WishlistSlice, AppError> {
        let mut store = self.store.lock().await;
        store.dispatch(Action::WishlistRequested);
        let result = self.backend.get_wishlist(&self.caller).await;
        Self::settle(&mut store, result)
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        product_id: ProductId,
    ) -> Result<WithNotices<WishlistSlice>, AppError> {
        let mut store = self.store.lock().await;
        store.dispatch(Action::WishlistRequested);
        let result = self.backend.add_to_wishlist(&self.caller, product_id).await;
        let slice = Self::settle(&mut store, result)?;
        Ok(WithNotices::new(
            slice,
            vec![Notice::success("Added to your wishlist")],
        ))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        product_id: ProductId,
    ) -> Result<WithNotices<WishlistSlice>, AppError> {
        let mut store = self.store.lock().await;
        store.dispatch(Action::WishlistRequested);
        let result = self
            .backend
            .remove_from_wishlist(&self.caller, product_id)
            .await;
        let slice = Self::settle(&mut store, result)?;
        Ok(WithNotices::new(
            slice,
            vec![Notice::info("Removed from your wishlist")],
        ))
    }

    fn settle(
        store: &mut Store,
        result: Result<Vec<ProductId>, BackendError>,
    ) -> Result<WishlistSlice, AppError> {
        match result {
            Ok(product_ids) => {
                store.dispatch(Action::WishlistReceived(product_ids));
                Ok(store.state().wishlist.clone())
            }
            Err(e) => {
                store.dispatch(Action::WishlistFailed);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::store::LoadStatus;

    use super::*;

    #[test]
    fn test_failure_keeps_previous_ids() {
        let mut store = Store::default();
        WishlistService::settle(&mut store, Ok(vec![ProductId::new(1)])).unwrap();

        let err = WishlistService::settle(&mut store, Err(BackendError::Unauthorized));
        assert!(matches!(err, Err(AppError::Backend(BackendError::Unauthorized))));
        assert_eq!(store.state().wishlist.product_ids, vec![ProductId::new(1)]);
        assert_eq!(store.state().wishlist.status, LoadStatus::Failed);
    }

    #[test]
    fn test_response_replaces_slice() {
        let mut store = Store::default();
        WishlistService::settle(&mut store, Ok(vec![ProductId::new(1), ProductId::new(2)]))
            .unwrap();
        let slice =
            WishlistService::settle(&mut store, Ok(vec![ProductId::new(3)])).unwrap();
        assert_eq!(slice.product_ids, vec![ProductId::new(3)]);
        assert_eq!(slice.status, LoadStatus::Ready);
    }
}
