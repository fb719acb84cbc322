//! Session store registry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use super::Store;

/// A store shared by every request of one session.
///
/// Holding the lock serializes dispatch: one mutation at a time per store.
pub type SharedStore = Arc<Mutex<Store>>;

/// Maps store keys to their stores, dropping stores idle for too long.
#[derive(Clone)]
pub struct StoreRegistry {
    stores: Cache<String, SharedStore>,
}

impl StoreRegistry {
    /// Create a registry.
    #[must_use]
    pub fn new(max_capacity: u64, time_to_idle: Duration) -> Self {
        Self {
            stores: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// The store for `key`, created empty on first use.
    pub async fn get(&self, key: &str) -> SharedStore {
        self.stores
            .get_with(key.to_string(), async { Arc::new(Mutex::new(Store::default())) })
            .await
    }

    /// Forget a store (logout).
    pub async fn remove(&self, key: &str) {
        self.stores.invalidate(key).await;
    }
}

impl Default for StoreRegistry {
    /// 10k sessions, idle expiry matching the session cookie (7 days).
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(7 * 24 * 60 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::super::Action;
    use super::*;

    #[tokio::test]
    async fn test_same_key_same_store() {
        let registry = StoreRegistry::default();
        let a = registry.get("session-a").await;
        let again = registry.get("session-a").await;
        let b = registry.get("session-b").await;
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_remove_starts_fresh() {
        let registry = StoreRegistry::default();
        registry
            .get("s")
            .await
            .lock()
            .await
            .dispatch(Action::PreviewSlid(4));
        registry.remove("s").await;
        assert_eq!(registry.get("s").await.lock().await.state().ui.preview_slide, 0);
    }
}
