//! Catalog, review, banner and wishlist endpoints.

use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};
use vitrina_core::{Banner, NewReview, Product, ProductFacets, ProductId, Review};

use super::cache::{BANNERS_KEY, CacheValue, facets_key, product_key};
use super::{BackendClient, BackendError, Caller};

impl BackendClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// Get a product by slug (cached for 5 minutes).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, BackendError> {
        let cache_key = product_key(slug);
        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &format!("products/{slug}"), &Caller::default())?;
        let product: Product = self.execute(request).await?;

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Get filter facets for a catalog query (cached for 5 minutes).
    ///
    /// `query` is the raw query string forwarded to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_facets(&self, query: &str) -> Result<ProductFacets, BackendError> {
        let cache_key = facets_key(query);
        if let Some(CacheValue::Facets(facets)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for facets");
            return Ok(facets);
        }

        let path = if query.is_empty() {
            "products/facets".to_string()
        } else {
            format!("products/facets?{query}")
        };
        let request = self.request(Method::GET, &path, &Caller::default())?;
        let facets: ProductFacets = self.execute(request).await?;

        self.cache()
            .insert(cache_key, CacheValue::Facets(facets.clone()))
            .await;
        Ok(facets)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, BackendError> {
        let request = self.request(
            Method::GET,
            &format!("products/{product_id}/reviews"),
            &Caller::default(),
        )?;
        self.execute(request).await
    }

    /// Post a review as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review (e.g. already reviewed).
    #[instrument(skip(self, caller, review))]
    pub async fn create_review(
        &self,
        caller: &Caller,
        product_id: ProductId,
        review: &NewReview,
    ) -> Result<Review, BackendError> {
        let request = self
            .request(
                Method::POST,
                &format!("products/{product_id}/reviews"),
                caller,
            )?
            .json(review);
        self.execute(request).await
    }

    // =========================================================================
    // Banners
    // =========================================================================

    /// Get the promotional banners, ordered by position (cached for 5 minutes).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_banners(&self) -> Result<Vec<Banner>, BackendError> {
        if let Some(CacheValue::Banners(banners)) = self.cache().get(BANNERS_KEY).await {
            debug!("Cache hit for banners");
            return Ok(banners);
        }

        let request = self.request(Method::GET, "banners", &Caller::default())?;
        let mut banners: Vec<Banner> = self.execute(request).await?;
        banners.sort_by_key(|b| b.position);

        self.cache()
            .insert(BANNERS_KEY.to_string(), CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Product IDs on the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the caller is not signed in.
    #[instrument(skip(self, caller))]
    pub async fn get_wishlist(&self, caller: &Caller) -> Result<Vec<ProductId>, BackendError> {
        let request = self.request(Method::GET, "wishlist", caller)?;
        self.execute(request).await
    }

    /// Add a product to the wishlist; returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn add_to_wishlist(
        &self,
        caller: &Caller,
        product_id: ProductId,
    ) -> Result<Vec<ProductId>, BackendError> {
        let request = self
            .request(Method::POST, "wishlist", caller)?
            .json(&json!({ "product_id": product_id }));
        self.execute(request).await
    }

    /// Remove a product from the wishlist; returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, caller))]
    pub async fn remove_from_wishlist(
        &self,
        caller: &Caller,
        product_id: ProductId,
    ) -> Result<Vec<ProductId>, BackendError> {
        let request = self.request(Method::DELETE, &format!("wishlist/{product_id}"), caller)?;
        self.execute(request).await
    }
}
