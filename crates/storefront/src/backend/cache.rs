//! Cache types for catalog responses.

use vitrina_core::{Banner, Product, ProductFacets};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Facets(ProductFacets),
    Banners(Vec<Banner>),
}

/// Cache key for a product detail.
pub fn product_key(slug: &str) -> String {
    format!("product:{slug}")
}

/// Cache key for a facet query.
pub fn facets_key(query: &str) -> String {
    format!("facets:{query}")
}

/// Cache key for the banner list.
pub const BANNERS_KEY: &str = "banners";
