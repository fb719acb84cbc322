//! Read-only catalog resources: products, facets, reviews and banners.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BannerId, Money, ProductId, ReviewId, VariantId};

/// A product with its purchasable variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub discounted_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// A purchasable variant (e.g. size M, color red).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub price: Money,
    #[serde(default)]
    pub discounted_price: Option<Money>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Find the variant matching every requested attribute.
    ///
    /// Attribute names are compared case-insensitively; values exactly.
    #[must_use]
    pub fn variant_for(&self, wanted: &BTreeMap<String, String>) -> Option<&Variant> {
        self.variants.iter().find(|variant| {
            wanted.iter().all(|(name, value)| {
                variant
                    .attributes
                    .iter()
                    .any(|(n, v)| n.eq_ignore_ascii_case(name) && v == value)
            })
        })
    }

    /// Whether any variant has stock (products without variants are sellable).
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v.stock > 0)
    }
}

/// Attribute facets for catalog filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFacets {
    #[serde(default)]
    pub facets: BTreeMap<String, Vec<FacetValue>>,
}

/// One value of a facet with its product count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u32,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Errors validating a [`NewReview`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5 (got {0})")]
    Rating(u8),
    #[error("review body must be at most {max} characters")]
    BodyTooLong { max: usize },
}

/// Input for posting a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl NewReview {
    /// Maximum review body length.
    pub const MAX_BODY: usize = 2000;

    /// Validate the rating range and body length.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewError`] for out-of-range ratings or oversized bodies.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::Rating(self.rating));
        }
        if self
            .body
            .as_ref()
            .is_some_and(|body| body.chars().count() > Self::MAX_BODY)
        {
            return Err(ReviewError::BodyTooLong {
                max: Self::MAX_BODY,
            });
        }
        Ok(())
    }
}

/// A promotional banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub position: i32,
}
