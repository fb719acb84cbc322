//! Catalog and wishlist route handlers.
//!
//! Product detail, facets and banners are served from the backend client's
//! cache; reviews and the wishlist always go to the backend.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::Deserialize;
use vitrina_core::{Banner, NewReview, Product, ProductFacets, ProductId, Review};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::WithNotices;
use crate::state::AppState;
use crate::store::WishlistSlice;

/// Body of `POST /api/wishlist`.
#[derive(Debug, Deserialize)]
pub struct WishlistAdd {
    pub product_id: ProductId,
}

/// `GET /api/products/{slug}`
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    Ok(Json(state.backend().get_product(&slug).await?))
}

/// `GET /api/products/facets?...`: the query string is passed through.
pub async fn facets(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ProductFacets>> {
    Ok(Json(
        state
            .backend()
            .get_facets(query.as_deref().unwrap_or_default())
            .await?,
    ))
}

/// `GET /api/products/{id}/reviews`
pub async fn reviews(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.backend().list_reviews(product_id).await?))
}

/// `POST /api/products/{id}/reviews`
pub async fn create_review(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(review): Json<NewReview>,
) -> Result<Json<Review>> {
    review
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let review = state
        .backend()
        .create_review(&auth.ctx.caller, product_id, &review)
        .await?;
    let product_id = product_id.to_string();
    add_breadcrumb(
        "review",
        "Posted review",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(review))
}

/// `GET /api/banners`
pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    Ok(Json(state.backend().get_banners().await?))
}

/// `GET /api/wishlist`
pub async fn wishlist(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<WishlistSlice>> {
    Ok(Json(state.wishlist(&auth.ctx).await.fetch().await?))
}

/// `POST /api/wishlist`
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<WishlistAdd>,
) -> Result<Json<WithNotices<WishlistSlice>>> {
    Ok(Json(
        state.wishlist(&auth.ctx).await.add(body.product_id).await?,
    ))
}

/// `DELETE /api/wishlist/{product_id}`
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WithNotices<WishlistSlice>>> {
    Ok(Json(
        state.wishlist(&auth.ctx).await.remove(product_id).await?,
    ))
}

