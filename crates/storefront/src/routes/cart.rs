//! Cart route handlers.
//!
//! Every handler returns the session's cart slice (with item count and
//! display total); mutations add the notices to show.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use vitrina_core::{CartItemId, NewCartItem};

use crate::error::Result;
use crate::middleware::SessionContext;
use crate::services::{CartView, WithNotices};
use crate::state::AppState;

/// Body of `PATCH /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// `GET /api/cart`
pub async fn show(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<CartView>> {
    Ok(Json(state.cart(&ctx).await.fetch().await?))
}

/// `POST /api/cart/items`
pub async fn add(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(item): Json<NewCartItem>,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(state.cart(&ctx).await.add(&item).await?))
}

/// `PATCH /api/cart/items/{id}`: a quantity of zero removes the line.
pub async fn update(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(item_id): Path<CartItemId>,
    Json(update): Json<QuantityUpdate>,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(
        state
            .cart(&ctx)
            .await
            .set_quantity(item_id, update.quantity)
            .await?,
    ))
}

/// `POST /api/cart/items/{id}/increment`
pub async fn increment(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(state.cart(&ctx).await.increment(item_id).await?))
}

/// `POST /api/cart/items/{id}/decrement`
pub async fn decrement(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(state.cart(&ctx).await.decrement(item_id).await?))
}

/// `DELETE /api/cart/items/{id}`
pub async fn remove(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(state.cart(&ctx).await.remove(item_id).await?))
}

/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<Json<WithNotices<CartView>>> {
    Ok(Json(state.cart(&ctx).await.clear().await?))
}
