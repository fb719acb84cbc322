//! Account route handlers (all require a signed-in user).
//!
//! ```text
//! GET    /api/account                 - Profile
//! PATCH  /api/account                 - Update profile
//! GET    /api/orders?page=            - Order history
//! GET    /api/orders/{id}             - Order detail
//! GET    /api/addresses?kind=         - Addresses
//! POST   /api/addresses               - Create (returns the refetched list)
//! PATCH  /api/addresses/{id}          - Update
//! DELETE /api/addresses/{id}          - Delete
//! GET    /api/billing-profiles        - Billing profiles
//! POST   /api/billing-profiles        - Create (returns the refetched list)
//! PATCH  /api/billing-profiles/{id}   - Update
//! DELETE /api/billing-profiles/{id}   - Delete
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use vitrina_core::{
    AccountPatch, Address, AddressId, AddressKind, AddressPatch, BillingProfile,
    BillingProfileId, BillingProfilePatch, NewAddress, NewBillingProfile, Order, OrderId,
    OrderPage,
};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::{Notice, WithNotices};
use crate::state::AppState;

/// `?page=` for the order history.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

const fn first_page() -> u32 {
    1
}

/// `?kind=` for the address list.
#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<AddressKind>,
}

/// Address list with the entry to preselect.
#[derive(Debug, Serialize)]
pub struct AddressList {
    pub addresses: Vec<Address>,
    pub selected: Option<AddressId>,
}

/// Billing profile list with the entry to preselect.
#[derive(Debug, Serialize)]
pub struct BillingProfileList {
    pub billing_profiles: Vec<BillingProfile>,
    pub selected: Option<BillingProfileId>,
}

// =============================================================================
// Profile & orders
// =============================================================================

/// `GET /api/account`
pub async fn show(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<Value>> {
    Ok(Json(state.backend().get_account(&auth.ctx.caller).await?))
}

/// `PATCH /api/account`
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(patch): Json<AccountPatch>,
) -> Result<Json<WithNotices<Value>>> {
    let account = state
        .backend()
        .update_account(&auth.ctx.caller, &patch)
        .await?;
    Ok(Json(WithNotices::new(
        account,
        vec![Notice::success("Profile updated")],
    )))
}

/// `GET /api/orders`
pub async fn orders(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderPage>> {
    Ok(Json(
        state
            .backend()
            .list_orders(&auth.ctx.caller, query.page)
            .await?,
    ))
}

/// `GET /api/orders/{id}`
pub async fn order(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(
        state.backend().get_order(&auth.ctx.caller, order_id).await?,
    ))
}

// =============================================================================
// Addresses
// =============================================================================

/// `GET /api/addresses`
pub async fn addresses(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<KindQuery>,
) -> Result<Json<AddressList>> {
    let addresses = state
        .backend()
        .list_addresses(&auth.ctx.caller, query.kind)
        .await?;
    Ok(Json(AddressList {
        addresses,
        selected: None,
    }))
}

/// `POST /api/addresses`
///
/// Returns the refetched list of the new address's kind with the new
/// address preselected.
#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<NewAddress>,
) -> Result<Json<WithNotices<AddressList>>> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing address fields: {}",
            missing.join(", ")
        )));
    }

    let caller = &auth.ctx.caller;
    let created = state.backend().create_address(caller, &input).await?;
    let addresses = state
        .backend()
        .list_addresses(caller, Some(input.kind))
        .await?;

    Ok(Json(WithNotices::new(
        AddressList {
            addresses,
            selected: Some(created.id),
        },
        vec![Notice::success("Address saved")],
    )))
}

/// `PATCH /api/addresses/{id}`
pub async fn update_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<AddressId>,
    Json(patch): Json<AddressPatch>,
) -> Result<Json<WithNotices<Address>>> {
    let address = state
        .backend()
        .update_address(&auth.ctx.caller, id, &patch)
        .await?;
    Ok(Json(WithNotices::new(
        address,
        vec![Notice::success("Address updated")],
    )))
}

/// `DELETE /api/addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    state
        .backend()
        .delete_address(&auth.ctx.caller, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Billing profiles
// =============================================================================

/// `GET /api/billing-profiles`
pub async fn billing_profiles(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<BillingProfileList>> {
    let billing_profiles = state
        .backend()
        .list_billing_profiles(&auth.ctx.caller)
        .await?;
    Ok(Json(BillingProfileList {
        billing_profiles,
        selected: None,
    }))
}

/// `POST /api/billing-profiles`
#[instrument(skip_all)]
pub async fn create_billing_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<NewBillingProfile>,
) -> Result<Json<WithNotices<BillingProfileList>>> {
    let input = input.normalized();
    if input.document_number.is_empty() {
        return Err(AppError::BadRequest(
            "Document number is required".to_string(),
        ));
    }

    let caller = &auth.ctx.caller;
    let created = state.backend().create_billing_profile(caller, &input).await?;
    let billing_profiles = state.backend().list_billing_profiles(caller).await?;

    Ok(Json(WithNotices::new(
        BillingProfileList {
            billing_profiles,
            selected: Some(created.id),
        },
        vec![Notice::success("Billing details saved")],
    )))
}

/// `PATCH /api/billing-profiles/{id}`
pub async fn update_billing_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<BillingProfileId>,
    Json(patch): Json<BillingProfilePatch>,
) -> Result<Json<WithNotices<BillingProfile>>> {
    let profile = state
        .backend()
        .update_billing_profile(&auth.ctx.caller, id, &patch)
        .await?;
    Ok(Json(WithNotices::new(
        profile,
        vec![Notice::success("Billing details updated")],
    )))
}

/// `DELETE /api/billing-profiles/{id}`
pub async fn delete_billing_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<BillingProfileId>,
) -> Result<StatusCode> {
    state
        .backend()
        .delete_billing_profile(&auth.ctx.caller, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
