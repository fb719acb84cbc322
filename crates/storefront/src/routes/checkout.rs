//! Checkout route handlers.
//!
//! ```text
//! POST /api/checkout                                - Create an order from the cart
//! GET  /api/checkout                                - Current checkout state
//! GET  /api/checkout/{order_id}                     - Load options, apply defaults
//! PUT  /api/checkout/{order_id}/shipping-address    - Select + patch shipping address
//! PUT  /api/checkout/{order_id}/billing-address     - Select billing address (local)
//! PUT  /api/checkout/{order_id}/billing-profile     - Select + patch billing profile
//! PUT  /api/checkout/{order_id}/payment-method      - Select + patch payment method
//! POST /api/checkout/{order_id}/addresses           - Create, preselect and apply an address
//! POST /api/checkout/{order_id}/billing-profiles    - Create, preselect and apply a profile
//! POST /api/checkout/{order_id}/confirm             - Confirm and hand off to payment
//! GET  /checkout/result/{status}                    - Payment processor return page
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use vitrina_core::{
    AddressId, BillingProfileId, CheckoutOutcome, NewAddress, NewBillingProfile, OrderId,
    PaymentChoice,
};

use crate::checkout::result::{CheckoutResult, reconcile};
use crate::error::{AppError, Result};
use crate::middleware::SessionContext;
use crate::services::{CheckoutView, ConfirmOutcome, WithNotices};
use crate::state::AppState;

/// Body for the address selection routes.
#[derive(Debug, Deserialize)]
pub struct AddressSelection {
    pub address_id: AddressId,
}

/// Body for `PUT .../billing-profile`.
#[derive(Debug, Deserialize)]
pub struct BillingProfileSelection {
    pub billing_profile_id: BillingProfileId,
}

/// Body for `PUT .../payment-method`.
#[derive(Debug, Deserialize)]
pub struct PaymentSelection {
    pub choice: PaymentChoice,
}

type CheckoutResponse = Result<Json<WithNotices<CheckoutView>>>;

/// `POST /api/checkout`
pub async fn start(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<CheckoutView>> {
    Ok(Json(state.checkout(&ctx).await.start().await?))
}

/// `GET /api/checkout`
pub async fn current(State(state): State<AppState>, ctx: SessionContext) -> Json<CheckoutView> {
    Json(state.checkout(&ctx).await.current().await)
}

/// `GET /api/checkout/{order_id}`
pub async fn load(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
) -> CheckoutResponse {
    Ok(Json(state.checkout(&ctx).await.load(order_id).await?))
}

/// `PUT /api/checkout/{order_id}/shipping-address`
pub async fn shipping_address(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(body): Json<AddressSelection>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(
        checkout
            .select_shipping_address(order_id, body.address_id)
            .await?,
    ))
}

/// `PUT /api/checkout/{order_id}/billing-address`
pub async fn billing_address(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(body): Json<AddressSelection>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(
        checkout
            .select_billing_address(order_id, body.address_id)
            .await?,
    ))
}

/// `PUT /api/checkout/{order_id}/billing-profile`
pub async fn billing_profile(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(body): Json<BillingProfileSelection>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(
        checkout
            .select_billing_profile(order_id, body.billing_profile_id)
            .await?,
    ))
}

/// `PUT /api/checkout/{order_id}/payment-method`
pub async fn payment_method(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(body): Json<PaymentSelection>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(checkout.select_payment(order_id, body.choice).await?))
}

/// `POST /api/checkout/{order_id}/addresses`
pub async fn create_address(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(address): Json<NewAddress>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(checkout.create_address(order_id, &address).await?))
}

/// `POST /api/checkout/{order_id}/billing-profiles`
pub async fn create_billing_profile(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
    Json(profile): Json<NewBillingProfile>,
) -> CheckoutResponse {
    let checkout = state.checkout(&ctx).await;
    Ok(Json(checkout.create_billing_profile(order_id, profile).await?))
}

/// `POST /api/checkout/{order_id}/confirm`
pub async fn confirm(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ConfirmOutcome>> {
    Ok(Json(state.checkout(&ctx).await.confirm(order_id).await?))
}

/// `GET /checkout/result/{status}`
///
/// The query string is whatever the payment processor appended; every
/// pair is kept so the order reference can be found in any of them.
pub async fn result(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(status): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<CheckoutResult>> {
    let route_status: CheckoutOutcome = status
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown checkout result: {status}")))?;
    Ok(Json(
        reconcile(state.backend(), &ctx.caller, route_status, &params).await,
    ))
}
