//! Client store snapshot and UI selections.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::middleware::SessionContext;
use crate::state::AppState;
use crate::store::{Action, StoreState, UiSlice};

/// Body of `PUT /api/ui/quick-view`.
#[derive(Debug, Deserialize)]
pub struct QuickView {
    pub slug: String,
}

/// Body of `PUT /api/ui/preview-slider`.
#[derive(Debug, Deserialize)]
pub struct PreviewSlide {
    pub slide: u32,
}

/// `GET /api/store`: the whole serialized store.
pub async fn snapshot(State(state): State<AppState>, ctx: SessionContext) -> Json<StoreState> {
    let store = state.store(&ctx).await;
    let snapshot = store.lock().await.state().clone();
    Json(snapshot)
}

async fn dispatch_ui(state: &AppState, ctx: &SessionContext, action: Action) -> UiSlice {
    let store = state.store(ctx).await;
    let mut store = store.lock().await;
    store.dispatch(action);
    store.state().ui.clone()
}

/// `PUT /api/ui/quick-view`
pub async fn open_quick_view(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(body): Json<QuickView>,
) -> Json<UiSlice> {
    Json(dispatch_ui(&state, &ctx, Action::QuickViewOpened(body.slug)).await)
}

/// `DELETE /api/ui/quick-view`
pub async fn close_quick_view(State(state): State<AppState>, ctx: SessionContext) -> Json<UiSlice> {
    Json(dispatch_ui(&state, &ctx, Action::QuickViewClosed).await)
}

/// `PUT /api/ui/preview-slider`
pub async fn preview_slide(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(body): Json<PreviewSlide>,
) -> Json<UiSlice> {
    Json(dispatch_ui(&state, &ctx, Action::PreviewSlid(body.slide)).await)
}
