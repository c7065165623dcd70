use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::{SendTransferRequest, SendTransferResponse, VerifyTransferRequest};
use crate::app::state::AppState;
use crate::domain::stock_movement::{PendingTransferView, StockMovement, TransferItemView};

use super::common::{actor_of, blocking, map_api_error, HttpResult};

// ==========================================
// 库间调拨
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stock-movements", get(list_pending).post(send_transfer))
        .route("/api/stock-movements/:id", get(get_transfer))
        .route("/api/stock-movements/:id/items", get(items_of_transfer))
        .route("/api/stock-movements/:id/verify", post(verify_transfer))
}

/// 待验收调拨
async fn list_pending(State(state): State<AppState>) -> HttpResult<Vec<PendingTransferView>> {
    blocking(move || state.stock_movement_api.list_pending().map_err(map_api_error)).await
}

async fn send_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendTransferRequest>,
) -> HttpResult<SendTransferResponse> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .stock_movement_api
            .send_transfer(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<StockMovement> {
    blocking(move || {
        state
            .stock_movement_api
            .get_transfer(&id)
            .map_err(map_api_error)
    })
    .await
}

async fn items_of_transfer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<Vec<TransferItemView>> {
    blocking(move || {
        state
            .stock_movement_api
            .items_of_transfer(&id)
            .map_err(map_api_error)
    })
    .await
}

async fn verify_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<VerifyTransferRequest>,
) -> HttpResult<StockMovement> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .stock_movement_api
            .verify_transfer(&id, &req, &actor)
            .map_err(map_api_error)?;
        state
            .stock_movement_api
            .get_transfer(&id)
            .map_err(map_api_error)
    })
    .await
}
