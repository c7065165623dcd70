use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::{
    ProductionOverview, RecordBottlingRequest, StartExtractionRequest, StartFilteringRequest,
};
use crate::app::state::AppState;
use crate::domain::master::{Machine, RawMaterial};
use crate::domain::production::{
    BottlingEntry, FilteringEntry, ProductionBatch, RunningBatchView, RunningFilterView,
};

use super::common::{actor_of, blocking, map_api_error, HttpResult};

// ==========================================
// 生产跟踪：榨油 / 过滤 / 灌装
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/production/overview", get(overview))
        .route("/api/production/seeds", get(list_seeds))
        .route("/api/production/machines", get(list_press_machines))
        .route("/api/production/running-batches", get(list_running_batches))
        .route("/api/production/batches", post(start_extraction))
        .route("/api/production/batches/:id", get(get_batch))
        .route("/api/production/batches/:id/stop", post(stop_extraction))
        .route("/api/production/running-filters", get(list_running_filters))
        .route("/api/production/filters", post(start_filtering))
        .route("/api/production/filters/:id/stop", post(stop_filtering))
        .route("/api/production/bottling", post(record_bottling))
        .route("/api/production/bottling/:id", get(get_bottling))
}

#[derive(Debug, Deserialize)]
pub(super) struct StopExtractionBody {
    oil_output_qty: f64,
    cake_output_qty: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct StopFilteringBody {
    filtered_oil_kg: f64,
}

async fn overview(State(state): State<AppState>) -> HttpResult<ProductionOverview> {
    blocking(move || state.production_api.overview().map_err(map_api_error)).await
}

async fn list_seeds(State(state): State<AppState>) -> HttpResult<Vec<RawMaterial>> {
    blocking(move || state.production_api.list_seeds().map_err(map_api_error)).await
}

async fn list_press_machines(State(state): State<AppState>) -> HttpResult<Vec<Machine>> {
    blocking(move || {
        state
            .production_api
            .list_press_machines()
            .map_err(map_api_error)
    })
    .await
}

async fn list_running_batches(State(state): State<AppState>) -> HttpResult<Vec<RunningBatchView>> {
    blocking(move || {
        state
            .production_api
            .list_running_batches()
            .map_err(map_api_error)
    })
    .await
}

async fn start_extraction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartExtractionRequest>,
) -> HttpResult<ProductionBatch> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .production_api
            .start_extraction(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<ProductionBatch> {
    blocking(move || state.production_api.get_batch(&id).map_err(map_api_error)).await
}

async fn stop_extraction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StopExtractionBody>,
) -> HttpResult<ProductionBatch> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .production_api
            .stop_extraction(&id, body.oil_output_qty, body.cake_output_qty, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn list_running_filters(
    State(state): State<AppState>,
) -> HttpResult<Vec<RunningFilterView>> {
    blocking(move || {
        state
            .production_api
            .list_running_filters()
            .map_err(map_api_error)
    })
    .await
}

async fn start_filtering(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartFilteringRequest>,
) -> HttpResult<FilteringEntry> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .production_api
            .start_filtering(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn stop_filtering(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StopFilteringBody>,
) -> HttpResult<FilteringEntry> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .production_api
            .stop_filtering(&id, body.filtered_oil_kg, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn record_bottling(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecordBottlingRequest>,
) -> HttpResult<BottlingEntry> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .production_api
            .record_bottling(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn get_bottling(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<BottlingEntry> {
    blocking(move || state.production_api.get_bottling(&id).map_err(map_api_error)).await
}
