use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::{RestoreSnapshotRequest, UpdateConfigRequest};
use crate::app::state::AppState;
use crate::config::OpsSettings;

use super::common::{actor_of, blocking, map_api_error, HttpResult};

// ==========================================
// 运行参数
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_config))
        .route(
            "/api/settings/snapshot",
            get(get_snapshot).post(restore_snapshot),
        )
}

async fn get_settings(State(state): State<AppState>) -> HttpResult<OpsSettings> {
    blocking(move || state.config_api.get_settings().map_err(map_api_error)).await
}

async fn update_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateConfigRequest>,
) -> HttpResult<OpsSettings> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .config_api
            .update_config(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

/// 快照以字符串返回，恢复时原样回传
async fn get_snapshot(State(state): State<AppState>) -> HttpResult<serde_json::Value> {
    blocking(move || {
        let snapshot = state.config_api.get_config_snapshot().map_err(map_api_error)?;
        Ok(serde_json::json!({ "snapshot_json": snapshot }))
    })
    .await
}

async fn restore_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RestoreSnapshotRequest>,
) -> HttpResult<serde_json::Value> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        let restored = state
            .config_api
            .restore_from_snapshot(&req, &actor)
            .map_err(map_api_error)?;
        Ok(serde_json::json!({ "restored": restored }))
    })
    .await
}
