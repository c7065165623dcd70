use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::{CreateReturnRequest, ReturnMediaSlot};
use crate::app::state::AppState;
use crate::domain::returns::{MediaAsset, ProductReturn};
use crate::domain::types::MediaKind;

use super::common::{actor_of, blocking, map_api_error, HttpResult};

// ==========================================
// 退货与媒体校验
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/returns", post(create_return))
        .route("/api/returns/:id", get(get_return))
        .route("/api/return-codes/:code", get(get_return_by_code))
        .route("/api/return-media/slot", post(reserve_media_slot))
        .route("/api/return-media/validate", post(validate_media))
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateReturnBody {
    #[serde(flatten)]
    request: CreateReturnRequest,
    /// 上传媒体时预留的编号
    return_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MediaCheckBody {
    kind: MediaKind,
    assets: Vec<MediaAsset>,
}

async fn create_return(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateReturnBody>,
) -> HttpResult<ProductReturn> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .return_api
            .create_return(&body.request, body.return_code.as_deref(), &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<ProductReturn> {
    blocking(move || state.return_api.get_return(&id).map_err(map_api_error)).await
}

async fn get_return_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> HttpResult<ProductReturn> {
    blocking(move || {
        state
            .return_api
            .get_return_by_code(&code)
            .map_err(map_api_error)
    })
    .await
}

async fn reserve_media_slot(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult<ReturnMediaSlot> {
    blocking(move || {
        actor_of(&state, &headers)?;
        Ok(state.return_api.reserve_media_slot())
    })
    .await
}

async fn validate_media(
    State(state): State<AppState>,
    Json(body): Json<MediaCheckBody>,
) -> HttpResult<serde_json::Value> {
    blocking(move || {
        state
            .return_api
            .validate_media(&body.assets, body.kind)
            .map_err(map_api_error)?;
        Ok(serde_json::json!({ "ok": true, "count": body.assets.len() }))
    })
    .await
}
