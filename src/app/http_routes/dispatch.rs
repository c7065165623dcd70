use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::CreateDispatchRequest;
use crate::app::state::AppState;
use crate::domain::dispatch::Dispatch;

use super::common::{actor_of, blocking, map_api_error, HttpResult};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dispatches", get(list_recent).post(create_dispatch))
        .route("/api/dispatches/:id", get(get_dispatch))
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    limit: Option<i64>,
}

async fn list_recent(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> HttpResult<Vec<Dispatch>> {
    blocking(move || {
        state
            .dispatch_api
            .list_recent(q.limit.unwrap_or(50))
            .map_err(map_api_error)
    })
    .await
}

async fn create_dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDispatchRequest>,
) -> HttpResult<Dispatch> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .dispatch_api
            .create_dispatch(&req, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn get_dispatch(State(state): State<AppState>, Path(id): Path<String>) -> HttpResult<Dispatch> {
    blocking(move || state.dispatch_api.get_dispatch(&id).map_err(map_api_error)).await
}
