use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::api::DashboardQuery;
use crate::app::state::AppState;
use crate::domain::action_log::ActionLog;
use crate::domain::dashboard::ProductionDashboard;

use super::common::{blocking, map_api_error, HttpResult};

// ==========================================
// 生产看板与审计查询
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/production", get(production_dashboard))
        .route("/api/dashboard/recent-actions", get(recent_actions))
        .route("/api/audit/logs", get(action_logs_in_range))
        .route("/api/audit/logs/:id", get(action_log))
        .route(
            "/api/audit/entities/:entity_type/:entity_id",
            get(entity_history),
        )
        .route("/api/audit/actors/:actor", get(actions_by_actor))
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    limit: Option<i32>,
}

/// UTC 时间，格式 2026-02-03T04:30:00
#[derive(Debug, Deserialize)]
pub(super) struct TimeRangeQuery {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

/// ?preset=7d 或 ?from=2026-01-01&to=2026-01-31
async fn production_dashboard(
    State(state): State<AppState>,
    Query(q): Query<DashboardQuery>,
) -> HttpResult<ProductionDashboard> {
    blocking(move || {
        state
            .dashboard_api
            .get_production_dashboard(&q)
            .map_err(map_api_error)
    })
    .await
}

async fn recent_actions(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> HttpResult<Vec<ActionLog>> {
    blocking(move || {
        state
            .dashboard_api
            .get_recent_actions(q.limit.unwrap_or(50))
            .map_err(map_api_error)
    })
    .await
}

async fn action_logs_in_range(
    State(state): State<AppState>,
    Query(q): Query<TimeRangeQuery>,
) -> HttpResult<Vec<ActionLog>> {
    blocking(move || {
        state
            .dashboard_api
            .list_action_logs(q.from, q.to)
            .map_err(map_api_error)
    })
    .await
}

async fn action_log(State(state): State<AppState>, Path(id): Path<String>) -> HttpResult<ActionLog> {
    blocking(move || state.dashboard_api.get_action_log(&id).map_err(map_api_error)).await
}

async fn entity_history(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> HttpResult<Vec<ActionLog>> {
    blocking(move || {
        state
            .dashboard_api
            .list_entity_history(&entity_type, &entity_id)
            .map_err(map_api_error)
    })
    .await
}

async fn actions_by_actor(
    State(state): State<AppState>,
    Path(actor): Path<String>,
    Query(q): Query<RecentQuery>,
) -> HttpResult<Vec<ActionLog>> {
    blocking(move || {
        state
            .dashboard_api
            .list_actions_by_actor(&actor, q.limit.unwrap_or(50))
            .map_err(map_api_error)
    })
    .await
}
