// ==========================================
// Just Pressed 运营管理系统 - HTTP 路由（按域拆分）
// ==========================================
// 职责: axum 处理函数，连接前端与后端 API
// 约定: 写操作需要 x-user-id 请求头（未知用户 → 401）
// ==========================================

mod catalog;
mod common;
mod config;
mod customer;
mod dashboard;
mod dispatch;
mod production;
mod returns;
mod stock_movement;
mod user;

use axum::{routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::app::state::AppState;

pub use common::{map_api_error, ErrorResponse, USER_HEADER};

/// 组装全部路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(customer::router())
        .merge(production::router())
        .merge(stock_movement::router())
        .merge(dispatch::router())
        .merge(returns::router())
        .merge(dashboard::router())
        .merge(catalog::router())
        .merge(user::router())
        .merge(config::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "app": crate::APP_NAME,
        "version": crate::VERSION,
    }))
}
