// ==========================================
// Just Pressed 运营管理系统 - 应用层
// ==========================================
// 职责: HTTP 集成（axum），连接前端与后端
// ==========================================

pub mod http_routes;
pub mod state;

// 重导出
pub use crate::config::default_db_path;
pub use http_routes::build_router;
pub use state::AppState;
