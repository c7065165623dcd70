// ==========================================
// Just Pressed 运营管理系统 - HTTP 服务主入口
// ==========================================
// 技术栈: axum + tokio + SQLite
// 环境变量见 config::server_config
// ==========================================

use std::process::ExitCode;

use just_pressed_ops::app::{build_router, AppState};
use just_pressed_ops::config::ServerConfig;
use just_pressed_ops::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", just_pressed_ops::APP_NAME);
    tracing::info!("系统版本: {}", just_pressed_ops::VERSION);
    tracing::info!("==================================================");

    let config = ServerConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);

    let state = match AppState::new(config.db_path.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("监听 {} 失败: {}", config.bind_addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP 服务异常退出: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
