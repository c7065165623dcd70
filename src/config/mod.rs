// ==========================================
// Just Pressed 运营管理系统 - 配置层
// ==========================================
// 职责: 运行参数（config_kv 表）与进程级配置（环境变量）
// ==========================================

pub mod config_manager;
pub mod server_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, OpsSettings};
pub use server_config::{default_db_path, ServerConfig};
