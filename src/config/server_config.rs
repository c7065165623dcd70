// ==========================================
// 进程级配置（环境变量）
// ==========================================
// - JP_OPS_DB_PATH: 数据库文件路径（缺省为用户数据目录）
// - JP_OPS_BIND_ADDR: HTTP 监听地址（缺省 127.0.0.1:8080）
// ==========================================

use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "JP_OPS_DB_PATH";
pub const ENV_BIND_ADDR: &str = "JP_OPS_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DB_FILE_NAME: &str = "just_pressed_ops.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind_addr: String,
}

impl ServerConfig {
    /// 从环境变量读取
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key 查找函数读取（便于测试，不污染进程环境）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(ENV_DB_PATH)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_db_path);

        let bind_addr = lookup(ENV_BIND_ADDR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Self { db_path, bind_addr }
    }
}

/// 默认数据库路径: <用户数据目录>/just-pressed-ops/just_pressed_ops.db
///
/// 用户数据目录不可用时退回当前目录。
pub fn default_db_path() -> String {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("just-pressed-ops");

    if let Err(e) = std::fs::create_dir_all(&path) {
        tracing::warn!("创建数据目录失败 {}: {}", path.display(), e);
    }

    path.push(DB_FILE_NAME);
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_overrides() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            ENV_DB_PATH => Some("/tmp/ops.db".to_string()),
            ENV_BIND_ADDR => Some("0.0.0.0:9000".to_string()),
            _ => None,
        });
        assert_eq!(cfg.db_path, "/tmp/ops.db");
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_blank_bind_addr_uses_default() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            ENV_DB_PATH => Some("/tmp/ops.db".to_string()),
            ENV_BIND_ADDR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
    }
}
