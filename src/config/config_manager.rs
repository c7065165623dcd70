// ==========================================
// Just Pressed 运营管理系统 - 配置管理器
// ==========================================
// 职责: 运行参数加载、查询、覆写、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::action_log::ActionLog;
use crate::domain::production::{bounded_tolerance, MAX_BALANCE_TOLERANCE};
use crate::repository::action_log_repo::ActionLogRepository;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 默认值
// ==========================================
pub const DEFAULT_CUSTOMER_PAGE_SIZE: i64 = 20;
pub const DEFAULT_IMAGE_MAX_BYTES: u64 = 2 * 1024 * 1024;
pub const DEFAULT_VIDEO_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_COUNTRY_CODE: &str = "+91";
pub const DEFAULT_DASHBOARD_LOOKBACK_DAYS: i64 = 365;
pub const DEFAULT_BALANCE_TOLERANCE: f64 = MAX_BALANCE_TOLERANCE;
pub const DEFAULT_SKU_SEARCH_LIMIT: i64 = 50;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 写入 global scope 配置并记录操作日志（单事务）
    pub fn set_global_config_logged(
        &self,
        key: &str,
        value: &str,
        log: &ActionLog,
    ) -> Result<(), Box<dyn Error>> {
        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        ActionLogRepository::insert_on(&tx, log)?;
        tx.commit()?;
        tracing::info!(config_key = key, value = value, actor = %log.actor, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取数值配置，格式错误时记录告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置（配置项与操作日志同一事务）
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(
        &self,
        snapshot_json: &str,
        log: &ActionLog,
    ) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;
        for (key, value) in &config_map {
            validate_config_value(key, value)?;
        }

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(count)
    }

    // ===== 客户 =====

    /// 客户列表分页大小（默认 20）
    pub fn get_customer_page_size(&self) -> Result<i64, Box<dyn Error>> {
        let v = self.get_parsed_or_default(
            config_keys::CUSTOMER_PAGE_SIZE,
            DEFAULT_CUSTOMER_PAGE_SIZE,
        )?;
        Ok(if v > 0 { v } else { DEFAULT_CUSTOMER_PAGE_SIZE })
    }

    /// 默认国家区号（默认 +91）
    pub fn get_default_country_code(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DEFAULT_COUNTRY_CODE, DEFAULT_COUNTRY_CODE)
    }

    // ===== 媒体 =====

    /// 图片大小上限（字节，默认 2 MiB）
    pub fn get_image_max_bytes(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::IMAGE_MAX_BYTES, DEFAULT_IMAGE_MAX_BYTES)
    }

    /// 视频大小上限（字节，默认 5 MiB）
    pub fn get_video_max_bytes(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::VIDEO_MAX_BYTES, DEFAULT_VIDEO_MAX_BYTES)
    }

    // ===== 生产 / 看板 =====

    /// 产出平衡校验容差（默认 1e-6，只能收紧不能放宽）
    pub fn get_balance_tolerance(&self) -> Result<f64, Box<dyn Error>> {
        let v = self.get_parsed_or_default(
            config_keys::BALANCE_TOLERANCE,
            DEFAULT_BALANCE_TOLERANCE,
        )?;
        let bounded = bounded_tolerance(v);
        if bounded != v {
            tracing::warn!(
                config_key = config_keys::BALANCE_TOLERANCE,
                configured = v,
                effective = bounded,
                "平衡容差超出允许范围，已收敛"
            );
        }
        Ok(bounded)
    }

    /// 看板自定义区间最大回溯天数（默认 365）
    pub fn get_dashboard_lookback_days(&self) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::DASHBOARD_LOOKBACK_DAYS,
            DEFAULT_DASHBOARD_LOOKBACK_DAYS,
        )
    }

    /// SKU 搜索结果上限（默认 50）
    pub fn get_sku_search_limit(&self) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::SKU_SEARCH_LIMIT, DEFAULT_SKU_SEARCH_LIMIT)
    }

    /// 读取全部运行参数（已应用默认值）
    pub fn load_settings(&self) -> Result<OpsSettings, Box<dyn Error>> {
        Ok(OpsSettings {
            customer_page_size: self.get_customer_page_size()?,
            default_country_code: self.get_default_country_code()?,
            image_max_bytes: self.get_image_max_bytes()?,
            video_max_bytes: self.get_video_max_bytes()?,
            balance_tolerance: self.get_balance_tolerance()?,
            dashboard_lookback_days: self.get_dashboard_lookback_days()?,
            sku_search_limit: self.get_sku_search_limit()?,
        })
    }
}

// ==========================================
// OpsSettings - 运行参数快照
// ==========================================
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OpsSettings {
    pub customer_page_size: i64,
    pub default_country_code: String,
    pub image_max_bytes: u64,
    pub video_max_bytes: u64,
    pub balance_tolerance: f64,
    pub dashboard_lookback_days: i64,
    pub sku_search_limit: i64,
}

impl Default for OpsSettings {
    fn default() -> Self {
        Self {
            customer_page_size: DEFAULT_CUSTOMER_PAGE_SIZE,
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            image_max_bytes: DEFAULT_IMAGE_MAX_BYTES,
            video_max_bytes: DEFAULT_VIDEO_MAX_BYTES,
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
            dashboard_lookback_days: DEFAULT_DASHBOARD_LOOKBACK_DAYS,
            sku_search_limit: DEFAULT_SKU_SEARCH_LIMIT,
        }
    }
}

/// 校验配置键与取值（未知键、格式错误、越界均拒绝）
pub fn validate_config_value(key: &str, value: &str) -> Result<(), String> {
    let v = value.trim();
    let ok = match key {
        config_keys::CUSTOMER_PAGE_SIZE
        | config_keys::DASHBOARD_LOOKBACK_DAYS
        | config_keys::SKU_SEARCH_LIMIT => v.parse::<i64>().map(|n| n > 0).unwrap_or(false),
        config_keys::IMAGE_MAX_BYTES | config_keys::VIDEO_MAX_BYTES => {
            v.parse::<u64>().map(|n| n > 0).unwrap_or(false)
        }
        config_keys::BALANCE_TOLERANCE => v
            .parse::<f64>()
            .map(|t| t.is_finite() && (0.0..=MAX_BALANCE_TOLERANCE).contains(&t))
            .unwrap_or(false),
        config_keys::DEFAULT_COUNTRY_CODE => {
            v.len() > 1 && v.starts_with('+') && v[1..].chars().all(|c| c.is_ascii_digit())
        }
        _ => return Err(format!("未知配置键: {}", key)),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("配置值无效: {}={}", key, value))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 客户
    pub const CUSTOMER_PAGE_SIZE: &str = "customer_page_size";
    pub const DEFAULT_COUNTRY_CODE: &str = "default_country_code";

    // 媒体
    pub const IMAGE_MAX_BYTES: &str = "media_image_max_bytes";
    pub const VIDEO_MAX_BYTES: &str = "media_video_max_bytes";

    // 生产
    pub const BALANCE_TOLERANCE: &str = "balance_tolerance";

    // 看板
    pub const DASHBOARD_LOOKBACK_DAYS: &str = "dashboard_lookback_days";

    // 目录
    pub const SKU_SEARCH_LIMIT: &str = "sku_search_limit";

    pub const ALL: &[&str] = &[
        CUSTOMER_PAGE_SIZE,
        DEFAULT_COUNTRY_CODE,
        IMAGE_MAX_BYTES,
        VIDEO_MAX_BYTES,
        BALANCE_TOLERANCE,
        DASHBOARD_LOOKBACK_DAYS,
        SKU_SEARCH_LIMIT,
    ];
}
