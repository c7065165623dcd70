// ==========================================
// Just Pressed 运营管理系统 - 运行参数 API
// ==========================================
// 职责: 参数查询、单项更新、快照导出与恢复
// 写入: 配置项与 UpdateConfig 日志同一事务
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::validate_config_value;
use crate::config::{ConfigManager, OpsSettings};
use crate::domain::action_log::{ActionLog, ActionType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    pub key: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreSnapshotRequest {
    pub snapshot_json: String,
    pub reason: String,
}

/// 运行参数 API
///
/// 读取走 ConfigManager 的默认值回退；写入只接受已知键与合法取值
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 当前生效的全部参数
    pub fn get_settings(&self) -> ApiResult<OpsSettings> {
        self.config_manager
            .load_settings()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 更新单个参数
    ///
    /// # 返回
    /// - Err(InvalidInput): 原因为空、未知键或取值不合法
    pub fn update_config(&self, req: &UpdateConfigRequest, actor: &str) -> ApiResult<OpsSettings> {
        let key = req.key.trim();
        let value = req.value.trim();
        if req.reason.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作原因不能为空".to_string()));
        }
        validate_config_value(key, value).map_err(ApiError::InvalidInput)?;

        let previous = self
            .config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let log = ActionLog::new(ActionType::UpdateConfig, actor, "config", key)
            .with_payload(&serde_json::json!({
                "key": key,
                "value": value,
                "previous": previous,
                "reason": req.reason.trim(),
            }))
            .with_detail(format!("更新配置: {}={}", key, value));
        self.config_manager
            .set_global_config_logged(key, value, &log)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        self.get_settings()
    }

    /// 导出已覆写参数的快照（JSON 对象，键 → 值）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 从快照恢复
    ///
    /// 快照中任一键或值不合法时整体拒绝
    ///
    /// # 返回
    /// - Ok(usize): 恢复的参数个数
    pub fn restore_from_snapshot(&self, req: &RestoreSnapshotRequest, actor: &str) -> ApiResult<usize> {
        if req.reason.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作原因不能为空".to_string()));
        }
        let entries: std::collections::HashMap<String, String> =
            serde_json::from_str(&req.snapshot_json)
                .map_err(|e| ApiError::InvalidInput(format!("快照格式错误: {}", e)))?;
        for (key, value) in &entries {
            validate_config_value(key, value).map_err(ApiError::InvalidInput)?;
        }

        let log = ActionLog::new(ActionType::UpdateConfig, actor, "config", "snapshot")
            .with_payload(&serde_json::json!({
                "snapshot": entries,
                "reason": req.reason.trim(),
            }))
            .with_detail(format!("从快照恢复 {} 项配置", entries.len()));
        let count = self
            .config_manager
            .restore_config_from_snapshot(&req.snapshot_json, &log)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        tracing::info!(count, actor, "配置已从快照恢复");
        Ok(count)
    }
}
