// ==========================================
// Just Pressed 运营管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪（按实体 / 按操作人查询）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,  // 操作时间戳 (UTC)
    pub actor: String,             // 操作人 (user_id)

    // ===== 关联实体 =====
    pub entity_type: String, // 实体类型: customer / production_batch / ...
    pub entity_id: String,   // 实体主键

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    CreateTag,
    StartExtraction,
    StopExtraction,
    StartFiltering,
    StopFiltering,
    RecordBottling,
    SendTransfer,
    VerifyTransfer,
    CreateDispatch,
    CreateReturn,
    UpdateConfig,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateCustomer => "CreateCustomer",
            ActionType::UpdateCustomer => "UpdateCustomer",
            ActionType::DeleteCustomer => "DeleteCustomer",
            ActionType::CreateTag => "CreateTag",
            ActionType::StartExtraction => "StartExtraction",
            ActionType::StopExtraction => "StopExtraction",
            ActionType::StartFiltering => "StartFiltering",
            ActionType::StopFiltering => "StopFiltering",
            ActionType::RecordBottling => "RecordBottling",
            ActionType::SendTransfer => "SendTransfer",
            ActionType::VerifyTransfer => "VerifyTransfer",
            ActionType::CreateDispatch => "CreateDispatch",
            ActionType::CreateReturn => "CreateReturn",
            ActionType::UpdateConfig => "UpdateConfig",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateCustomer" => Some(ActionType::CreateCustomer),
            "UpdateCustomer" => Some(ActionType::UpdateCustomer),
            "DeleteCustomer" => Some(ActionType::DeleteCustomer),
            "CreateTag" => Some(ActionType::CreateTag),
            "StartExtraction" => Some(ActionType::StartExtraction),
            "StopExtraction" => Some(ActionType::StopExtraction),
            "StartFiltering" => Some(ActionType::StartFiltering),
            "StopFiltering" => Some(ActionType::StopFiltering),
            "RecordBottling" => Some(ActionType::RecordBottling),
            "SendTransfer" => Some(ActionType::SendTransfer),
            "VerifyTransfer" => Some(ActionType::VerifyTransfer),
            "CreateDispatch" => Some(ActionType::CreateDispatch),
            "CreateReturn" => Some(ActionType::CreateReturn),
            "UpdateConfig" => Some(ActionType::UpdateConfig),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志（ID 自动生成）
    ///
    /// # 参数
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    /// - `entity_type` / `entity_id`: 关联实体
    pub fn new(action_type: ActionType, actor: &str, entity_type: &str, entity_id: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trip_names() {
        assert_eq!(
            ActionType::from_str(ActionType::VerifyTransfer.as_str()),
            Some(ActionType::VerifyTransfer)
        );
        assert_eq!(ActionType::from_str("Recalc"), None);
    }

    #[test]
    fn test_builder() {
        let log = ActionLog::new(ActionType::StopExtraction, "u1", "production_batch", "BP-1")
            .with_payload(&serde_json::json!({"oil": 60.0}))
            .with_detail("done");
        assert_eq!(log.action_type, "StopExtraction");
        assert_eq!(log.payload_json.unwrap()["oil"], 60.0);
        assert_eq!(log.entity_id, "BP-1");
    }
}
