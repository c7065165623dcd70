// ==========================================
// Just Pressed 运营管理系统 - 用户与模块权限
// ==========================================

use serde::{Deserialize, Serialize};

/// 已上线模块的 module_key
pub const LIVE_MODULE_KEYS: [&str; 4] = [
    "production_tracking",
    "stock_movement",
    "dashboard_production",
    "dispatch",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub employee_id: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
}

/// 用户可见模块（权限 + 模块元数据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserModule {
    pub module_id: String,
    pub module_key: String,
    pub module_name: String,
    pub icon: Option<String>,
    pub display_order: i64,
    pub can_view: bool,
    pub can_write: bool,
    pub can_edit: bool,
}

impl UserModule {
    pub fn is_live(&self) -> bool {
        LIVE_MODULE_KEYS.contains(&self.module_key.as_str())
    }

    /// 前端路由: production_tracking → /production-tracking
    pub fn route_path(&self) -> String {
        format!("/{}", self.module_key.replace('_', "-"))
    }
}

/// 按是否上线划分（保持原顺序）
pub fn partition_live(modules: Vec<UserModule>) -> (Vec<UserModule>, Vec<UserModule>) {
    modules.into_iter().partition(UserModule::is_live)
}
