// ==========================================
// Just Pressed 运营管理系统 - 客户领域模型
// ==========================================
// 红线: 非删除客户中手机号唯一（重复需人工确认）
// 删除: 仅软删除 (is_deleted)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Customer - 客户档案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub customer_name: String,
    pub country_code: String,
    pub phone: Option<String>,
    pub pincode: Option<String>,

    // ===== 地址 =====
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub lat_long: Option<String>,
    pub google_maps_code: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,

    pub tags: Vec<String>, // 标签ID列表
    pub notes: Option<String>,

    // ===== 状态 =====
    pub is_active: bool,
    pub is_deleted: bool,

    // ===== 审计 =====
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// CustomerDraft - 表单提交数据（已清洗）
// ==========================================
// 所有文本字段已 trim，空串已转为 None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub customer_name: String,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub lat_long: Option<String>,
    pub google_maps_code: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl CustomerDraft {
    /// 清洗所有文本字段: trim，空串 → None
    pub fn normalized(self) -> Self {
        Self {
            customer_name: self.customer_name.trim().to_string(),
            country_code: normalize_optional(self.country_code),
            phone: normalize_optional(self.phone),
            pincode: normalize_optional(self.pincode),
            address_line1: normalize_optional(self.address_line1),
            address_line2: normalize_optional(self.address_line2),
            lat_long: normalize_optional(self.lat_long),
            google_maps_code: normalize_optional(self.google_maps_code),
            landmark: normalize_optional(self.landmark),
            city: normalize_optional(self.city),
            state: normalize_optional(self.state),
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            notes: normalize_optional(self.notes),
        }
    }
}

/// trim 后为空的字符串视为未填写
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ==========================================
// CustomerTag - 客户标签
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTag {
    pub tag_id: String,
    pub tag_name: String,
    pub tag_color: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// 标签颜色轮换表（按现有激活标签数取模）
pub const TAG_COLOR_ROTATION: [&str; 10] = [
    "#3B82F6", // blue
    "#10B981", // green
    "#8B5CF6", // purple
    "#F59E0B", // amber
    "#EF4444", // red
    "#EC4899", // pink
    "#06B6D4", // cyan
    "#84CC16", // lime
    "#F97316", // orange
    "#6366F1", // indigo
];

/// 根据现有激活标签数分配颜色
pub fn tag_color_for_count(active_tag_count: i64) -> &'static str {
    let idx = active_tag_count.rem_euclid(TAG_COLOR_ROTATION.len() as i64) as usize;
    TAG_COLOR_ROTATION[idx]
}

// ==========================================
// 格式谓词
// ==========================================

/// 手机号: 恰好 10 位数字
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit())
}

/// 邮编: 恰好 6 位数字
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit())
}

// ==========================================
// 列表查询结果
// ==========================================

/// 搜索命中方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Phone,
    Name,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub page: i64,
    pub page_size: i64,
    pub has_more: bool,
    pub match_type: Option<MatchType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_and_pincode_formats() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("98765432100"));
        assert!(!is_valid_phone("98765x3210"));

        assert!(is_valid_pincode("560001"));
        assert!(!is_valid_pincode("56001"));
        assert!(!is_valid_pincode("5600011"));
    }

    #[test]
    fn test_tag_color_rotation_wraps() {
        assert_eq!(tag_color_for_count(0), "#3B82F6");
        assert_eq!(tag_color_for_count(4), "#EF4444");
        assert_eq!(tag_color_for_count(10), "#3B82F6");
        assert_eq!(tag_color_for_count(19), "#6366F1");
    }

    #[test]
    fn test_draft_normalization() {
        let draft = CustomerDraft {
            customer_name: "  Asha Rao ".to_string(),
            phone: Some(" 9876543210 ".to_string()),
            city: Some("   ".to_string()),
            tags: vec![" t1 ".to_string(), "".to_string()],
            ..Default::default()
        }
        .normalized();

        assert_eq!(draft.customer_name, "Asha Rao");
        assert_eq!(draft.phone.as_deref(), Some("9876543210"));
        assert_eq!(draft.city, None);
        assert_eq!(draft.tags, vec!["t1".to_string()]);
    }
}
