// ==========================================
// Just Pressed 运营管理系统 - 退货领域模型
// ==========================================
// 红线: 任一明细处置为 Dispose 时必须附照片
// ==========================================

use crate::domain::types::{MediaKind, ReturnAction, ReturnCondition};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductReturn - 退货单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReturn {
    pub return_id: String,
    pub return_code: String, // RET-YYMMDD-NNNN
    pub received_location_id: String,
    pub order_id: Option<String>,
    pub awb_number: Option<String>,
    pub received_date: NaiveDate,
    pub received_at_ist: String,
    pub received_at_epoch: i64,
    pub received_by: String,
    pub remarks: Option<String>,
    pub photos: Vec<String>, // 媒体 URL
    pub videos: Vec<String>,
    pub items: Vec<ReturnItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub sku_id: String,
    pub quantity_returned: i64,
    pub physical_condition: ReturnCondition,
    pub action_taken: ReturnAction,
}

/// 明细中是否存在报废处置
pub fn requires_photos(items: &[ReturnItem]) -> bool {
    items.iter().any(|i| i.action_taken == ReturnAction::Dispose)
}

/// 退货编号: RET-YYMMDD-NNNN（日期为 IST）
pub fn return_code(ist_date: NaiveDate, suffix: u16) -> String {
    format!("RET-{}-{:04}", crate::clock::yymmdd(ist_date), suffix)
}

/// 退货媒体存储目录: returns/<退货编号>
pub fn media_folder(return_code: &str) -> String {
    format!("returns/{}", return_code)
}

// ==========================================
// MediaAsset - 待上传媒体的元信息
// ==========================================
// 上传本身由媒体服务完成，这里只做类型与大小校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl MediaAsset {
    /// MIME 前缀是否与期望媒体类型一致
    pub fn matches_kind(&self, kind: MediaKind) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with(kind.mime_prefix())
    }

    /// 以 MB 表示的大小（两位小数）
    pub fn size_mb_display(&self) -> String {
        format!("{:.2}", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code_and_folder() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let code = return_code(d, 1234);
        assert_eq!(code, "RET-260203-1234");
        assert_eq!(media_folder(&code), "returns/RET-260203-1234");
    }

    #[test]
    fn test_requires_photos() {
        let mut items = vec![ReturnItem {
            sku_id: "s1".into(),
            quantity_returned: 2,
            physical_condition: ReturnCondition::Ok,
            action_taken: ReturnAction::Restock,
        }];
        assert!(!requires_photos(&items));
        items.push(ReturnItem {
            sku_id: "s2".into(),
            quantity_returned: 1,
            physical_condition: ReturnCondition::Leakage,
            action_taken: ReturnAction::Dispose,
        });
        assert!(requires_photos(&items));
    }

    #[test]
    fn test_media_kind_match() {
        let asset = MediaAsset {
            file_name: "a.PNG".into(),
            mime_type: "Image/PNG".into(),
            size_bytes: 1_572_864,
        };
        assert!(asset.matches_kind(MediaKind::Image));
        assert!(!asset.matches_kind(MediaKind::Video));
        assert_eq!(asset.size_mb_display(), "1.50");
    }
}
