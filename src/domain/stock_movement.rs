// ==========================================
// Just Pressed 运营管理系统 - 库间调拨领域模型
// ==========================================
// 状态机: pending（发出）→ verified（收货验收，终态）
// ==========================================

use crate::domain::types::{TransferReason, TransferStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// StockMovement - 调拨单头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub movement_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub status: TransferStatus,
    pub sent_by: String,
    pub sent_at_ist: String,
    pub sent_at_epoch: i64,
    pub notes: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at_ist: Option<String>,
    pub verified_at_epoch: Option<i64>,
    pub verify_remarks: Option<String>,
    pub is_deleted: bool,
}

// ==========================================
// StockMovementItem - 调拨明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovementItem {
    pub item_id: i64,
    pub movement_id: String,
    pub sku_id: String,
    pub qty_sent: i64,
    pub reason: TransferReason,
    pub qty_received: Option<i64>,
}

/// 发出时的明细行（尚无 item_id）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransferLine {
    pub sku_id: String,
    pub qty_sent: i64,
    pub reason: TransferReason,
}

/// 验收时的单行实收数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedQty {
    pub item_id: i64,
    pub qty_received: i64,
}

// ==========================================
// 待验收列表视图（已连表）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransferView {
    pub movement_id: String,
    pub friendly_code: String,
    pub from_location_id: String,
    pub from_location_name: String,
    pub from_location_code: String,
    pub to_location_id: String,
    pub to_location_name: String,
    pub to_location_code: String,
    pub sent_by: String,
    pub sent_at_ist: String,
    pub sent_at_epoch: i64,
    pub notes: Option<String>,
    pub item_count: i64,
}

/// 验收界面明细（qty_received 预填为 qty_sent）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItemView {
    pub item_id: i64,
    pub sku_id: String,
    pub sku_code: String,
    pub product_name: String,
    pub qty_sent: i64,
    pub reason: TransferReason,
    pub qty_received: i64,
}

/// 友好编号: DDMMYY_FromCode_ToCode_N
///
/// N 为同一天（IST）同一对地点之间的第 N 次调拨（从 1 开始）。
pub fn friendly_code(sent_date_ist: NaiveDate, from_code: &str, to_code: &str, serial: i64) -> String {
    let from = if from_code.trim().is_empty() { "From" } else { from_code.trim() };
    let to = if to_code.trim().is_empty() { "To" } else { to_code.trim() };
    format!("{}_{}_{}_{}", crate::clock::ddmmyy(sent_date_ist), from, to, serial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_code() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        assert_eq!(friendly_code(d, "WH1", "ST2", 3), "030226_WH1_ST2_3");
        assert_eq!(friendly_code(d, "", "ST2", 1), "030226_From_ST2_1");
    }
}
