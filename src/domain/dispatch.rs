// ==========================================
// Just Pressed 运营管理系统 - 发货领域模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub dispatch_id: String,
    pub from_location_id: String,
    pub shipped_to: String, // 自由文本: 客户/渠道/地点
    pub dispatch_date: NaiveDate,
    pub dispatched_at_ist: String,
    pub dispatched_at_epoch: i64,
    pub dispatched_by: String,
    pub remarks: Option<String>,
    pub items: Vec<DispatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchItem {
    pub sku_id: String,
    pub quantity_dispatched: i64,
}

impl Dispatch {
    /// 发货总件数
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity_dispatched).sum()
    }
}
