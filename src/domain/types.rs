// ==========================================
// Just Pressed 运营管理系统 - 领域类型定义
// ==========================================
// 所有枚举提供 to_db_str / from_str，与数据库存储字符串一一对应
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 榨油批次状态 (Batch Status)
// ==========================================
// 状态机: in_progress → completed（终态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress, // 榨油中
    Completed,  // 已完成
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BatchStatus {
    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in_progress" => Some(BatchStatus::InProgress),
            "completed" => Some(BatchStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
        }
    }
}

// ==========================================
// 调拨状态 (Transfer Status)
// ==========================================
// 状态机: pending → verified（终态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,  // 在途待验收
    Verified, // 已验收
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TransferStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(TransferStatus::Pending),
            "verified" => Some(TransferStatus::Verified),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Verified => "verified",
        }
    }
}

// ==========================================
// 数量单位 (Quantity Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QtyUnit {
    Kg,
    G,
    Lb,
}

impl Default for QtyUnit {
    fn default() -> Self {
        QtyUnit::Kg
    }
}

impl fmt::Display for QtyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QtyUnit {
    /// 从字符串解析（未知单位返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Some(QtyUnit::Kg),
            "g" => Some(QtyUnit::G),
            "lb" | "lbs" => Some(QtyUnit::Lb),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            QtyUnit::Kg => "kg",
            QtyUnit::G => "g",
            QtyUnit::Lb => "lb",
        }
    }

    /// 换算为千克的系数
    pub fn kg_factor(&self) -> f64 {
        match self {
            QtyUnit::Kg => 1.0,
            QtyUnit::G => 0.001,
            QtyUnit::Lb => 0.453_592_37,
        }
    }

    /// 将该单位下的数量换算为千克
    pub fn to_kg(&self, qty: f64) -> f64 {
        qty * self.kg_factor()
    }
}

// ==========================================
// 调拨原因 (Transfer Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferReason {
    #[serde(rename = "Fresh Stock")]
    FreshStock,
    #[serde(rename = "Expired")]
    Expired,
    #[serde(rename = "Leakage")]
    Leakage,
    #[serde(rename = "Bad Packing")]
    BadPacking,
    #[serde(rename = "Missing Label")]
    MissingLabel,
    #[serde(rename = "Reprocess")]
    Reprocess,
}

impl Default for TransferReason {
    fn default() -> Self {
        TransferReason::FreshStock
    }
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TransferReason {
    pub const ALL: [TransferReason; 6] = [
        TransferReason::FreshStock,
        TransferReason::Expired,
        TransferReason::Leakage,
        TransferReason::BadPacking,
        TransferReason::MissingLabel,
        TransferReason::Reprocess,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.to_db_str().eq_ignore_ascii_case(s))
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TransferReason::FreshStock => "Fresh Stock",
            TransferReason::Expired => "Expired",
            TransferReason::Leakage => "Leakage",
            TransferReason::BadPacking => "Bad Packing",
            TransferReason::MissingLabel => "Missing Label",
            TransferReason::Reprocess => "Reprocess",
        }
    }
}

// ==========================================
// 退货实物状况 (Return Condition)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnCondition {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Damaged")]
    Damaged,
    #[serde(rename = "Leakage")]
    Leakage,
    #[serde(rename = "Incorrect Product")]
    IncorrectProduct,
    #[serde(rename = "Missing")]
    Missing,
}

impl Default for ReturnCondition {
    fn default() -> Self {
        ReturnCondition::Ok
    }
}

impl fmt::Display for ReturnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReturnCondition {
    pub const ALL: [ReturnCondition; 5] = [
        ReturnCondition::Ok,
        ReturnCondition::Damaged,
        ReturnCondition::Leakage,
        ReturnCondition::IncorrectProduct,
        ReturnCondition::Missing,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.to_db_str().eq_ignore_ascii_case(s))
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReturnCondition::Ok => "OK",
            ReturnCondition::Damaged => "Damaged",
            ReturnCondition::Leakage => "Leakage",
            ReturnCondition::IncorrectProduct => "Incorrect Product",
            ReturnCondition::Missing => "Missing",
        }
    }
}

// ==========================================
// 退货处置 (Return Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnAction {
    Restock, // 重新入库
    Dispose, // 报废（需要照片）
}

impl Default for ReturnAction {
    fn default() -> Self {
        ReturnAction::Restock
    }
}

impl fmt::Display for ReturnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReturnAction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "restock" => Some(ReturnAction::Restock),
            "dispose" => Some(ReturnAction::Dispose),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReturnAction::Restock => "Restock",
            ReturnAction::Dispose => "Dispose",
        }
    }
}

// ==========================================
// 媒体类型 (Media Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MediaKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// MIME 主类型前缀
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_status_db_str() {
        assert_eq!(BatchStatus::InProgress.to_db_str(), "in_progress");
        assert_eq!(BatchStatus::from_str("COMPLETED"), Some(BatchStatus::Completed));
        assert_eq!(BatchStatus::from_str("paused"), None);
    }

    #[test]
    fn test_transfer_reason_labels() {
        assert_eq!(
            TransferReason::from_str("missing label"),
            Some(TransferReason::MissingLabel)
        );
        assert_eq!(TransferReason::MissingLabel.to_db_str(), "Missing Label");
        assert_eq!(TransferReason::from_str("Lost"), None);
    }

    #[test]
    fn test_return_enums_serde_names() {
        let json = serde_json::to_string(&ReturnCondition::IncorrectProduct).unwrap();
        assert_eq!(json, "\"Incorrect Product\"");
        let parsed: ReturnAction = serde_json::from_str("\"Dispose\"").unwrap();
        assert_eq!(parsed, ReturnAction::Dispose);
    }

    #[test]
    fn test_unit_to_kg() {
        assert_eq!(QtyUnit::Kg.to_kg(10.0), 10.0);
        assert!((QtyUnit::G.to_kg(500.0) - 0.5).abs() < 1e-12);
        assert!((QtyUnit::Lb.to_kg(1.0) - 0.45359237).abs() < 1e-12);
        assert_eq!(QtyUnit::from_str("LB"), Some(QtyUnit::Lb));
    }
}
