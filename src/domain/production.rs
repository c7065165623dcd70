// ==========================================
// Just Pressed 运营管理系统 - 生产领域模型
// ==========================================
// 榨油批次 / 过滤记录 / 灌装记录
// 红线: 产出不得超过投入（停机时校验，等号允许）
// ==========================================

use crate::domain::types::{BatchStatus, QtyUnit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionBatch - 榨油批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub batch_id: String, // BP-YYMMDD-NNNN
    pub production_date: NaiveDate,
    pub machine_id: String,
    pub operator_id: String,
    pub raw_material_id: String,
    pub seed_type: String,
    pub seed_input_qty: f64,
    pub unit: QtyUnit,
    pub oil_output_qty: Option<f64>,
    pub cake_output_qty: Option<f64>,
    pub batch_status: BatchStatus,

    // ===== 时间 (IST 展示串 + epoch 毫秒) =====
    pub start_time_ist: String,
    pub start_epoch: i64,
    pub end_time_ist: Option<String>,
    pub end_epoch: Option<i64>,

    pub location_id: Option<String>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub is_deleted: bool,
}

impl ProductionBatch {
    pub fn is_running(&self) -> bool {
        self.batch_status == BatchStatus::InProgress
    }
}

// ==========================================
// FilteringEntry - 过滤记录
// ==========================================
// 状态: stop_epoch 为空 = 运行中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringEntry {
    pub id: String,
    pub raw_material_id: String,
    pub input_qty_kg: f64,
    pub filtered_oil_kg: Option<f64>,
    pub start_time_ist: String,
    pub start_epoch: i64,
    pub stop_time_ist: Option<String>,
    pub stop_epoch: Option<i64>,
    pub location_id: Option<String>,
    pub created_by: String,
    pub stopped_by: Option<String>,
    pub is_deleted: bool,
}

pub const FILTER_STATE_RUNNING: &str = "running";
pub const FILTER_STATE_STOPPED: &str = "stopped";

impl FilteringEntry {
    pub fn is_running(&self) -> bool {
        self.stop_epoch.is_none()
    }

    /// 当前状态名（状态转换错误中使用）
    pub fn state_str(&self) -> &'static str {
        filter_state_of(self.stop_epoch)
    }
}

pub fn filter_state_of(stop_epoch: Option<i64>) -> &'static str {
    if stop_epoch.is_none() {
        FILTER_STATE_RUNNING
    } else {
        FILTER_STATE_STOPPED
    }
}

// ==========================================
// BottlingEntry - 灌装记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottlingEntry {
    pub id: String,
    pub product_id: String,
    pub sku_id: String,
    pub bottles_filled: i64,
    pub bottled_at_ist: String,
    pub bottled_at_epoch: i64,
    pub location_id: Option<String>,
    pub created_by: String,
    pub is_deleted: bool,
}

// ==========================================
// 运行中列表视图（已连表）
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningBatchView {
    pub batch_id: String,
    pub machine_id: String,
    pub machine_code: String,
    pub raw_material_id: String,
    pub seed_name: String,
    pub seed_input_qty: f64,
    pub unit: QtyUnit,
    pub start_time_ist: String,
    pub start_epoch: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningFilterView {
    pub id: String,
    pub raw_material_id: String,
    pub seed_name: String,
    pub input_qty_kg: f64,
    pub start_time_ist: String,
    pub start_epoch: i64,
}

// ==========================================
// OutputBalance - 产出平衡校验
// ==========================================

/// 平衡校验失败明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceViolation {
    pub input: f64,
    pub output_total: f64,
    pub unit: QtyUnit,
}

/// 平衡校验容差上限，只吸收浮点误差
pub const MAX_BALANCE_TOLERANCE: f64 = 1e-6;

/// 将容差收敛到 [0, MAX_BALANCE_TOLERANCE]，非有限值按 0 处理
pub fn bounded_tolerance(tolerance: f64) -> f64 {
    if tolerance.is_finite() {
        tolerance.clamp(0.0, MAX_BALANCE_TOLERANCE)
    } else {
        0.0
    }
}

/// 有投入/产出的记录统一实现本 trait
pub trait OutputBalance {
    /// 投入量
    fn input_qty(&self) -> f64;

    /// 计量单位
    fn balance_unit(&self) -> QtyUnit {
        QtyUnit::Kg
    }

    /// 校验候选产出总量
    ///
    /// 允许 output_total ≤ input + tolerance（等号始终允许）
    /// tolerance 超过 MAX_BALANCE_TOLERANCE 时按上限计
    fn check_output(&self, output_total: f64, tolerance: f64) -> Result<(), BalanceViolation> {
        let input = self.input_qty();
        if !output_total.is_finite() || output_total > input + bounded_tolerance(tolerance) {
            return Err(BalanceViolation {
                input,
                output_total,
                unit: self.balance_unit(),
            });
        }
        Ok(())
    }
}

impl OutputBalance for ProductionBatch {
    fn input_qty(&self) -> f64 {
        self.seed_input_qty
    }

    fn balance_unit(&self) -> QtyUnit {
        self.unit
    }
}

impl OutputBalance for FilteringEntry {
    fn input_qty(&self) -> f64 {
        self.input_qty_kg
    }
}

impl OutputBalance for RunningBatchView {
    fn input_qty(&self) -> f64 {
        self.seed_input_qty
    }

    fn balance_unit(&self) -> QtyUnit {
        self.unit
    }
}

// ==========================================
// 编号生成
// ==========================================

/// 生成 1000..=9999 之间的随机后缀（取自 UUID v4 随机位）
pub fn random_code_suffix() -> u16 {
    let bits = uuid::Uuid::new_v4().as_u128();
    (bits % 9000) as u16 + 1000
}

/// 批次编号: BP-YYMMDD-NNNN（日期为 IST）
pub fn batch_code(ist_date: NaiveDate, suffix: u16) -> String {
    format!("BP-{}-{:04}", crate::clock::yymmdd(ist_date), suffix)
}
