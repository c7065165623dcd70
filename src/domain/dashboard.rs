// ==========================================
// Just Pressed 运营管理系统 - 生产看板领域模型
// ==========================================
// 职责: 日期区间解析、事实行聚合（KPI + 下钻）
// 口径:
// - 提取: 已完成且未删除、start_epoch 落在区间内的批次，数量统一为 kg
// - 过滤: 已停止、start_epoch 落在区间内
// - 灌装: bottled_at_epoch 落在区间内
// ==========================================

use crate::clock::{days_before, ist_day_bounds_ms, DAY_MS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 未关联到主数据时的分组名
pub const UNKNOWN_LABEL: &str = "Unknown";

// ==========================================
// 日期区间
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RangePreset {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "15d")]
    FifteenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl RangePreset {
    pub fn days(&self) -> i64 {
        match self {
            RangePreset::OneDay => 1,
            RangePreset::SevenDays => 7,
            RangePreset::FifteenDays => 15,
            RangePreset::ThirtyDays => 30,
        }
    }
}

/// 已解析的 IST 日期区间（含首尾两天）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRange {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub from_epoch: i64,
    pub to_epoch: i64,
}

impl EpochRange {
    /// [from_date 00:00:00.000, to_date 23:59:59.999]（IST）
    pub fn from_dates(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        let (from_epoch, _) = ist_day_bounds_ms(from_date);
        let (_, to_epoch) = ist_day_bounds_ms(to_date);
        Self {
            from_date,
            to_date,
            from_epoch,
            to_epoch,
        }
    }

    /// 最近 N 天（含今天）
    pub fn from_preset(preset: RangePreset, today_ist: NaiveDate) -> Self {
        Self::from_dates(days_before(today_ist, preset.days() - 1), today_ist)
    }

    pub fn day_count(&self) -> i64 {
        (self.to_epoch - self.from_epoch + 1) / DAY_MS
    }
}

// ==========================================
// 事实行（仓储层输出）
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFact {
    pub seed_label: String,
    pub machine_label: String,
    pub operator_label: String,
    pub input_kg: f64,
    pub oil_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiltrationFact {
    pub seed_label: String,
    pub input_kg: f64,
    pub filtered_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BottlingFact {
    pub sku_id: String,
    pub product_name: String,
    pub size_label: String,
    pub sku_label: String,
    pub bottles: i64,
}

// ==========================================
// 聚合结果
// ==========================================

/// 产出率下钻行（提取/过滤共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldBreakdown {
    pub label: String,
    pub input_kg: f64,
    pub output_kg: f64,
    pub yield_pct: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_input_kg: f64,
    pub total_oil_kg: f64,
    pub extraction_pct: f64,
    pub batch_count: i64,
    pub by_seed: Vec<YieldBreakdown>,
    pub by_machine: Vec<YieldBreakdown>,
    pub by_operator: Vec<YieldBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltrationSummary {
    pub total_input_kg: f64,
    pub total_filtered_kg: f64,
    pub filtration_pct: f64,
    pub run_count: i64,
    pub by_seed: Vec<YieldBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottlingBreakdown {
    pub sku_id: String,
    pub product_name: String,
    pub size_label: String,
    pub sku_label: String,
    pub bottles: i64,
    pub runs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottlingSummary {
    pub total_bottles: i64,
    pub run_count: i64,
    pub distinct_skus: i64,
    pub by_sku: Vec<BottlingBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionDashboard {
    pub range: EpochRange,
    pub extraction: ExtractionSummary,
    pub filtration: FiltrationSummary,
    pub bottling: BottlingSummary,
}

/// 产出百分比，输入为 0 时为 0
pub fn yield_pct(input: f64, output: f64) -> f64 {
    if input > 0.0 {
        output / input * 100.0
    } else {
        0.0
    }
}

/// 按标签分组求和，输入量降序（同值保持首次出现顺序）
fn group_yield<'a, I>(rows: I) -> Vec<YieldBreakdown>
where
    I: Iterator<Item = (&'a str, f64, f64)>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<YieldBreakdown> = Vec::new();

    for (label, input, output) in rows {
        let slot = *index.entry(label).or_insert_with(|| {
            groups.push(YieldBreakdown {
                label: label.to_string(),
                input_kg: 0.0,
                output_kg: 0.0,
                yield_pct: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        let g = &mut groups[slot];
        g.input_kg += input;
        g.output_kg += output;
        g.count += 1;
    }

    for g in groups.iter_mut() {
        g.yield_pct = yield_pct(g.input_kg, g.output_kg);
    }
    groups.sort_by(|a, b| b.input_kg.total_cmp(&a.input_kg));
    groups
}

pub fn summarize_extraction(facts: &[ExtractionFact]) -> ExtractionSummary {
    let total_input_kg: f64 = facts.iter().map(|f| f.input_kg).sum();
    let total_oil_kg: f64 = facts.iter().map(|f| f.oil_kg).sum();

    ExtractionSummary {
        total_input_kg,
        total_oil_kg,
        extraction_pct: yield_pct(total_input_kg, total_oil_kg),
        batch_count: facts.len() as i64,
        by_seed: group_yield(facts.iter().map(|f| (f.seed_label.as_str(), f.input_kg, f.oil_kg))),
        by_machine: group_yield(
            facts
                .iter()
                .map(|f| (f.machine_label.as_str(), f.input_kg, f.oil_kg)),
        ),
        by_operator: group_yield(
            facts
                .iter()
                .map(|f| (f.operator_label.as_str(), f.input_kg, f.oil_kg)),
        ),
    }
}

pub fn summarize_filtration(facts: &[FiltrationFact]) -> FiltrationSummary {
    let total_input_kg: f64 = facts.iter().map(|f| f.input_kg).sum();
    let total_filtered_kg: f64 = facts.iter().map(|f| f.filtered_kg).sum();

    FiltrationSummary {
        total_input_kg,
        total_filtered_kg,
        filtration_pct: yield_pct(total_input_kg, total_filtered_kg),
        run_count: facts.len() as i64,
        by_seed: group_yield(
            facts
                .iter()
                .map(|f| (f.seed_label.as_str(), f.input_kg, f.filtered_kg)),
        ),
    }
}

pub fn summarize_bottling(facts: &[BottlingFact]) -> BottlingSummary {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut by_sku: Vec<BottlingBreakdown> = Vec::new();

    for f in facts {
        let slot = *index.entry(f.sku_id.as_str()).or_insert_with(|| {
            by_sku.push(BottlingBreakdown {
                sku_id: f.sku_id.clone(),
                product_name: f.product_name.clone(),
                size_label: f.size_label.clone(),
                sku_label: f.sku_label.clone(),
                bottles: 0,
                runs: 0,
            });
            by_sku.len() - 1
        });
        by_sku[slot].bottles += f.bottles;
        by_sku[slot].runs += 1;
    }
    by_sku.sort_by(|a, b| b.bottles.cmp(&a.bottles));

    let distinct: HashSet<&str> = facts.iter().map(|f| f.sku_id.as_str()).collect();
    BottlingSummary {
        total_bottles: facts.iter().map(|f| f.bottles).sum(),
        run_count: facts.len() as i64,
        distinct_skus: distinct.len() as i64,
        by_sku,
    }
}
