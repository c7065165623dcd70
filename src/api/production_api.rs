// ==========================================
// Just Pressed 运营管理系统 - 生产跟踪 API
// ==========================================
// 职责: 榨油开机/停机、过滤开始/停止、灌装登记、运行中看板
// 红线: 停机时产出不得超过投入（等号允许）
// 状态机:
// - 批次 in_progress → completed（终态）
// - 过滤 运行中（stop_epoch 为空）→ 已停止
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::api::validator::{
    check_batch_balance, check_filter_balance, require_non_negative, require_positive,
    require_text,
};
use crate::clock::IstTimestamp;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::master::{Machine, RawMaterial};
use crate::domain::production::{
    batch_code, random_code_suffix, BottlingEntry, FilteringEntry, ProductionBatch,
    RunningBatchView, RunningFilterView, FILTER_STATE_STOPPED,
};
use crate::domain::types::{BatchStatus, QtyUnit};
use crate::i18n::t_with_args;
use crate::repository::bottling_repo::BottlingRepository;
use crate::repository::error::RepositoryError;
use crate::repository::filtering_repo::{FilterStop, FilteringRepository};
use crate::repository::master_data_repo::MasterDataRepository;
use crate::repository::production_repo::{BatchCompletion, ProductionBatchRepository};

/// 批次编号冲突时的最大尝试次数
const BATCH_CODE_ATTEMPTS: usize = 5;

// ==========================================
// 请求 DTO
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartExtractionRequest {
    pub machine_id: String,
    pub raw_material_id: String,
    pub seed_input_qty: f64,
    #[serde(default)]
    pub unit: QtyUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartFilteringRequest {
    pub raw_material_id: String,
    pub input_qty_kg: f64,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordBottlingRequest {
    pub product_id: String,
    pub sku_id: String,
    pub bottles_filled: i64,
    pub location_id: Option<String>,
}

/// 生产跟踪首页数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOverview {
    pub running_batches: Vec<RunningBatchView>,
    pub running_filters: Vec<RunningFilterView>,
    pub idle_machine_count: i64,
}

// ==========================================
// ProductionApi - 生产跟踪 API
// ==========================================

/// 生产跟踪API
///
/// 职责：
/// 1. 参考数据读取（油籽、压榨机台）
/// 2. 开机（生成批次编号，机台忙碌时拒绝）/ 停机（产出平衡校验）
/// 3. 过滤开始/停止（产出平衡校验）
/// 4. 灌装登记
/// 5. ActionLog记录
pub struct ProductionApi {
    batch_repo: Arc<ProductionBatchRepository>,
    filtering_repo: Arc<FilteringRepository>,
    bottling_repo: Arc<BottlingRepository>,
    master_repo: Arc<MasterDataRepository>,
    config: Arc<ConfigManager>,
}

impl ProductionApi {
    pub fn new(
        batch_repo: Arc<ProductionBatchRepository>,
        filtering_repo: Arc<FilteringRepository>,
        bottling_repo: Arc<BottlingRepository>,
        master_repo: Arc<MasterDataRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            batch_repo,
            filtering_repo,
            bottling_repo,
            master_repo,
            config,
        }
    }

    fn balance_tolerance(&self) -> ApiResult<f64> {
        self.config
            .get_balance_tolerance()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }

    // ==========================================
    // 参考数据
    // ==========================================

    pub fn list_seeds(&self) -> ApiResult<Vec<RawMaterial>> {
        Ok(self.master_repo.list_active_raw_materials()?)
    }

    pub fn list_press_machines(&self) -> ApiResult<Vec<Machine>> {
        Ok(self.master_repo.list_active_press_machines()?)
    }

    // ==========================================
    // 榨油
    // ==========================================

    /// 开机：新建 in_progress 批次
    ///
    /// # 返回
    /// - Ok(ProductionBatch): 新批次
    /// - Err(FormValidationError): 缺字段 / 数量非正
    /// - Err(BusinessRuleViolation): 机台已有运行中批次
    pub fn start_extraction(
        &self,
        req: &StartExtractionRequest,
        actor: &str,
    ) -> ApiResult<ProductionBatch> {
        let violations: Vec<ValidationViolation> = [
            require_text("machine_id", "Machine", &req.machine_id),
            require_text("raw_material_id", "Seed", &req.raw_material_id),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(err) = ApiError::from_violations(violations) {
            return Err(err);
        }
        require_positive("seed_input_qty", "Seed quantity", req.seed_input_qty)?;

        let machine = self
            .master_repo
            .find_machine(&req.machine_id)?
            .filter(Machine::is_active_press)
            .ok_or_else(|| ApiError::NotFound(format!("Machine(id={})不存在", req.machine_id)))?;
        let seed = self
            .master_repo
            .find_raw_material(&req.raw_material_id)?
            .filter(|s| s.active)
            .ok_or_else(|| {
                ApiError::NotFound(format!("RawMaterial(id={})不存在", req.raw_material_id))
            })?;

        let ts = IstTimestamp::now();
        let mut batch = ProductionBatch {
            batch_id: String::new(),
            production_date: ts.ist_date(),
            machine_id: machine.machine_id.clone(),
            operator_id: actor.to_string(),
            raw_material_id: seed.id.clone(),
            seed_type: seed.name.clone(),
            seed_input_qty: req.seed_input_qty,
            unit: req.unit,
            oil_output_qty: None,
            cake_output_qty: None,
            batch_status: BatchStatus::InProgress,
            start_time_ist: ts.formatted.clone(),
            start_epoch: ts.epoch_ms,
            end_time_ist: None,
            end_epoch: None,
            location_id: machine.location_id.clone(),
            created_by: actor.to_string(),
            updated_by: None,
            is_deleted: false,
        };

        let mut inserted = None;
        for attempt in 1..=BATCH_CODE_ATTEMPTS {
            batch.batch_id = batch_code(ts.ist_date(), random_code_suffix());
            let log = ActionLog::new(
                ActionType::StartExtraction,
                actor,
                "production_batch",
                &batch.batch_id,
            )
            .with_payload(&serde_json::json!({
                "machine_id": batch.machine_id,
                "raw_material_id": batch.raw_material_id,
                "seed_input_qty": batch.seed_input_qty,
                "unit": batch.unit,
            }));
            match self.batch_repo.insert_if_machine_idle(&batch, &log) {
                Ok(written) => {
                    inserted = Some(written);
                    break;
                }
                Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                    tracing::warn!(attempt, batch_id = %batch.batch_id, "批次编号冲突，换号重试: {}", msg);
                }
                Err(e) => return Err(e.into()),
            }
        }

        match inserted {
            Some(true) => {}
            Some(false) => {
                tracing::warn!(machine = %machine.machine_code, "开机被拒绝: 机台已有运行中批次");
                return Err(ApiError::BusinessRuleViolation(t_with_args(
                    "validation.machine_busy",
                    &[("machine", &machine.machine_code)],
                )));
            }
            None => {
                tracing::error!("批次编号连续冲突 {} 次", BATCH_CODE_ATTEMPTS);
                return Err(ApiError::InternalError("批次编号生成失败".to_string()));
            }
        }

        tracing::info!(batch_id = %batch.batch_id, machine = %machine.machine_code, "开机");
        Ok(batch)
    }

    /// 停机：校验 oil + cake ≤ 投入后完成批次
    ///
    /// 校验失败时批次保持 in_progress，可重新填写
    pub fn stop_extraction(
        &self,
        batch_id: &str,
        oil_output_qty: f64,
        cake_output_qty: f64,
        actor: &str,
    ) -> ApiResult<ProductionBatch> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionBatch(id={})不存在", batch_id)))?;
        if !batch.is_running() {
            return Err(ApiError::InvalidStateTransition {
                from: batch.batch_status.to_db_str().to_string(),
                to: BatchStatus::Completed.to_db_str().to_string(),
            });
        }

        require_non_negative("oil_output_qty", "Oil output", oil_output_qty)?;
        require_non_negative("cake_output_qty", "Cake output", cake_output_qty)?;
        if let Err(e) =
            check_batch_balance(&batch, oil_output_qty, cake_output_qty, self.balance_tolerance()?)
        {
            tracing::warn!(
                batch_id,
                input = batch.seed_input_qty,
                oil = oil_output_qty,
                cake = cake_output_qty,
                "停机被拒绝: 产出超过投入"
            );
            return Err(e);
        }

        let ts = IstTimestamp::now();
        let log = ActionLog::new(ActionType::StopExtraction, actor, "production_batch", batch_id)
            .with_payload(&serde_json::json!({
                "oil_output_qty": oil_output_qty,
                "cake_output_qty": cake_output_qty,
            }));
        self.batch_repo.complete(
            &BatchCompletion {
                batch_id,
                oil_output_qty,
                cake_output_qty,
                end_time_ist: &ts.formatted,
                end_epoch: ts.epoch_ms,
                updated_by: actor,
                updated_at: Utc::now().naive_utc(),
            },
            &log,
        )?;

        tracing::info!(batch_id, "停机，批次完成");
        Ok(ProductionBatch {
            oil_output_qty: Some(oil_output_qty),
            cake_output_qty: Some(cake_output_qty),
            batch_status: BatchStatus::Completed,
            end_time_ist: Some(ts.formatted),
            end_epoch: Some(ts.epoch_ms),
            updated_by: Some(actor.to_string()),
            ..batch
        })
    }

    pub fn get_batch(&self, batch_id: &str) -> ApiResult<ProductionBatch> {
        self.batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionBatch(id={})不存在", batch_id)))
    }

    pub fn list_running_batches(&self) -> ApiResult<Vec<RunningBatchView>> {
        Ok(self.batch_repo.list_running()?)
    }

    /// 空闲机台数 = 启用的压榨机台 - 运行中批次（不小于 0）
    pub fn idle_machine_count(&self) -> ApiResult<i64> {
        let machines = self.master_repo.list_active_press_machines()?.len() as i64;
        let running = self.batch_repo.count_running()?;
        Ok((machines - running).max(0))
    }

    pub fn overview(&self) -> ApiResult<ProductionOverview> {
        Ok(ProductionOverview {
            running_batches: self.list_running_batches()?,
            running_filters: self.list_running_filters()?,
            idle_machine_count: self.idle_machine_count()?,
        })
    }

    // ==========================================
    // 过滤
    // ==========================================

    /// 开始过滤；未指定地点时取第一个启用地点
    pub fn start_filtering(
        &self,
        req: &StartFilteringRequest,
        actor: &str,
    ) -> ApiResult<FilteringEntry> {
        if let Some(v) = require_text("raw_material_id", "Seed", &req.raw_material_id) {
            return Err(ApiError::field(&v.field, v.reason));
        }
        require_positive("input_qty_kg", "Input quantity", req.input_qty_kg)?;

        let seed = self
            .master_repo
            .find_raw_material(&req.raw_material_id)?
            .filter(|s| s.active)
            .ok_or_else(|| {
                ApiError::NotFound(format!("RawMaterial(id={})不存在", req.raw_material_id))
            })?;

        let location_id = match req
            .location_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(id) => Some(id.to_string()),
            None => self
                .master_repo
                .first_active_location()?
                .map(|l| l.location_id),
        };

        let ts = IstTimestamp::now();
        let entry = FilteringEntry {
            id: uuid::Uuid::new_v4().to_string(),
            raw_material_id: seed.id.clone(),
            input_qty_kg: req.input_qty_kg,
            filtered_oil_kg: None,
            start_time_ist: ts.formatted,
            start_epoch: ts.epoch_ms,
            stop_time_ist: None,
            stop_epoch: None,
            location_id,
            created_by: actor.to_string(),
            stopped_by: None,
            is_deleted: false,
        };
        let log = ActionLog::new(ActionType::StartFiltering, actor, "filtering_entry", &entry.id)
            .with_payload(&serde_json::json!({
                "raw_material_id": entry.raw_material_id,
                "input_qty_kg": entry.input_qty_kg,
                "location_id": entry.location_id,
            }));
        self.filtering_repo.insert(&entry, &log)?;

        tracing::info!(entry_id = %entry.id, seed = %seed.name, "开始过滤");
        Ok(entry)
    }

    /// 停止过滤：校验 过滤油 ≤ 投入
    pub fn stop_filtering(
        &self,
        entry_id: &str,
        filtered_oil_kg: f64,
        actor: &str,
    ) -> ApiResult<FilteringEntry> {
        let entry = self
            .filtering_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("FilteringEntry(id={})不存在", entry_id)))?;
        if !entry.is_running() {
            return Err(ApiError::InvalidStateTransition {
                from: entry.state_str().to_string(),
                to: FILTER_STATE_STOPPED.to_string(),
            });
        }

        require_non_negative("filtered_oil_kg", "Filtered oil", filtered_oil_kg)?;
        if let Err(e) = check_filter_balance(&entry, filtered_oil_kg, self.balance_tolerance()?) {
            tracing::warn!(
                entry_id,
                input = entry.input_qty_kg,
                filtered = filtered_oil_kg,
                "停止过滤被拒绝: 产出超过投入"
            );
            return Err(e);
        }

        let ts = IstTimestamp::now();
        let log = ActionLog::new(ActionType::StopFiltering, actor, "filtering_entry", entry_id)
            .with_payload(&serde_json::json!({ "filtered_oil_kg": filtered_oil_kg }));
        self.filtering_repo.stop(
            &FilterStop {
                id: entry_id,
                filtered_oil_kg,
                stop_time_ist: &ts.formatted,
                stop_epoch: ts.epoch_ms,
                stopped_by: actor,
            },
            &log,
        )?;

        tracing::info!(entry_id, "过滤已停止");
        Ok(FilteringEntry {
            filtered_oil_kg: Some(filtered_oil_kg),
            stop_time_ist: Some(ts.formatted),
            stop_epoch: Some(ts.epoch_ms),
            stopped_by: Some(actor.to_string()),
            ..entry
        })
    }

    pub fn list_running_filters(&self) -> ApiResult<Vec<RunningFilterView>> {
        Ok(self.filtering_repo.list_running()?)
    }

    // ==========================================
    // 灌装
    // ==========================================

    /// 灌装登记（SKU 必须属于所选产品）
    pub fn record_bottling(
        &self,
        req: &RecordBottlingRequest,
        actor: &str,
    ) -> ApiResult<BottlingEntry> {
        let violations: Vec<ValidationViolation> = [
            require_text("product_id", "Product", &req.product_id),
            require_text("sku_id", "SKU", &req.sku_id),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(err) = ApiError::from_violations(violations) {
            return Err(err);
        }
        require_positive("bottles_filled", "Bottles filled", req.bottles_filled as f64)?;

        let sku = self
            .master_repo
            .find_sku(&req.sku_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Sku(id={})不存在", req.sku_id)))?;
        if sku.product_id != req.product_id {
            return Err(ApiError::BusinessRuleViolation(format!(
                "SKU {} 不属于产品 {}",
                sku.sku_code, req.product_id
            )));
        }

        let ts = IstTimestamp::now();
        let entry = BottlingEntry {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: req.product_id.clone(),
            sku_id: sku.sku_id.clone(),
            bottles_filled: req.bottles_filled,
            bottled_at_ist: ts.formatted,
            bottled_at_epoch: ts.epoch_ms,
            location_id: req.location_id.clone(),
            created_by: actor.to_string(),
            is_deleted: false,
        };
        let log = ActionLog::new(ActionType::RecordBottling, actor, "bottling_entry", &entry.id)
            .with_payload(&serde_json::json!({
                "sku_id": entry.sku_id,
                "bottles_filled": entry.bottles_filled,
            }));
        self.bottling_repo.insert(&entry, &log)?;

        tracing::info!(entry_id = %entry.id, sku = %sku.sku_code, bottles = entry.bottles_filled, "灌装已登记");
        Ok(entry)
    }

    pub fn get_bottling(&self, entry_id: &str) -> ApiResult<BottlingEntry> {
        self.bottling_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("BottlingEntry(id={})不存在", entry_id)))
    }
}
