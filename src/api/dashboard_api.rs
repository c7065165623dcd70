// ==========================================
// Just Pressed 运营管理系统 - 生产看板 API
// ==========================================
// 职责: 区间解析（预设 / 自定义）→ 事实行 → KPI 与下钻
// 附带: 审计查询（按时间 / 实体 / 操作人）
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_date_range;
use crate::clock::today_ist;
use crate::config::ConfigManager;
use crate::domain::action_log::ActionLog;
use crate::domain::dashboard::{
    summarize_bottling, summarize_extraction, summarize_filtration, EpochRange,
    ProductionDashboard, RangePreset,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::dashboard_repo::DashboardRepository;

/// 看板查询参数
///
/// from/to 同时给出时按自定义区间处理，否则使用预设（缺省 30d）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub preset: Option<RangePreset>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub struct DashboardApi {
    dashboard_repo: Arc<DashboardRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    pub fn new(
        dashboard_repo: Arc<DashboardRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            dashboard_repo,
            action_log_repo,
            config,
        }
    }

    /// 解析查询区间（today 由调用方传入，便于测试）
    pub fn resolve_range(&self, query: &DashboardQuery, today: NaiveDate) -> ApiResult<EpochRange> {
        match (query.from, query.to) {
            (Some(from), Some(to)) => {
                let lookback = self
                    .config
                    .get_dashboard_lookback_days()
                    .map_err(|e| ApiError::InternalError(e.to_string()))?;
                validate_date_range(from, to, today, lookback)?;
                Ok(EpochRange::from_dates(from, to))
            }
            (None, None) => Ok(EpochRange::from_preset(query.preset.unwrap_or_default(), today)),
            _ => Err(ApiError::InvalidInput(
                "自定义区间需要同时提供 from 与 to".to_string(),
            )),
        }
    }

    /// 生产看板（以今天 IST 为基准）
    pub fn get_production_dashboard(&self, query: &DashboardQuery) -> ApiResult<ProductionDashboard> {
        self.get_production_dashboard_at(query, today_ist())
    }

    pub fn get_production_dashboard_at(
        &self,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> ApiResult<ProductionDashboard> {
        let range = self.resolve_range(query, today)?;

        let extraction = self
            .dashboard_repo
            .extraction_facts(range.from_epoch, range.to_epoch)?;
        let filtration = self
            .dashboard_repo
            .filtration_facts(range.from_epoch, range.to_epoch)?;
        let bottling = self
            .dashboard_repo
            .bottling_facts(range.from_epoch, range.to_epoch)?;

        tracing::debug!(
            from = %range.from_date,
            to = %range.to_date,
            batches = extraction.len(),
            filters = filtration.len(),
            bottling_runs = bottling.len(),
            "看板事实行已加载"
        );

        Ok(ProductionDashboard {
            range,
            extraction: summarize_extraction(&extraction),
            filtration: summarize_filtration(&filtration),
            bottling: summarize_bottling(&bottling),
        })
    }

    /// 最近操作
    ///
    /// # 参数
    /// - limit: 返回记录数上限（1-1000）
    pub fn get_recent_actions(&self, limit: i32) -> ApiResult<Vec<ActionLog>> {
        check_limit(limit)?;
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    // ==========================================
    // 审计查询
    // ==========================================

    pub fn get_action_log(&self, action_id: &str) -> ApiResult<ActionLog> {
        self.action_log_repo
            .find_by_id(action_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ActionLog(id={})不存在", action_id)))
    }

    /// 时间范围内的操作日志（UTC，闭区间）
    pub fn list_action_logs(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> ApiResult<Vec<ActionLog>> {
        if start_time > end_time {
            return Err(ApiError::InvalidInput(
                "开始时间不能晚于结束时间".to_string(),
            ));
        }
        Ok(self
            .action_log_repo
            .find_by_time_range(start_time, end_time)?)
    }

    /// 某实体的变更历史（新 → 旧）
    pub fn list_entity_history(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> ApiResult<Vec<ActionLog>> {
        let (entity_type, entity_id) = (entity_type.trim(), entity_id.trim());
        if entity_type.is_empty() || entity_id.is_empty() {
            return Err(ApiError::InvalidInput("实体类型与实体ID不能为空".to_string()));
        }
        Ok(self.action_log_repo.find_by_entity(entity_type, entity_id)?)
    }

    /// 某操作人的最近操作
    pub fn list_actions_by_actor(&self, actor: &str, limit: i32) -> ApiResult<Vec<ActionLog>> {
        check_limit(limit)?;
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        Ok(self.action_log_repo.find_by_actor(actor, limit)?)
    }
}

fn check_limit(limit: i32) -> ApiResult<()> {
    if limit <= 0 || limit > 1000 {
        return Err(ApiError::InvalidInput("limit必须在1-1000之间".to_string()));
    }
    Ok(())
}
