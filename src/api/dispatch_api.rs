// ==========================================
// Just Pressed 运营管理系统 - 发货 API
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::clock::IstTimestamp;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::customer::normalize_optional;
use crate::domain::dispatch::{Dispatch, DispatchItem};
use crate::i18n::t;
use crate::repository::dispatch_repo::DispatchRepository;
use crate::repository::master_data_repo::MasterDataRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLineInput {
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDispatchRequest {
    pub from_location_id: String,
    pub shipped_to: String,
    /// 缺省为今天（IST）
    pub dispatch_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub lines: Vec<DispatchLineInput>,
}

pub struct DispatchApi {
    dispatch_repo: Arc<DispatchRepository>,
    master_repo: Arc<MasterDataRepository>,
}

impl DispatchApi {
    pub fn new(
        dispatch_repo: Arc<DispatchRepository>,
        master_repo: Arc<MasterDataRepository>,
    ) -> Self {
        Self {
            dispatch_repo,
            master_repo,
        }
    }

    /// 新建发货单
    ///
    /// 有效明细: SKU 非空且数量 > 0；其余行丢弃
    pub fn create_dispatch(&self, req: &CreateDispatchRequest, actor: &str) -> ApiResult<Dispatch> {
        let from = req.from_location_id.trim();
        let shipped_to = req.shipped_to.trim();
        if from.is_empty() || shipped_to.is_empty() {
            return Err(ApiError::field("shipped_to", t("validation.shipped_to_required")));
        }

        let items: Vec<DispatchItem> = req
            .lines
            .iter()
            .filter(|l| !l.sku_id.trim().is_empty() && l.quantity > 0)
            .map(|l| DispatchItem {
                sku_id: l.sku_id.trim().to_string(),
                quantity_dispatched: l.quantity,
            })
            .collect();
        if items.is_empty() {
            return Err(ApiError::field("lines", t("validation.no_valid_items")));
        }

        self.master_repo
            .find_location(from)?
            .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", from)))?;

        let ts = IstTimestamp::now();
        let dispatch = Dispatch {
            dispatch_id: uuid::Uuid::new_v4().to_string(),
            from_location_id: from.to_string(),
            shipped_to: shipped_to.to_string(),
            dispatch_date: req.dispatch_date.unwrap_or_else(|| ts.ist_date()),
            dispatched_at_ist: ts.formatted,
            dispatched_at_epoch: ts.epoch_ms,
            dispatched_by: actor.to_string(),
            remarks: normalize_optional(req.remarks.clone()),
            items,
        };
        let log = ActionLog::new(ActionType::CreateDispatch, actor, "dispatch", &dispatch.dispatch_id)
            .with_payload(&serde_json::json!({
                "shipped_to": dispatch.shipped_to,
                "items": dispatch.items,
            }));
        self.dispatch_repo.insert_with_items(&dispatch, &log)?;

        tracing::info!(
            dispatch_id = %dispatch.dispatch_id,
            units = dispatch.total_units(),
            "发货单已创建"
        );
        Ok(dispatch)
    }

    pub fn get_dispatch(&self, dispatch_id: &str) -> ApiResult<Dispatch> {
        self.dispatch_repo
            .find_by_id(dispatch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Dispatch(id={})不存在", dispatch_id)))
    }

    pub fn list_recent(&self, limit: i64) -> ApiResult<Vec<Dispatch>> {
        Ok(self.dispatch_repo.list_recent(limit.clamp(1, 200))?)
    }
}
