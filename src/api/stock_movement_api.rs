// ==========================================
// Just Pressed 运营管理系统 - 库间调拨 API
// ==========================================
// 职责: 发出调拨、待验收列表、验收明细、验收
// 状态机: pending → verified（终态）
// 事务: 单头与明细一次写入；验收以 pending 为条件
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::require_non_negative;
use crate::clock::IstTimestamp;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::stock_movement::{
    NewTransferLine, PendingTransferView, ReceivedQty, StockMovement, TransferItemView,
};
use crate::domain::types::{TransferReason, TransferStatus};
use crate::i18n::t;
use crate::repository::master_data_repo::MasterDataRepository;
use crate::repository::stock_movement_repo::{StockMovementRepository, VerifyCommand};

// ==========================================
// 请求/响应 DTO
// ==========================================

/// 表单明细行（未清洗；无 SKU 或数量非正的行会被丢弃）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLineInput {
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub qty_sent: i64,
    #[serde(default = "default_reason")]
    pub reason: TransferReason,
}

fn default_reason() -> TransferReason {
    TransferReason::FreshStock
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTransferRequest {
    pub from_location_id: String,
    pub to_location_id: String,
    pub notes: Option<String>,
    pub lines: Vec<TransferLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTransferResponse {
    pub movement: StockMovement,
    pub friendly_code: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTransferRequest {
    #[serde(default)]
    pub received: Vec<ReceivedQty>,
    pub remarks: Option<String>,
}

// ==========================================
// StockMovementApi - 库间调拨 API
// ==========================================
pub struct StockMovementApi {
    movement_repo: Arc<StockMovementRepository>,
    master_repo: Arc<MasterDataRepository>,
}

impl StockMovementApi {
    pub fn new(
        movement_repo: Arc<StockMovementRepository>,
        master_repo: Arc<MasterDataRepository>,
    ) -> Self {
        Self {
            movement_repo,
            master_repo,
        }
    }

    /// 发出调拨
    ///
    /// # 返回
    /// - Err(FormValidationError): 地点缺失/相同，或没有有效明细
    /// - Err(NotFound): 地点不存在
    pub fn send_transfer(
        &self,
        req: &SendTransferRequest,
        actor: &str,
    ) -> ApiResult<SendTransferResponse> {
        let from = req.from_location_id.trim();
        let to = req.to_location_id.trim();
        if from.is_empty() || to.is_empty() {
            return Err(ApiError::field("location", t("validation.location_required")));
        }
        if from == to {
            return Err(ApiError::field("to_location_id", t("validation.same_location")));
        }

        let lines: Vec<NewTransferLine> = req
            .lines
            .iter()
            .filter(|l| !l.sku_id.trim().is_empty() && l.qty_sent > 0)
            .map(|l| NewTransferLine {
                sku_id: l.sku_id.trim().to_string(),
                qty_sent: l.qty_sent,
                reason: l.reason,
            })
            .collect();
        if lines.is_empty() {
            return Err(ApiError::field("lines", t("validation.no_valid_items")));
        }
        let dropped = req.lines.len() - lines.len();

        for id in [from, to] {
            self.master_repo
                .find_location(id)?
                .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", id)))?;
        }

        let ts = IstTimestamp::now();
        let movement = StockMovement {
            movement_id: uuid::Uuid::new_v4().to_string(),
            from_location_id: from.to_string(),
            to_location_id: to.to_string(),
            status: TransferStatus::Pending,
            sent_by: actor.to_string(),
            sent_at_ist: ts.formatted,
            sent_at_epoch: ts.epoch_ms,
            notes: crate::domain::customer::normalize_optional(req.notes.clone()),
            verified_by: None,
            verified_at_ist: None,
            verified_at_epoch: None,
            verify_remarks: None,
            is_deleted: false,
        };

        let log = ActionLog::new(
            ActionType::SendTransfer,
            actor,
            "stock_movement",
            &movement.movement_id,
        )
        .with_payload(&serde_json::json!({
            "from_location_id": movement.from_location_id,
            "to_location_id": movement.to_location_id,
            "lines": lines,
        }));
        let friendly_code = self.movement_repo.insert_with_items(&movement, &lines, log)?;
        let item_count = lines.len();

        tracing::info!(
            movement_id = %movement.movement_id,
            friendly_code = %friendly_code,
            item_count,
            dropped,
            "调拨已发出"
        );
        Ok(SendTransferResponse {
            movement,
            friendly_code,
            item_count,
        })
    }

    /// 待验收调拨（新 → 旧）
    pub fn list_pending(&self) -> ApiResult<Vec<PendingTransferView>> {
        Ok(self.movement_repo.list_pending()?)
    }

    /// 验收界面明细（实收预填为发出数量）
    pub fn items_of_transfer(&self, movement_id: &str) -> ApiResult<Vec<TransferItemView>> {
        self.get_transfer(movement_id)?;
        Ok(self.movement_repo.list_items_for_verify(movement_id)?)
    }

    pub fn get_transfer(&self, movement_id: &str) -> ApiResult<StockMovement> {
        self.movement_repo
            .find_by_id(movement_id)?
            .ok_or_else(|| ApiError::NotFound(format!("StockMovement(id={})不存在", movement_id)))
    }

    pub fn friendly_code(&self, movement_id: &str) -> ApiResult<String> {
        Ok(self.movement_repo.friendly_code_of(movement_id)?)
    }

    /// 验收：写入实收数量并置为 verified
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 已验收
    /// - Err(BusinessRuleViolation): 明细不属于该调拨
    /// - Err(FormValidationError): 实收数量为负
    pub fn verify_transfer(
        &self,
        movement_id: &str,
        req: &VerifyTransferRequest,
        actor: &str,
    ) -> ApiResult<()> {
        for r in &req.received {
            require_non_negative("qty_received", "Received quantity", r.qty_received as f64)?;
        }

        let ts = IstTimestamp::now();
        let remarks = crate::domain::customer::normalize_optional(req.remarks.clone());
        let log = ActionLog::new(ActionType::VerifyTransfer, actor, "stock_movement", movement_id)
            .with_payload(&serde_json::json!({
                "received": req.received,
                "remarks": remarks,
            }));
        let result = self.movement_repo.verify(
            &VerifyCommand {
                movement_id,
                received: &req.received,
                verified_by: actor,
                verified_at_ist: &ts.formatted,
                verified_at_epoch: ts.epoch_ms,
                remarks: remarks.as_deref(),
            },
            &log,
        );
        if let Err(e) = result {
            tracing::warn!(movement_id, error = %e, "验收被拒绝");
            return Err(e.into());
        }

        tracing::info!(movement_id, "调拨已验收");
        Ok(())
    }
}
