// ==========================================
// Just Pressed 运营管理系统 - 退货 API
// ==========================================
// 红线: 任一明细处置为 Dispose 时必须附照片
// 媒体: 上传由媒体服务完成，此处只校验类型/大小并给出存储目录
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_media_asset;
use crate::clock::IstTimestamp;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::customer::normalize_optional;
use crate::domain::production::random_code_suffix;
use crate::domain::returns::{
    media_folder, requires_photos, return_code, MediaAsset, ProductReturn, ReturnItem,
};
use crate::domain::types::{MediaKind, ReturnAction, ReturnCondition};
use crate::i18n::t;
use crate::repository::error::RepositoryError;
use crate::repository::master_data_repo::MasterDataRepository;
use crate::repository::return_repo::ReturnRepository;

/// 退货编号冲突时的最大尝试次数
const RETURN_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLineInput {
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub quantity: i64,
    pub physical_condition: ReturnCondition,
    pub action_taken: ReturnAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReturnRequest {
    pub received_location_id: String,
    pub order_id: Option<String>,
    pub awb_number: Option<String>,
    pub remarks: Option<String>,
    /// 已上传的照片 URL
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub lines: Vec<ReturnLineInput>,
}

/// 上传前预留的退货编号与媒体目录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMediaSlot {
    pub return_code: String,
    pub media_folder: String,
}

pub struct ReturnApi {
    return_repo: Arc<ReturnRepository>,
    master_repo: Arc<MasterDataRepository>,
    config: Arc<ConfigManager>,
}

impl ReturnApi {
    pub fn new(
        return_repo: Arc<ReturnRepository>,
        master_repo: Arc<MasterDataRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            return_repo,
            master_repo,
            config,
        }
    }

    // ==========================================
    // 媒体校验
    // ==========================================

    /// 校验待上传文件（类型前缀 + 配置中的大小上限）
    pub fn validate_media(&self, assets: &[MediaAsset], kind: MediaKind) -> ApiResult<()> {
        let limit = match kind {
            MediaKind::Image => self.config.get_image_max_bytes(),
            MediaKind::Video => self.config.get_video_max_bytes(),
        }
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

        for asset in assets {
            if let Err(e) = validate_media_asset(asset, kind, limit) {
                tracing::warn!(file = %asset.file_name, size = asset.size_bytes, "媒体文件被拒绝");
                return Err(e);
            }
        }
        Ok(())
    }

    /// 生成退货编号与媒体目录（上传前调用）
    pub fn reserve_media_slot(&self) -> ReturnMediaSlot {
        let code = return_code(IstTimestamp::now().ist_date(), random_code_suffix());
        ReturnMediaSlot {
            media_folder: media_folder(&code),
            return_code: code,
        }
    }

    // ==========================================
    // 退货登记
    // ==========================================

    /// 新建退货单
    ///
    /// # 参数
    /// - req: 表单
    /// - preferred_code: 上传媒体时预留的编号（可选；冲突时换号）
    pub fn create_return(
        &self,
        req: &CreateReturnRequest,
        preferred_code: Option<&str>,
        actor: &str,
    ) -> ApiResult<ProductReturn> {
        let location = req.received_location_id.trim();
        if location.is_empty() {
            return Err(ApiError::field(
                "received_location_id",
                t("validation.location_required"),
            ));
        }

        let items: Vec<ReturnItem> = req
            .lines
            .iter()
            .filter(|l| !l.sku_id.trim().is_empty() && l.quantity > 0)
            .map(|l| ReturnItem {
                sku_id: l.sku_id.trim().to_string(),
                quantity_returned: l.quantity,
                physical_condition: l.physical_condition,
                action_taken: l.action_taken,
            })
            .collect();
        if items.is_empty() {
            return Err(ApiError::field("lines", t("validation.no_valid_items")));
        }

        let photos: Vec<String> = clean_urls(&req.photos);
        if requires_photos(&items) && photos.is_empty() {
            return Err(ApiError::field("photos", t("validation.photos_required_for_dispose")));
        }

        self.master_repo
            .find_location(location)?
            .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", location)))?;

        let ts = IstTimestamp::now();
        let mut ret = ProductReturn {
            return_id: uuid::Uuid::new_v4().to_string(),
            return_code: String::new(),
            received_location_id: location.to_string(),
            order_id: normalize_optional(req.order_id.clone()),
            awb_number: normalize_optional(req.awb_number.clone()),
            received_date: ts.ist_date(),
            received_at_ist: ts.formatted.clone(),
            received_at_epoch: ts.epoch_ms,
            received_by: actor.to_string(),
            remarks: normalize_optional(req.remarks.clone()),
            photos,
            videos: clean_urls(&req.videos),
            items,
        };

        let mut saved = false;
        for attempt in 1..=RETURN_CODE_ATTEMPTS {
            ret.return_code = match preferred_code.map(str::trim).filter(|c| !c.is_empty()) {
                Some(code) if attempt == 1 => code.to_string(),
                _ => return_code(ts.ist_date(), random_code_suffix()),
            };
            let log = ActionLog::new(ActionType::CreateReturn, actor, "return", &ret.return_id)
                .with_payload(&serde_json::json!({
                    "return_code": ret.return_code,
                    "order_id": ret.order_id,
                    "items": ret.items,
                    "photo_count": ret.photos.len(),
                    "video_count": ret.videos.len(),
                }));
            match self.return_repo.insert_with_items(&ret, &log) {
                Ok(()) => {
                    saved = true;
                    break;
                }
                Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                    tracing::warn!(attempt, code = %ret.return_code, "退货编号冲突，换号重试: {}", msg);
                }
                Err(e) => return Err(e.into()),
            }
        }
        if !saved {
            tracing::error!("退货编号连续冲突 {} 次", RETURN_CODE_ATTEMPTS);
            return Err(ApiError::InternalError("退货编号生成失败".to_string()));
        }

        tracing::info!(return_code = %ret.return_code, items = ret.items.len(), "退货已登记");
        Ok(ret)
    }

    pub fn get_return(&self, return_id: &str) -> ApiResult<ProductReturn> {
        self.return_repo
            .find_by_id(return_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Return(id={})不存在", return_id)))
    }

    pub fn get_return_by_code(&self, return_code: &str) -> ApiResult<ProductReturn> {
        self.return_repo
            .find_by_code(return_code.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("Return(code={})不存在", return_code)))
    }
}

fn clean_urls(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}
