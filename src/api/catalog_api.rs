// ==========================================
// Just Pressed 运营管理系统 - 主数据只读 API
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::master::{Location, Product, SkuView};
use crate::repository::master_data_repo::MasterDataRepository;

pub struct CatalogApi {
    master_repo: Arc<MasterDataRepository>,
    config: Arc<ConfigManager>,
}

impl CatalogApi {
    pub fn new(master_repo: Arc<MasterDataRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            master_repo,
            config,
        }
    }

    pub fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(self.master_repo.list_active_locations()?)
    }

    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.master_repo.list_active_products()?)
    }

    pub fn list_skus(&self) -> ApiResult<Vec<SkuView>> {
        Ok(self.master_repo.list_active_skus()?)
    }

    /// SKU 搜索（空搜索词返回空列表，结果数受配置上限约束）
    pub fn search_skus(&self, term: &str) -> ApiResult<Vec<SkuView>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let limit = self
            .config
            .get_sku_search_limit()
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .max(1);
        Ok(self.master_repo.search_skus(term, limit)?)
    }
}
