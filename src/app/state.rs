// ==========================================
// Just Pressed 运营管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::Arc;

use crate::api::{
    CatalogApi, ConfigApi, CustomerApi, DashboardApi, DispatchApi, ProductionApi, ReturnApi,
    StockMovementApi, UserApi,
};
use crate::config::ConfigManager;
use crate::db::{open_shared_connection, SharedConnection};
use crate::repository::{
    action_log_repo::ActionLogRepository, bottling_repo::BottlingRepository,
    customer_repo::CustomerRepository, customer_tag_repo::CustomerTagRepository,
    dashboard_repo::DashboardRepository, dispatch_repo::DispatchRepository,
    filtering_repo::FilteringRepository, master_data_repo::MasterDataRepository,
    production_repo::ProductionBatchRepository, return_repo::ReturnRepository,
    stock_movement_repo::StockMovementRepository, user_repo::UserRepository,
};

/// 应用状态
///
/// 包含所有API实例；axum 路由按值克隆（内部均为 Arc）
#[derive(Clone)]
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub customer_api: Arc<CustomerApi>,
    pub production_api: Arc<ProductionApi>,
    pub stock_movement_api: Arc<StockMovementApi>,
    pub dispatch_api: Arc<DispatchApi>,
    pub return_api: Arc<ReturnApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub catalog_api: Arc<CatalogApi>,
    pub user_api: Arc<UserApi>,
    pub config_api: Arc<ConfigApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 打开数据库（建表）并创建AppState
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let mut state = Self::from_connection(conn)?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 基于已有连接装配（测试用内存库走这里）
    pub fn from_connection(conn: SharedConnection) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let master_repo = Arc::new(MasterDataRepository::new(conn.clone()));

        let customer_repo = Arc::new(CustomerRepository::new(conn.clone()));
        let tag_repo = Arc::new(CustomerTagRepository::new(conn.clone()));

        let batch_repo = Arc::new(ProductionBatchRepository::new(conn.clone()));
        let filtering_repo = Arc::new(FilteringRepository::new(conn.clone()));
        let bottling_repo = Arc::new(BottlingRepository::new(conn.clone()));

        let movement_repo = Arc::new(StockMovementRepository::new(conn.clone()));
        let dispatch_repo = Arc::new(DispatchRepository::new(conn.clone()));
        let return_repo = Arc::new(ReturnRepository::new(conn.clone()));

        let dashboard_repo = Arc::new(DashboardRepository::new(conn.clone()));
        let user_repo = Arc::new(UserRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let customer_api = Arc::new(CustomerApi::new(
            customer_repo,
            tag_repo,
            config_manager.clone(),
        ));
        let production_api = Arc::new(ProductionApi::new(
            batch_repo,
            filtering_repo,
            bottling_repo,
            master_repo.clone(),
            config_manager.clone(),
        ));
        let stock_movement_api = Arc::new(StockMovementApi::new(movement_repo, master_repo.clone()));
        let dispatch_api = Arc::new(DispatchApi::new(dispatch_repo, master_repo.clone()));
        let return_api = Arc::new(ReturnApi::new(
            return_repo,
            master_repo.clone(),
            config_manager.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            dashboard_repo,
            action_log_repo,
            config_manager.clone(),
        ));
        let catalog_api = Arc::new(CatalogApi::new(master_repo, config_manager.clone()));
        let user_api = Arc::new(UserApi::new(user_repo));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: String::new(),
            customer_api,
            production_api,
            stock_movement_api,
            dispatch_api,
            return_api,
            dashboard_api,
            catalog_api,
            user_api,
            config_api,
            config_manager,
        })
    }
}
