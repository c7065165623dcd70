// ==========================================
// Just Pressed 运营管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑（完整性守卫除外）
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod bottling_repo;
pub mod customer_repo;
pub mod customer_tag_repo;
pub mod dashboard_repo;
pub mod db_utils;
pub mod dispatch_repo;
pub mod error;
pub mod filtering_repo;
pub mod master_data_repo;
pub mod production_repo;
pub mod return_repo;
pub mod stock_movement_repo;
pub mod user_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use bottling_repo::BottlingRepository;
pub use customer_repo::{CustomerRepository, PhoneGuard};
pub use customer_tag_repo::CustomerTagRepository;
pub use dashboard_repo::DashboardRepository;
pub use dispatch_repo::DispatchRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use filtering_repo::FilteringRepository;
pub use master_data_repo::MasterDataRepository;
pub use production_repo::{BatchCompletion, ProductionBatchRepository};
pub use return_repo::ReturnRepository;
pub use stock_movement_repo::{StockMovementRepository, VerifyCommand};
pub use user_repo::UserRepository;
