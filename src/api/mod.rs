// ==========================================
// Just Pressed 运营管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 HTTP 路由调用
// ==========================================

pub mod catalog_api;
pub mod config_api;
pub mod customer_api;
pub mod dashboard_api;
pub mod dispatch_api;
pub mod error;
pub mod production_api;
pub mod return_api;
pub mod stock_movement_api;
pub mod user_api;
pub mod validator;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use config_api::{ConfigApi, RestoreSnapshotRequest, UpdateConfigRequest};
pub use customer_api::{CustomerApi, CustomerInfo};
pub use dashboard_api::{DashboardApi, DashboardQuery};
pub use dispatch_api::{CreateDispatchRequest, DispatchApi, DispatchLineInput};
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use production_api::{
    ProductionApi, ProductionOverview, RecordBottlingRequest, StartExtractionRequest,
    StartFilteringRequest,
};
pub use return_api::{CreateReturnRequest, ReturnApi, ReturnLineInput, ReturnMediaSlot};
pub use stock_movement_api::{
    SendTransferRequest, SendTransferResponse, StockMovementApi, TransferLineInput,
    VerifyTransferRequest,
};
pub use user_api::{UserApi, UserHome};
