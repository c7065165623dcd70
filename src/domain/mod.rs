// ==========================================
// Just Pressed 运营管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯业务规则
// 红线: 不含数据访问逻辑
// ==========================================

pub mod action_log;
pub mod customer;
pub mod dashboard;
pub mod dispatch;
pub mod master;
pub mod production;
pub mod returns;
pub mod stock_movement;
pub mod types;
pub mod user;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use customer::{Customer, CustomerDraft, CustomerPage, CustomerTag, MatchType};
pub use dashboard::{EpochRange, ProductionDashboard, RangePreset};
pub use dispatch::{Dispatch, DispatchItem};
pub use master::{Location, Machine, Product, RawMaterial, Sku, SkuView};
pub use production::{
    BalanceViolation, BottlingEntry, FilteringEntry, OutputBalance, ProductionBatch,
    RunningBatchView, RunningFilterView,
};
pub use returns::{MediaAsset, ProductReturn, ReturnItem};
pub use stock_movement::{
    NewTransferLine, PendingTransferView, ReceivedQty, StockMovement, StockMovementItem,
    TransferItemView,
};
pub use types::{
    BatchStatus, MediaKind, QtyUnit, ReturnAction, ReturnCondition, TransferReason,
    TransferStatus,
};
pub use user::{User, UserModule};
