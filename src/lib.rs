// ==========================================
// Just Pressed 运营管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + axum
// 业务范围: 客户档案 / 生产跟踪(榨油、过滤、灌装) / 发货 / 退货 / 库间调拨 / 看板
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// IST 时间工具
pub mod clock;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BatchStatus, MediaKind, QtyUnit, ReturnAction, ReturnCondition, TransferReason,
    TransferStatus,
};

// 领域实体
pub use domain::{
    ActionLog, BottlingEntry, Customer, CustomerTag, Dispatch, FilteringEntry, ProductReturn,
    ProductionBatch, StockMovement,
};

// API
pub use api::{
    CatalogApi, CustomerApi, DashboardApi, DispatchApi, ProductionApi, ReturnApi,
    StockMovementApi, UserApi,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Just Pressed Operations";
