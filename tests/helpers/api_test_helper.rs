// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use rusqlite::params;
use tempfile::NamedTempFile;

use just_pressed_ops::api::{
    ApiError, CatalogApi, ConfigApi, CustomerApi, DashboardApi, DispatchApi, ProductionApi,
    ReturnApi, StockMovementApi, UserApi,
};
use just_pressed_ops::app::AppState;
use just_pressed_ops::config::ConfigManager;
use just_pressed_ops::db::SharedConnection;

pub use test_helpers::*;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: SharedConnection,

    pub customer_api: Arc<CustomerApi>,
    pub production_api: Arc<ProductionApi>,
    pub stock_movement_api: Arc<StockMovementApi>,
    pub dispatch_api: Arc<DispatchApi>,
    pub return_api: Arc<ReturnApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub catalog_api: Arc<CatalogApi>,
    pub user_api: Arc<UserApi>,
    pub config_api: Arc<ConfigApi>,
    pub config_manager: Arc<ConfigManager>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（含参考数据）
    pub fn new() -> Result<Self, String> {
        just_pressed_ops::logging::init_test();

        let (temp_file, db_path) =
            create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;
        let conn = open_shared(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        seed_reference_data(&conn).map_err(|e| format!("写入参考数据失败: {}", e))?;

        let state = AppState::from_connection(conn.clone())?;

        Ok(Self {
            db_path,
            conn,
            customer_api: state.customer_api,
            production_api: state.production_api,
            stock_movement_api: state.stock_movement_api,
            dispatch_api: state.dispatch_api,
            return_api: state.return_api,
            dashboard_api: state.dashboard_api,
            catalog_api: state.catalog_api,
            user_api: state.user_api,
            config_api: state.config_api,
            config_manager: state.config_manager,
            _temp_file: temp_file,
        })
    }

    /// 某操作类型的日志条数
    pub fn count_logs(&self, action_type: &str) -> i64 {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE action_type = ?1",
            params![action_type],
            |row| row.get(0),
        )
        .unwrap_or(-1)
    }

    /// 直接改写批次开始时间（看板区间测试用）
    pub fn backdate_batch(&self, batch_id: &str, start_epoch: i64) {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE production_batches SET start_epoch = ?1 WHERE batch_id = ?2",
            params![start_epoch, batch_id],
        )
        .unwrap();
    }

    /// 直接改写调拨发出时间（友好编号测试用）
    pub fn backdate_transfer(&self, movement_id: &str, sent_at_epoch: i64) {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE stock_movements SET sent_at_epoch = ?1 WHERE movement_id = ?2",
            params![sent_at_epoch, movement_id],
        )
        .unwrap();
    }
}

// ==========================================
// 错误断言辅助函数
// ==========================================

/// 验证是否为表单校验错误，并返回第一个违规字段
pub fn assert_form_error<T: std::fmt::Debug>(result: Result<T, ApiError>) -> (String, String) {
    match result {
        Err(ApiError::FormValidationError { reason, violations }) => {
            let field = violations
                .first()
                .map(|v| v.field.clone())
                .unwrap_or_default();
            (field, reason)
        }
        Ok(val) => panic!("预期FormValidationError，但操作成功: {:?}", val),
        Err(e) => panic!("预期FormValidationError，但得到: {:?}", e),
    }
}

/// 验证是否为未找到错误
pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    match result {
        Err(ApiError::NotFound(_)) => {}
        Ok(val) => panic!("预期NotFound错误，但操作成功: {:?}", val),
        Err(e) => panic!("预期NotFound错误，但得到: {:?}", e),
    }
}

/// 验证是否为状态转换错误
pub fn assert_invalid_transition<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    match result {
        Err(ApiError::InvalidStateTransition { .. }) => {}
        Ok(val) => panic!("预期InvalidStateTransition错误，但操作成功: {:?}", val),
        Err(e) => panic!("预期InvalidStateTransition错误，但得到: {:?}", e),
    }
}
