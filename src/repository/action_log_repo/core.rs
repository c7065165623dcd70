use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

pub(super) const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_type, action_ts, actor,
           entity_type, entity_id, payload_json, detail
    FROM action_log
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO action_log (
        action_id, action_type, action_ts, actor,
        entity_type, entity_id, payload_json, detail
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 在调用方的连接/事务上插入操作日志
    ///
    /// 业务写入与日志同一事务提交，任一失败整体回滚
    pub(crate) fn insert_on(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
        conn.execute(
            INSERT_SQL,
            params![
                log.action_id,
                log.action_type,
                log.action_ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                log.actor,
                log.entity_type,
                log.entity_id,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;
        Ok(())
    }
}
