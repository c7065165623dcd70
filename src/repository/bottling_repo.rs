// ==========================================
// Just Pressed 运营管理系统 - 灌装记录数据仓储
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::production::BottlingEntry;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct BottlingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BottlingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记灌装（与操作日志同一事务）
    pub fn insert(&self, entry: &BottlingEntry, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO bottling_entries (
                id, product_id, sku_id, bottles_filled, bottled_at_ist,
                bottled_at_epoch, location_id, created_by, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.id,
                entry.product_id,
                entry.sku_id,
                entry.bottles_filled,
                entry.bottled_at_ist,
                entry.bottled_at_epoch,
                entry.location_id,
                entry.created_by,
                entry.is_deleted,
            ],
        )?;
        ActionLogRepository::insert_on(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<BottlingEntry>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                r#"
                SELECT id, product_id, sku_id, bottles_filled, bottled_at_ist,
                       bottled_at_epoch, location_id, created_by, is_deleted
                FROM bottling_entries
                WHERE id = ?1 AND is_deleted = 0
                "#,
                params![id],
                |row| {
                    Ok(BottlingEntry {
                        id: row.get(0)?,
                        product_id: row.get(1)?,
                        sku_id: row.get(2)?,
                        bottles_filled: row.get(3)?,
                        bottled_at_ist: row.get(4)?,
                        bottled_at_epoch: row.get(5)?,
                        location_id: row.get(6)?,
                        created_by: row.get(7)?,
                        is_deleted: row.get(8)?,
                    })
                },
            )
            .optional()?)
    }
}
