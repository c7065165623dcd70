// ==========================================
// Just Pressed 运营管理系统 - 发货数据仓储
// ==========================================
// 单头 + 明细 + 操作日志在同一事务内写入
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::dispatch::{Dispatch, DispatchItem};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::db_utils::parse_date;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct DispatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DispatchRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入发货单（单头 + 明细 + 日志）
    pub fn insert_with_items(&self, dispatch: &Dispatch, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO dispatches (
                dispatch_id, from_location_id, shipped_to, dispatch_date,
                dispatched_at_ist, dispatched_at_epoch, dispatched_by, remarks, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            "#,
            params![
                dispatch.dispatch_id,
                dispatch.from_location_id,
                dispatch.shipped_to,
                dispatch.dispatch_date.format("%Y-%m-%d").to_string(),
                dispatch.dispatched_at_ist,
                dispatch.dispatched_at_epoch,
                dispatch.dispatched_by,
                dispatch.remarks,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO dispatch_items (dispatch_id, sku_id, quantity_dispatched)
                 VALUES (?1, ?2, ?3)",
            )?;
            for item in &dispatch.items {
                stmt.execute(params![
                    dispatch.dispatch_id,
                    item.sku_id,
                    item.quantity_dispatched
                ])?;
            }
        }
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, dispatch_id: &str) -> RepositoryResult<Option<Dispatch>> {
        let conn = self.get_conn()?;
        let header = conn
            .query_row(
                r#"
                SELECT dispatch_id, from_location_id, shipped_to, dispatch_date,
                       dispatched_at_ist, dispatched_at_epoch, dispatched_by, remarks
                FROM dispatches
                WHERE dispatch_id = ?1 AND is_deleted = 0
                "#,
                params![dispatch_id],
                |row| {
                    let date: String = row.get(3)?;
                    Ok(Dispatch {
                        dispatch_id: row.get(0)?,
                        from_location_id: row.get(1)?,
                        shipped_to: row.get(2)?,
                        dispatch_date: parse_date(3, &date)?,
                        dispatched_at_ist: row.get(4)?,
                        dispatched_at_epoch: row.get(5)?,
                        dispatched_by: row.get(6)?,
                        remarks: row.get(7)?,
                        items: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut dispatch) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT sku_id, quantity_dispatched FROM dispatch_items
             WHERE dispatch_id = ?1 ORDER BY item_id",
        )?;
        dispatch.items = stmt
            .query_map(params![dispatch_id], |row| {
                Ok(DispatchItem {
                    sku_id: row.get(0)?,
                    quantity_dispatched: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(dispatch))
    }

    /// 最近发货单头（新 → 旧，不含明细）
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<Dispatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT dispatch_id, from_location_id, shipped_to, dispatch_date,
                   dispatched_at_ist, dispatched_at_epoch, dispatched_by, remarks
            FROM dispatches
            WHERE is_deleted = 0
            ORDER BY dispatched_at_epoch DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let date: String = row.get(3)?;
                Ok(Dispatch {
                    dispatch_id: row.get(0)?,
                    from_location_id: row.get(1)?,
                    shipped_to: row.get(2)?,
                    dispatch_date: parse_date(3, &date)?,
                    dispatched_at_ist: row.get(4)?,
                    dispatched_at_epoch: row.get(5)?,
                    dispatched_by: row.get(6)?,
                    remarks: row.get(7)?,
                    items: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
