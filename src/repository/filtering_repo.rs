// ==========================================
// Just Pressed 运营管理系统 - 过滤记录数据仓储
// ==========================================
// 运行中: stop_epoch IS NULL
// 停止更新以运行中为条件
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::production::{
    filter_state_of, FilteringEntry, RunningFilterView, FILTER_STATE_STOPPED,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, raw_material_id, input_qty_kg, filtered_oil_kg,
           start_time_ist, start_epoch, stop_time_ist, stop_epoch,
           location_id, created_by, stopped_by, is_deleted
    FROM filtering_entries
"#;

/// 停止过滤写入参数
#[derive(Debug)]
pub struct FilterStop<'a> {
    pub id: &'a str,
    pub filtered_oil_kg: f64,
    pub stop_time_ist: &'a str,
    pub stop_epoch: i64,
    pub stopped_by: &'a str,
}

pub struct FilteringRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FilteringRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建过滤记录（与操作日志同一事务）
    pub fn insert(&self, entry: &FilteringEntry, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO filtering_entries (
                id, raw_material_id, input_qty_kg, filtered_oil_kg,
                start_time_ist, start_epoch, stop_time_ist, stop_epoch,
                location_id, created_by, stopped_by, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                entry.id,
                entry.raw_material_id,
                entry.input_qty_kg,
                entry.filtered_oil_kg,
                entry.start_time_ist,
                entry.start_epoch,
                entry.stop_time_ist,
                entry.stop_epoch,
                entry.location_id,
                entry.created_by,
                entry.stopped_by,
                entry.is_deleted,
            ],
        )?;
        ActionLogRepository::insert_on(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    /// 停止过滤：写入过滤油量与停止时间（与操作日志同一事务）
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 已停止（from 取自记录当前状态）
    /// - Err(NotFound): 不存在或已删除
    pub fn stop(&self, stop: &FilterStop, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let rows = tx.execute(
            r#"
            UPDATE filtering_entries SET
                filtered_oil_kg = ?2, stop_time_ist = ?3, stop_epoch = ?4, stopped_by = ?5
            WHERE id = ?1 AND stop_epoch IS NULL AND is_deleted = 0
            "#,
            params![
                stop.id,
                stop.filtered_oil_kg,
                stop.stop_time_ist,
                stop.stop_epoch,
                stop.stopped_by
            ],
        )?;
        if rows == 1 {
            ActionLogRepository::insert_on(&tx, log)?;
            tx.commit()?;
            return Ok(());
        }

        let current: Option<Option<i64>> = tx
            .query_row(
                "SELECT stop_epoch FROM filtering_entries WHERE id = ?1 AND is_deleted = 0",
                params![stop.id],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            Some(stop_epoch) => Err(RepositoryError::InvalidStateTransition {
                from: filter_state_of(stop_epoch).to_string(),
                to: FILTER_STATE_STOPPED.to_string(),
            }),
            None => Err(RepositoryError::not_found("FilteringEntry", stop.id)),
        }
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<FilteringEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_entry).optional()?)
    }

    /// 运行中过滤（新 → 旧，带油籽名）
    pub fn list_running(&self) -> RepositoryResult<Vec<RunningFilterView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT f.id, f.raw_material_id, COALESCE(r.name, '—'),
                   f.input_qty_kg, f.start_time_ist, f.start_epoch
            FROM filtering_entries f
            LEFT JOIN raw_materials r ON r.id = f.raw_material_id
            WHERE f.stop_epoch IS NULL AND f.is_deleted = 0
            ORDER BY f.start_epoch DESC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RunningFilterView {
                    id: row.get(0)?,
                    raw_material_id: row.get(1)?,
                    seed_name: row.get(2)?,
                    input_qty_kg: row.get(3)?,
                    start_time_ist: row.get(4)?,
                    start_epoch: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_entry(row: &Row) -> rusqlite::Result<FilteringEntry> {
    Ok(FilteringEntry {
        id: row.get(0)?,
        raw_material_id: row.get(1)?,
        input_qty_kg: row.get(2)?,
        filtered_oil_kg: row.get(3)?,
        start_time_ist: row.get(4)?,
        start_epoch: row.get(5)?,
        stop_time_ist: row.get(6)?,
        stop_epoch: row.get(7)?,
        location_id: row.get(8)?,
        created_by: row.get(9)?,
        stopped_by: row.get(10)?,
        is_deleted: row.get(11)?,
    })
}
