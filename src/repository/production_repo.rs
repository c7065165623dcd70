// ==========================================
// Just Pressed 运营管理系统 - 榨油批次数据仓储
// ==========================================
// 守卫:
// - 同一机台同一时刻只允许一个 in_progress 批次
// - 停机更新以 batch_status = 'in_progress' 为条件
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::production::{ProductionBatch, RunningBatchView};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::domain::types::{BatchStatus, QtyUnit};
use crate::repository::db_utils::{fmt_ts, invalid_enum, parse_date};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT batch_id, production_date, machine_id, operator_id, raw_material_id,
           seed_type, seed_input_qty, unit, oil_output_qty, cake_output_qty,
           batch_status, start_time_ist, start_epoch, end_time_ist, end_epoch,
           location_id, created_by, updated_by, is_deleted
    FROM production_batches
"#;

/// 停机写入参数
#[derive(Debug, Clone)]
pub struct BatchCompletion<'a> {
    pub batch_id: &'a str,
    pub oil_output_qty: f64,
    pub cake_output_qty: f64,
    pub end_time_ist: &'a str,
    pub end_epoch: i64,
    pub updated_by: &'a str,
    pub updated_at: chrono::NaiveDateTime,
}

pub struct ProductionBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionBatchRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 机台空闲时插入新批次
    ///
    /// # 返回
    /// - Ok(true): 已插入
    /// - Ok(false): 机台已有运行中批次，未插入
    /// - Err(UniqueConstraintViolation): 批次编号冲突（调用方换号重试）
    pub fn insert_if_machine_idle(
        &self,
        batch: &ProductionBatch,
        log: &ActionLog,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let busy: Option<String> = tx
            .query_row(
                "SELECT batch_id FROM production_batches
                 WHERE machine_id = ?1 AND batch_status = 'in_progress' AND is_deleted = 0
                 LIMIT 1",
                params![batch.machine_id],
                |row| row.get(0),
            )
            .optional()?;
        if busy.is_some() {
            return Ok(false);
        }

        tx.execute(
            r#"
            INSERT INTO production_batches (
                batch_id, production_date, machine_id, operator_id, raw_material_id,
                seed_type, seed_input_qty, unit, oil_output_qty, cake_output_qty,
                batch_status, start_time_ist, start_epoch, end_time_ist, end_epoch,
                location_id, created_by, updated_by, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                batch.batch_id,
                batch.production_date.format("%Y-%m-%d").to_string(),
                batch.machine_id,
                batch.operator_id,
                batch.raw_material_id,
                batch.seed_type,
                batch.seed_input_qty,
                batch.unit.to_db_str(),
                batch.oil_output_qty,
                batch.cake_output_qty,
                batch.batch_status.to_db_str(),
                batch.start_time_ist,
                batch.start_epoch,
                batch.end_time_ist,
                batch.end_epoch,
                batch.location_id,
                batch.created_by,
                batch.updated_by,
                batch.is_deleted,
            ],
        )?;
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(true)
    }

    /// 停机：in_progress → completed
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 批次已完成
    /// - Err(NotFound): 批次不存在或已删除
    pub fn complete(&self, c: &BatchCompletion<'_>, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let rows = tx.execute(
            r#"
            UPDATE production_batches SET
                oil_output_qty = ?2, cake_output_qty = ?3, batch_status = 'completed',
                end_time_ist = ?4, end_epoch = ?5, updated_by = ?6, updated_at = ?7
            WHERE batch_id = ?1 AND batch_status = 'in_progress' AND is_deleted = 0
            "#,
            params![
                c.batch_id,
                c.oil_output_qty,
                c.cake_output_qty,
                c.end_time_ist,
                c.end_epoch,
                c.updated_by,
                fmt_ts(&c.updated_at),
            ],
        )?;

        if rows == 1 {
            ActionLogRepository::insert_on(&tx, log)?;
            tx.commit()?;
            return Ok(());
        }

        let status: Option<String> = tx
            .query_row(
                "SELECT batch_status FROM production_batches WHERE batch_id = ?1 AND is_deleted = 0",
                params![c.batch_id],
                |row| row.get(0),
            )
            .optional()?;
        match status {
            Some(s) => Err(RepositoryError::InvalidStateTransition {
                from: s,
                to: BatchStatus::Completed.to_db_str().to_string(),
            }),
            None => Err(RepositoryError::not_found("ProductionBatch", c.batch_id)),
        }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<ProductionBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE batch_id = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![batch_id], map_batch)
            .optional()?)
    }

    /// 运行中批次（新 → 旧，带机台编码与油籽名）
    pub fn list_running(&self) -> RepositoryResult<Vec<RunningBatchView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT b.batch_id, b.machine_id, COALESCE(m.machine_code, '—'),
                   b.raw_material_id, COALESCE(r.name, b.seed_type, '—'),
                   b.seed_input_qty, b.unit, b.start_time_ist, b.start_epoch
            FROM production_batches b
            LEFT JOIN machines m ON m.machine_id = b.machine_id
            LEFT JOIN raw_materials r ON r.id = b.raw_material_id
            WHERE b.batch_status = 'in_progress' AND b.is_deleted = 0
            ORDER BY b.start_epoch DESC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let unit: String = row.get(6)?;
                Ok(RunningBatchView {
                    batch_id: row.get(0)?,
                    machine_id: row.get(1)?,
                    machine_code: row.get(2)?,
                    raw_material_id: row.get(3)?,
                    seed_name: row.get(4)?,
                    seed_input_qty: row.get(5)?,
                    unit: QtyUnit::from_str(&unit).ok_or_else(|| invalid_enum(6, &unit))?,
                    start_time_ist: row.get(7)?,
                    start_epoch: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 运行中批次数量
    pub fn count_running(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM production_batches WHERE batch_status = 'in_progress' AND is_deleted = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn map_batch(row: &Row) -> rusqlite::Result<ProductionBatch> {
    let production_date: String = row.get(1)?;
    let unit: String = row.get(7)?;
    let status: String = row.get(10)?;
    Ok(ProductionBatch {
        batch_id: row.get(0)?,
        production_date: parse_date(1, &production_date)?,
        machine_id: row.get(2)?,
        operator_id: row.get(3)?,
        raw_material_id: row.get(4)?,
        seed_type: row.get(5)?,
        seed_input_qty: row.get(6)?,
        unit: QtyUnit::from_str(&unit).ok_or_else(|| invalid_enum(7, &unit))?,
        oil_output_qty: row.get(8)?,
        cake_output_qty: row.get(9)?,
        batch_status: BatchStatus::from_str(&status).ok_or_else(|| invalid_enum(10, &status))?,
        start_time_ist: row.get(11)?,
        start_epoch: row.get(12)?,
        end_time_ist: row.get(13)?,
        end_epoch: row.get(14)?,
        location_id: row.get(15)?,
        created_by: row.get(16)?,
        updated_by: row.get(17)?,
        is_deleted: row.get(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action_log::ActionType;
    use chrono::{NaiveDate, Utc};

    fn log(action_type: ActionType, id: &str) -> ActionLog {
        ActionLog::new(action_type, "u1", "production_batch", id)
    }

    fn setup() -> ProductionBatchRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO machines (machine_id, machine_code, machine_name, machine_type, status)
               VALUES ('m1', 'P1', 'Press 1', 'Expeller', 'active');
             INSERT INTO raw_materials (id, name, active) VALUES ('s1', 'Groundnut', 1);",
        )
        .unwrap();
        ProductionBatchRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn batch(id: &str, start_epoch: i64) -> ProductionBatch {
        ProductionBatch {
            batch_id: id.into(),
            production_date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            machine_id: "m1".into(),
            operator_id: "u1".into(),
            raw_material_id: "s1".into(),
            seed_type: "Groundnut".into(),
            seed_input_qty: 100.0,
            unit: QtyUnit::Kg,
            oil_output_qty: None,
            cake_output_qty: None,
            batch_status: BatchStatus::InProgress,
            start_time_ist: "03-Feb-2026 10:00:00".into(),
            start_epoch,
            end_time_ist: None,
            end_epoch: None,
            location_id: None,
            created_by: "u1".into(),
            updated_by: None,
            is_deleted: false,
        }
    }

    fn completion(batch_id: &str) -> BatchCompletion<'_> {
        BatchCompletion {
            batch_id,
            oil_output_qty: 60.0,
            cake_output_qty: 35.0,
            end_time_ist: "03-Feb-2026 12:00:00",
            end_epoch: 2,
            updated_by: "u1",
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn start(repo: &ProductionBatchRepository, id: &str, epoch: i64) -> RepositoryResult<bool> {
        repo.insert_if_machine_idle(&batch(id, epoch), &log(ActionType::StartExtraction, id))
    }

    fn stop(repo: &ProductionBatchRepository, id: &str) -> RepositoryResult<()> {
        repo.complete(&completion(id), &log(ActionType::StopExtraction, id))
    }

    #[test]
    fn test_machine_busy_guard() {
        let repo = setup();
        assert!(start(&repo, "BP-1", 1).unwrap());
        assert!(!start(&repo, "BP-2", 2).unwrap());

        stop(&repo, "BP-1").unwrap();
        assert!(start(&repo, "BP-2", 2).unwrap());
    }

    #[test]
    fn test_complete_twice_is_invalid_transition() {
        let repo = setup();
        start(&repo, "BP-1", 1).unwrap();
        stop(&repo, "BP-1").unwrap();

        let stored = repo.find_by_id("BP-1").unwrap().unwrap();
        assert_eq!(stored.batch_status, BatchStatus::Completed);
        assert_eq!(stored.oil_output_qty, Some(60.0));

        assert!(matches!(
            stop(&repo, "BP-1"),
            Err(RepositoryError::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            stop(&repo, "BP-404"),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_batch_code_is_unique_violation() {
        let repo = setup();
        start(&repo, "BP-1", 1).unwrap();
        stop(&repo, "BP-1").unwrap();
        assert!(matches!(
            start(&repo, "BP-1", 3),
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
    }

    #[test]
    fn test_list_running_is_denormalized() {
        let repo = setup();
        start(&repo, "BP-1", 1).unwrap();
        let running = repo.list_running().unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].machine_code, "P1");
        assert_eq!(running[0].seed_name, "Groundnut");
        assert_eq!(repo.count_running().unwrap(), 1);
    }
}
