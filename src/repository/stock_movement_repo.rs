// ==========================================
// Just Pressed 运营管理系统 - 库间调拨数据仓储
// ==========================================
// 事务:
// - 发出: 单头 + 明细 + 操作日志一次提交
// - 验收: 明细实收 + 单头状态翻转 + 操作日志一次提交，以 status = 'pending' 为条件
// ==========================================

use crate::clock::{ist_date_of, ist_day_bounds_ms};
use crate::domain::action_log::ActionLog;
use crate::domain::stock_movement::{
    friendly_code, NewTransferLine, PendingTransferView, ReceivedQty, StockMovement,
    TransferItemView,
};
use crate::domain::types::{TransferReason, TransferStatus};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::db_utils::invalid_enum;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT movement_id, from_location_id, to_location_id, status, sent_by,
           sent_at_ist, sent_at_epoch, notes, verified_by, verified_at_ist,
           verified_at_epoch, verify_remarks, is_deleted
    FROM stock_movements
"#;

/// 验收写入参数
#[derive(Debug, Clone)]
pub struct VerifyCommand<'a> {
    pub movement_id: &'a str,
    pub received: &'a [ReceivedQty],
    pub verified_by: &'a str,
    pub verified_at_ist: &'a str,
    pub verified_at_epoch: i64,
    pub remarks: Option<&'a str>,
}

pub struct StockMovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockMovementRepository {
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

    /// 发出调拨：单头 + 明细 + 日志（单事务）
    ///
    /// 日志 payload 在事务内补上 friendly_code
    ///
    /// # 返回
    /// - Ok(调拨编号)
    pub fn insert_with_items(
        &self,
        header: &StockMovement,
        lines: &[NewTransferLine],
        mut log: ActionLog,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO stock_movements (
                movement_id, from_location_id, to_location_id, status, sent_by,
                sent_at_ist, sent_at_epoch, notes, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            "#,
            params![
                header.movement_id,
                header.from_location_id,
                header.to_location_id,
                header.status.to_db_str(),
                header.sent_by,
                header.sent_at_ist,
                header.sent_at_epoch,
                header.notes,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO stock_movement_items (movement_id, sku_id, qty_sent, reason)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for line in lines {
                stmt.execute(params![
                    header.movement_id,
                    line.sku_id,
                    line.qty_sent,
                    line.reason.to_db_str(),
                ])?;
            }
        }

        let code = Self::friendly_code_on(&tx, &header.movement_id)?;
        if let Some(serde_json::Value::Object(map)) = log.payload_json.as_mut() {
            map.insert("friendly_code".to_string(), serde_json::Value::from(code.as_str()));
        }
        ActionLogRepository::insert_on(&tx, &log)?;

        tx.commit()?;
        Ok(code)
    }

    /// 验收调拨（单事务，pending → verified）
    ///
    /// - received 中的明细必须属于该调拨，否则整体回滚
    /// - 未提交实收的明细按发出数量入账
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 已验收
    /// - Err(NotFound): 调拨不存在或已删除
    /// - Err(BusinessRuleViolation): 明细不属于该调拨
    pub fn verify(&self, cmd: &VerifyCommand<'_>, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM stock_movements WHERE movement_id = ?1 AND is_deleted = 0",
                params![cmd.movement_id],
                |row| row.get(0),
            )
            .optional()?;
        match status.as_deref() {
            None => return Err(RepositoryError::not_found("StockMovement", cmd.movement_id)),
            Some(s) if s != TransferStatus::Pending.to_db_str() => {
                return Err(RepositoryError::InvalidStateTransition {
                    from: s.to_string(),
                    to: TransferStatus::Verified.to_db_str().to_string(),
                });
            }
            Some(_) => {}
        }

        {
            let mut stmt = tx.prepare(
                "UPDATE stock_movement_items SET qty_received = ?3
                 WHERE item_id = ?1 AND movement_id = ?2 AND is_deleted = 0",
            )?;
            for r in cmd.received {
                let rows = stmt.execute(params![r.item_id, cmd.movement_id, r.qty_received])?;
                if rows == 0 {
                    return Err(RepositoryError::BusinessRuleViolation(format!(
                        "明细 {} 不属于调拨 {}",
                        r.item_id, cmd.movement_id
                    )));
                }
            }
        }

        tx.execute(
            "UPDATE stock_movement_items SET qty_received = qty_sent
             WHERE movement_id = ?1 AND qty_received IS NULL AND is_deleted = 0",
            params![cmd.movement_id],
        )?;

        let rows = tx.execute(
            r#"
            UPDATE stock_movements SET
                status = 'verified', verified_by = ?2, verified_at_ist = ?3,
                verified_at_epoch = ?4, verify_remarks = ?5
            WHERE movement_id = ?1 AND status = 'pending'
            "#,
            params![
                cmd.movement_id,
                cmd.verified_by,
                cmd.verified_at_ist,
                cmd.verified_at_epoch,
                cmd.remarks,
            ],
        )?;
        if rows != 1 {
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "调拨 {} 状态翻转失败",
                cmd.movement_id
            )));
        }
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, movement_id: &str) -> RepositoryResult<Option<StockMovement>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE movement_id = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![movement_id], map_movement)
            .optional()?)
    }

    /// 待验收列表（新 → 旧，带地点名称/编码与友好编号）
    pub fn list_pending(&self) -> RepositoryResult<Vec<PendingTransferView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sm.movement_id,
                   sm.from_location_id, COALESCE(lf.location_name, ''), COALESCE(lf.location_code, ''),
                   sm.to_location_id, COALESCE(lt.location_name, ''), COALESCE(lt.location_code, ''),
                   sm.sent_by, sm.sent_at_ist, sm.sent_at_epoch, sm.notes,
                   (SELECT COUNT(*) FROM stock_movement_items i
                     WHERE i.movement_id = sm.movement_id AND i.is_deleted = 0)
            FROM stock_movements sm
            LEFT JOIN locations lf ON lf.location_id = sm.from_location_id
            LEFT JOIN locations lt ON lt.location_id = sm.to_location_id
            WHERE sm.status = 'pending' AND sm.is_deleted = 0
            ORDER BY sm.sent_at_epoch DESC
            "#,
        )?;

        let mut views = stmt
            .query_map([], |row| {
                Ok(PendingTransferView {
                    movement_id: row.get(0)?,
                    friendly_code: String::new(),
                    from_location_id: row.get(1)?,
                    from_location_name: row.get(2)?,
                    from_location_code: row.get(3)?,
                    to_location_id: row.get(4)?,
                    to_location_name: row.get(5)?,
                    to_location_code: row.get(6)?,
                    sent_by: row.get(7)?,
                    sent_at_ist: row.get(8)?,
                    sent_at_epoch: row.get(9)?,
                    notes: row.get(10)?,
                    item_count: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        for v in views.iter_mut() {
            let serial = Self::pair_day_serial(
                &conn,
                &v.movement_id,
                &v.from_location_id,
                &v.to_location_id,
                v.sent_at_epoch,
            )?;
            v.friendly_code = friendly_code(
                ist_date_of(v.sent_at_epoch),
                &v.from_location_code,
                &v.to_location_code,
                serial,
            );
        }
        Ok(views)
    }

    /// 调拨的友好编号
    pub fn friendly_code_of(&self, movement_id: &str) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::friendly_code_on(&conn, movement_id)
    }

    fn friendly_code_on(conn: &Connection, movement_id: &str) -> RepositoryResult<String> {
        let row: Option<(String, String, i64, String, String)> = conn
            .query_row(
                r#"
                SELECT sm.from_location_id, sm.to_location_id, sm.sent_at_epoch,
                       COALESCE(lf.location_code, ''), COALESCE(lt.location_code, '')
                FROM stock_movements sm
                LEFT JOIN locations lf ON lf.location_id = sm.from_location_id
                LEFT JOIN locations lt ON lt.location_id = sm.to_location_id
                WHERE sm.movement_id = ?1 AND sm.is_deleted = 0
                "#,
                params![movement_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;
        let (from_id, to_id, sent_at_epoch, from_code, to_code) =
            row.ok_or_else(|| RepositoryError::not_found("StockMovement", movement_id))?;

        let serial = Self::pair_day_serial(conn, movement_id, &from_id, &to_id, sent_at_epoch)?;
        Ok(friendly_code(ist_date_of(sent_at_epoch), &from_code, &to_code, serial))
    }

    /// 验收界面明细（实收预填为发出数量）
    pub fn list_items_for_verify(&self, movement_id: &str) -> RepositoryResult<Vec<TransferItemView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT i.item_id, i.sku_id, COALESCE(s.sku_code, ''), COALESCE(p.product_name, ''),
                   i.qty_sent, i.reason, COALESCE(i.qty_received, i.qty_sent)
            FROM stock_movement_items i
            LEFT JOIN skus s ON s.sku_id = i.sku_id
            LEFT JOIN products p ON p.product_id = s.product_id
            WHERE i.movement_id = ?1 AND i.is_deleted = 0
            ORDER BY i.item_id
            "#,
        )?;
        let items = stmt
            .query_map(params![movement_id], |row| {
                let reason: String = row.get(5)?;
                Ok(TransferItemView {
                    item_id: row.get(0)?,
                    sku_id: row.get(1)?,
                    sku_code: row.get(2)?,
                    product_name: row.get(3)?,
                    qty_sent: row.get(4)?,
                    reason: TransferReason::from_str(&reason)
                        .ok_or_else(|| invalid_enum(5, &reason))?,
                    qty_received: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// 同一天（IST）同一对地点中的序号，从 1 开始
    fn pair_day_serial(
        conn: &Connection,
        movement_id: &str,
        from_id: &str,
        to_id: &str,
        sent_at_epoch: i64,
    ) -> RepositoryResult<i64> {
        let (day_start, _) = ist_day_bounds_ms(ist_date_of(sent_at_epoch));
        let n: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM stock_movements
            WHERE from_location_id = ?1 AND to_location_id = ?2 AND is_deleted = 0
              AND sent_at_epoch >= ?3
              AND (sent_at_epoch < ?4 OR (sent_at_epoch = ?4 AND movement_id <= ?5))
            "#,
            params![from_id, to_id, day_start, sent_at_epoch, movement_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn map_movement(row: &Row) -> rusqlite::Result<StockMovement> {
    let status: String = row.get(3)?;
    Ok(StockMovement {
        movement_id: row.get(0)?,
        from_location_id: row.get(1)?,
        to_location_id: row.get(2)?,
        status: TransferStatus::from_str(&status).ok_or_else(|| invalid_enum(3, &status))?,
        sent_by: row.get(4)?,
        sent_at_ist: row.get(5)?,
        sent_at_epoch: row.get(6)?,
        notes: row.get(7)?,
        verified_by: row.get(8)?,
        verified_at_ist: row.get(9)?,
        verified_at_epoch: row.get(10)?,
        verify_remarks: row.get(11)?,
        is_deleted: row.get(12)?,
    })
}
