// ==========================================
// Just Pressed 运营管理系统 - 退货数据仓储
// ==========================================
// return_code 唯一；冲突以 UniqueConstraintViolation 返回，由调用方换号重试
// 单头 + 明细 + 操作日志在同一事务内写入
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::returns::{ProductReturn, ReturnItem};
use crate::domain::types::{ReturnAction, ReturnCondition};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::db_utils::{invalid_enum, parse_date, parse_string_list, string_list_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT return_id, return_code, received_location_id, order_id, awb_number,
           received_date, received_at_ist, received_at_epoch, received_by, remarks,
           photos_json, videos_json
    FROM returns
"#;

pub struct ReturnRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReturnRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入退货单（单头 + 明细 + 日志）
    pub fn insert_with_items(&self, ret: &ProductReturn, log: &ActionLog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO returns (
                return_id, return_code, received_location_id, order_id, awb_number,
                received_date, received_at_ist, received_at_epoch, received_by, remarks,
                photos_json, videos_json, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0)
            "#,
            params![
                ret.return_id,
                ret.return_code,
                ret.received_location_id,
                ret.order_id,
                ret.awb_number,
                ret.received_date.format("%Y-%m-%d").to_string(),
                ret.received_at_ist,
                ret.received_at_epoch,
                ret.received_by,
                ret.remarks,
                string_list_json(&ret.photos),
                string_list_json(&ret.videos),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO return_items (
                    return_id, sku_id, quantity_returned, physical_condition, action_taken
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for item in &ret.items {
                stmt.execute(params![
                    ret.return_id,
                    item.sku_id,
                    item.quantity_returned,
                    item.physical_condition.to_db_str(),
                    item.action_taken.to_db_str(),
                ])?;
            }
        }
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, return_id: &str) -> RepositoryResult<Option<ProductReturn>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE return_id = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        let header = conn.query_row(&sql, params![return_id], map_header).optional()?;
        match header {
            Some(mut ret) => {
                ret.items = Self::load_items(&conn, &ret.return_id)?;
                Ok(Some(ret))
            }
            None => Ok(None),
        }
    }

    pub fn find_by_code(&self, return_code: &str) -> RepositoryResult<Option<ProductReturn>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE return_code = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        let header = conn.query_row(&sql, params![return_code], map_header).optional()?;
        match header {
            Some(mut ret) => {
                ret.items = Self::load_items(&conn, &ret.return_id)?;
                Ok(Some(ret))
            }
            None => Ok(None),
        }
    }

    fn load_items(conn: &Connection, return_id: &str) -> RepositoryResult<Vec<ReturnItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT sku_id, quantity_returned, physical_condition, action_taken
            FROM return_items WHERE return_id = ?1 ORDER BY item_id
            "#,
        )?;
        let items = stmt
            .query_map(params![return_id], |row| {
                let condition: String = row.get(2)?;
                let action: String = row.get(3)?;
                Ok(ReturnItem {
                    sku_id: row.get(0)?,
                    quantity_returned: row.get(1)?,
                    physical_condition: ReturnCondition::from_str(&condition)
                        .ok_or_else(|| invalid_enum(2, &condition))?,
                    action_taken: ReturnAction::from_str(&action)
                        .ok_or_else(|| invalid_enum(3, &action))?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}

fn map_header(row: &Row) -> rusqlite::Result<ProductReturn> {
    let date: String = row.get(5)?;
    Ok(ProductReturn {
        return_id: row.get(0)?,
        return_code: row.get(1)?,
        received_location_id: row.get(2)?,
        order_id: row.get(3)?,
        awb_number: row.get(4)?,
        received_date: parse_date(5, &date)?,
        received_at_ist: row.get(6)?,
        received_at_epoch: row.get(7)?,
        received_by: row.get(8)?,
        remarks: row.get(9)?,
        photos: parse_string_list(row.get(10)?),
        videos: parse_string_list(row.get(11)?),
        items: Vec::new(),
    })
}
