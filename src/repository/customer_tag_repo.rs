// ==========================================
// Just Pressed 运营管理系统 - 客户标签数据仓储
// ==========================================
// 唯一性: tag_name COLLATE NOCASE UNIQUE
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::customer::{tag_color_for_count, CustomerTag};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::db_utils::{build_in_clause, fmt_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "SELECT tag_id, tag_name, tag_color, is_active, created_at FROM customer_tags";

pub struct CustomerTagRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerTagRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建标签：同一事务内计算轮换颜色并插入
    ///
    /// # 返回
    /// - Ok(Some(tag)): 创建成功
    /// - Ok(None): 同名标签（忽略大小写）已存在，不写日志
    pub fn create_with_rotation(
        &self,
        tag_id: &str,
        tag_name: &str,
        created_at: &chrono::NaiveDateTime,
        log: ActionLog,
    ) -> RepositoryResult<Option<CustomerTag>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT tag_id FROM customer_tags WHERE tag_name = ?1 COLLATE NOCASE",
                params![tag_name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Ok(None);
        }

        let active_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM customer_tags WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;

        let tag = CustomerTag {
            tag_id: tag_id.to_string(),
            tag_name: tag_name.to_string(),
            tag_color: tag_color_for_count(active_count).to_string(),
            is_active: true,
            created_at: *created_at,
        };

        tx.execute(
            "INSERT INTO customer_tags (tag_id, tag_name, tag_color, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![tag.tag_id, tag.tag_name, tag.tag_color, fmt_ts(&tag.created_at)],
        )?;
        let log = log.with_payload(&serde_json::json!({
            "tag_name": tag.tag_name,
            "tag_color": tag.tag_color,
        }));
        ActionLogRepository::insert_on(&tx, &log)?;

        tx.commit()?;
        Ok(Some(tag))
    }

    /// 激活标签列表（按名称）
    pub fn list_active(&self) -> RepositoryResult<Vec<CustomerTag>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE is_active = 1 ORDER BY tag_name", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let tags = stmt
            .query_map([], map_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// 按 ID 批量查询激活标签
    pub fn find_active_by_ids(&self, tag_ids: &[String]) -> RepositoryResult<Vec<CustomerTag>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE is_active = 1 AND {} ORDER BY tag_name",
            SELECT_COLUMNS,
            build_in_clause("tag_id", tag_ids)
        );
        let mut stmt = conn.prepare(&sql)?;
        let tags = stmt
            .query_map(params_from_iter(tag_ids.iter()), map_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }
}

fn map_tag(row: &Row) -> rusqlite::Result<CustomerTag> {
    let created_at: String = row.get(4)?;
    Ok(CustomerTag {
        tag_id: row.get(0)?,
        tag_name: row.get(1)?,
        tag_color: row.get(2)?,
        is_active: row.get(3)?,
        created_at: parse_ts(4, &created_at)?,
    })
}
