use super::core::{ActionLogRepository, SELECT_COLUMNS};
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![action_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某个实体的全部日志（新 → 旧）
    pub fn find_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE entity_type = ? AND entity_id = ? ORDER BY action_ts DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![entity_type, entity_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询某个操作人的最近日志
    pub fn find_by_actor(&self, actor: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE actor = ? ORDER BY action_ts DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![actor, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询指定时间范围的操作日志
    pub fn find_by_time_range(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE action_ts BETWEEN ? AND ? ORDER BY action_ts DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(
                params![
                    start_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                    end_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                ],
                map_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 最近 N 条日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY action_ts DESC LIMIT ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}

fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let action_ts_str: String = row.get(2)?;
    let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let payload_json_str: Option<String> = row.get(6)?;
    let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        action_ts,
        actor: row.get(3)?,
        entity_type: row.get(4)?,
        entity_id: row.get(5)?,
        payload_json,
        detail: row.get(7)?,
    })
}
