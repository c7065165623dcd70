// ==========================================
// Just Pressed 运营管理系统 - 客户数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问与完整性守卫
// 守卫: 手机号查重与写入在同一个 IMMEDIATE 事务内完成
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::customer::Customer;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::db_utils::{fmt_ts, like_contains, parse_string_list, parse_ts, string_list_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT customer_id, customer_name, country_code, phone, pincode,
           address_line1, address_line2, lat_long, google_maps_code, landmark,
           city, state, tags_json, notes, is_active, is_deleted,
           created_by, created_at, updated_at
    FROM customers
"#;

/// 带手机号守卫的写入结果
#[derive(Debug, Clone, PartialEq)]
pub enum PhoneGuard {
    /// 已写入
    Written,
    /// 手机号已被其他未删除客户占用，未写入
    Duplicate(Customer),
}

// ==========================================
// CustomerRepository - 客户仓储
// ==========================================
pub struct CustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入客户（手机号守卫）
    ///
    /// # 参数
    /// - customer: 待插入客户
    /// - allow_duplicate_phone: 已人工确认时为 true，跳过查重
    /// - log: 操作日志（与客户记录同一事务写入）
    ///
    /// # 返回
    /// - Ok(PhoneGuard::Written): 已插入
    /// - Ok(PhoneGuard::Duplicate(existing)): 发现重复，未插入
    pub fn insert_guarded(
        &self,
        customer: &Customer,
        allow_duplicate_phone: bool,
        log: &ActionLog,
    ) -> RepositoryResult<PhoneGuard> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !allow_duplicate_phone {
            if let Some(phone) = customer.phone.as_deref() {
                if let Some(existing) = Self::find_live_by_phone(&tx, phone, None)? {
                    return Ok(PhoneGuard::Duplicate(existing));
                }
            }
        }

        tx.execute(
            r#"
            INSERT INTO customers (
                customer_id, customer_name, country_code, phone, pincode,
                address_line1, address_line2, lat_long, google_maps_code, landmark,
                city, state, tags_json, notes, is_active, is_deleted,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                customer.customer_id,
                customer.customer_name,
                customer.country_code,
                customer.phone,
                customer.pincode,
                customer.address_line1,
                customer.address_line2,
                customer.lat_long,
                customer.google_maps_code,
                customer.landmark,
                customer.city,
                customer.state,
                string_list_json(&customer.tags),
                customer.notes,
                customer.is_active,
                customer.is_deleted,
                customer.created_by,
                fmt_ts(&customer.created_at),
                fmt_ts(&customer.updated_at),
            ],
        )?;
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(PhoneGuard::Written)
    }

    /// 更新客户可编辑字段（手机号守卫，排除自身）
    ///
    /// 仅更新未删除记录；记录不存在或已删除返回 NotFound。
    pub fn update_guarded(
        &self,
        customer: &Customer,
        allow_duplicate_phone: bool,
        log: &ActionLog,
    ) -> RepositoryResult<PhoneGuard> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !allow_duplicate_phone {
            if let Some(phone) = customer.phone.as_deref() {
                if let Some(existing) =
                    Self::find_live_by_phone(&tx, phone, Some(&customer.customer_id))?
                {
                    return Ok(PhoneGuard::Duplicate(existing));
                }
            }
        }

        let rows = tx.execute(
            r#"
            UPDATE customers SET
                customer_name = ?2, country_code = ?3, phone = ?4, pincode = ?5,
                address_line1 = ?6, address_line2 = ?7, lat_long = ?8,
                google_maps_code = ?9, landmark = ?10, city = ?11, state = ?12,
                tags_json = ?13, notes = ?14, updated_at = ?15
            WHERE customer_id = ?1 AND is_deleted = 0
            "#,
            params![
                customer.customer_id,
                customer.customer_name,
                customer.country_code,
                customer.phone,
                customer.pincode,
                customer.address_line1,
                customer.address_line2,
                customer.lat_long,
                customer.google_maps_code,
                customer.landmark,
                customer.city,
                customer.state,
                string_list_json(&customer.tags),
                customer.notes,
                fmt_ts(&customer.updated_at),
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::not_found("Customer", &customer.customer_id));
        }
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()?;
        Ok(PhoneGuard::Written)
    }

    /// 软删除
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在或已删除
    pub fn soft_delete(
        &self,
        customer_id: &str,
        updated_at: &chrono::NaiveDateTime,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let rows = tx.execute(
            "UPDATE customers SET is_deleted = 1, updated_at = ?2 WHERE customer_id = ?1 AND is_deleted = 0",
            params![customer_id, fmt_ts(updated_at)],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Customer", customer_id));
        }
        ActionLogRepository::insert_on(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询（不含已删除）
    pub fn find_by_id(&self, customer_id: &str) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE customer_id = ?1 AND is_deleted = 0", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![customer_id], map_customer)
            .optional()?)
    }

    /// 列表分页（未删除且启用，按名称排序）
    ///
    /// # 参数
    /// - search: 手机号或名称子串（大小写不敏感）
    /// - offset / limit: 分页窗口
    ///
    /// # 返回
    /// - (本页记录, 是否还有下一页)
    pub fn list_page(
        &self,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> RepositoryResult<(Vec<Customer>, bool)> {
        let conn = self.get_conn()?;
        let fetch = limit.saturating_add(1);

        let mut customers = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let sql = format!(
                    r#"{}
                    WHERE is_deleted = 0 AND is_active = 1
                      AND (phone LIKE ?1 ESCAPE '\' OR customer_name LIKE ?1 ESCAPE '\')
                    ORDER BY customer_name COLLATE NOCASE, customer_id
                    LIMIT ?2 OFFSET ?3"#,
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![like_contains(term), fetch, offset], map_customer)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    r#"{}
                    WHERE is_deleted = 0 AND is_active = 1
                    ORDER BY customer_name COLLATE NOCASE, customer_id
                    LIMIT ?1 OFFSET ?2"#,
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![fetch, offset], map_customer)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        let has_more = customers.len() as i64 > limit;
        customers.truncate(limit.max(0) as usize);
        Ok((customers, has_more))
    }

    fn find_live_by_phone(
        conn: &Connection,
        phone: &str,
        exclude_id: Option<&str>,
    ) -> RepositoryResult<Option<Customer>> {
        let sql = format!(
            r#"{}
            WHERE phone = ?1 AND is_deleted = 0
              AND (?2 IS NULL OR customer_id <> ?2)
            ORDER BY created_at
            LIMIT 1"#,
            SELECT_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![phone, exclude_id], map_customer)
            .optional()?)
    }
}

fn map_customer(row: &Row) -> rusqlite::Result<Customer> {
    let created_at: String = row.get(17)?;
    let updated_at: String = row.get(18)?;
    Ok(Customer {
        customer_id: row.get(0)?,
        customer_name: row.get(1)?,
        country_code: row.get(2)?,
        phone: row.get(3)?,
        pincode: row.get(4)?,
        address_line1: row.get(5)?,
        address_line2: row.get(6)?,
        lat_long: row.get(7)?,
        google_maps_code: row.get(8)?,
        landmark: row.get(9)?,
        city: row.get(10)?,
        state: row.get(11)?,
        tags: parse_string_list(row.get(12)?),
        notes: row.get(13)?,
        is_active: row.get(14)?,
        is_deleted: row.get(15)?,
        created_by: row.get(16)?,
        created_at: parse_ts(17, &created_at)?,
        updated_at: parse_ts(18, &updated_at)?,
    })
}
