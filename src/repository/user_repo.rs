// ==========================================
// Just Pressed 运营管理系统 - 用户与模块权限数据仓储
// ==========================================

use crate::domain::user::{User, UserModule};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_user(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                r#"
                SELECT user_id, username, full_name, phone, email, employee_id, role, is_active
                FROM users WHERE user_id = ?1
                "#,
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        phone: row.get(3)?,
                        email: row.get(4)?,
                        employee_id: row.get(5)?,
                        role: row.get(6)?,
                        is_active: row.get(7)?,
                    })
                },
            )
            .optional()?)
    }

    /// 用户可查看的模块（display_order 升序）
    pub fn list_viewable_modules(&self, user_id: &str) -> RepositoryResult<Vec<UserModule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.module_id, m.module_key, m.module_name, m.icon, m.display_order,
                   p.can_view, p.can_write, p.can_edit
            FROM user_permissions p
            JOIN modules m ON m.module_id = p.module_id
            WHERE p.user_id = ?1 AND p.can_view = 1
            ORDER BY m.display_order, m.module_key
            "#,
        )?;
        let modules = stmt
            .query_map(params![user_id], |row| {
                Ok(UserModule {
                    module_id: row.get(0)?,
                    module_key: row.get(1)?,
                    module_name: row.get(2)?,
                    icon: row.get(3)?,
                    display_order: row.get(4)?,
                    can_view: row.get(5)?,
                    can_write: row.get(6)?,
                    can_edit: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(modules)
    }

    // ==========================================
    // 初始化写入（演示库/测试）
    // ==========================================

    pub fn insert_user(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO users (user_id, username, full_name, phone, email, employee_id, role, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                user.user_id,
                user.username,
                user.full_name,
                user.phone,
                user.email,
                user.employee_id,
                user.role,
                user.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn insert_module(
        &self,
        module_id: &str,
        module_key: &str,
        module_name: &str,
        icon: Option<&str>,
        display_order: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO modules (module_id, module_key, module_name, icon, display_order)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![module_id, module_key, module_name, icon, display_order],
        )?;
        Ok(())
    }

    /// 授权（已存在则覆盖）
    pub fn grant(
        &self,
        user_id: &str,
        module_id: &str,
        can_view: bool,
        can_write: bool,
        can_edit: bool,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO user_permissions (user_id, module_id, can_view, can_write, can_edit)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, module_id) DO UPDATE SET
                can_view = excluded.can_view,
                can_write = excluded.can_write,
                can_edit = excluded.can_edit
            "#,
            params![user_id, module_id, can_view, can_write, can_edit],
        )?;
        Ok(())
    }
}
