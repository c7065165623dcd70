// ==========================================
// Just Pressed 运营管理系统 - 主数据仓储
// ==========================================
// 地点 / 机台 / 原料 / 产品 / SKU
// 业务界面只读，写入用于初始化与演示数据
// ==========================================

use crate::domain::master::{
    sku_display_label, Location, Machine, Product, RawMaterial, Sku, SkuView, FILTER_MACHINE_TYPE,
};
use crate::repository::db_utils::like_contains;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const LOCATION_COLUMNS: &str =
    "SELECT location_id, location_name, location_code, location_type, is_active FROM locations";
const MACHINE_COLUMNS: &str =
    "SELECT machine_id, machine_code, machine_name, machine_type, status, location_id FROM machines";
const RAW_MATERIAL_COLUMNS: &str = "SELECT id, name, image_url, active FROM raw_materials";
const PRODUCT_COLUMNS: &str = "SELECT product_id, product_name, is_active FROM products";
const SKU_VIEW_COLUMNS: &str = r#"
    SELECT s.sku_id, s.sku_code, s.product_id, p.product_name,
           s.variant_name, s.size_value, s.size_unit
    FROM skus s
    JOIN products p ON p.product_id = s.product_id
"#;

pub struct MasterDataRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MasterDataRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 地点
    // ==========================================

    /// 启用地点（按名称）
    pub fn list_active_locations(&self) -> RepositoryResult<Vec<Location>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE is_active = 1 ORDER BY location_name", LOCATION_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_location)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 第一个启用地点（按登记顺序）
    pub fn first_active_location(&self) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE is_active = 1 ORDER BY rowid LIMIT 1", LOCATION_COLUMNS);
        Ok(conn.query_row(&sql, [], map_location).optional()?)
    }

    pub fn find_location(&self, location_id: &str) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE location_id = ?1", LOCATION_COLUMNS);
        Ok(conn
            .query_row(&sql, params![location_id], map_location)
            .optional()?)
    }

    pub fn insert_location(&self, location: &Location) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO locations (location_id, location_name, location_code, location_type, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                location.location_id,
                location.location_name,
                location.location_code,
                location.location_type,
                location.is_active,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 机台
    // ==========================================

    /// 启用的榨油机（排除过滤机，按编码）
    pub fn list_active_press_machines(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE status = 'active' AND machine_type <> ?1 ORDER BY machine_code",
            MACHINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![FILTER_MACHINE_TYPE], map_machine)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_machine(&self, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE machine_id = ?1", MACHINE_COLUMNS);
        Ok(conn
            .query_row(&sql, params![machine_id], map_machine)
            .optional()?)
    }

    pub fn insert_machine(&self, machine: &Machine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO machines (machine_id, machine_code, machine_name, machine_type, status, location_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                machine.machine_id,
                machine.machine_code,
                machine.machine_name,
                machine.machine_type,
                machine.status,
                machine.location_id,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 原料（油籽）
    // ==========================================

    pub fn list_active_raw_materials(&self) -> RepositoryResult<Vec<RawMaterial>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE active = 1 ORDER BY name", RAW_MATERIAL_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_raw_material)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_raw_material(&self, id: &str) -> RepositoryResult<Option<RawMaterial>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", RAW_MATERIAL_COLUMNS);
        Ok(conn
            .query_row(&sql, params![id], map_raw_material)
            .optional()?)
    }

    pub fn insert_raw_material(&self, material: &RawMaterial) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO raw_materials (id, name, image_url, active) VALUES (?1, ?2, ?3, ?4)",
            params![material.id, material.name, material.image_url, material.active],
        )?;
        Ok(())
    }

    // ==========================================
    // 产品 / SKU
    // ==========================================

    pub fn list_active_products(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE is_active = 1 ORDER BY product_name", PRODUCT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_product)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn insert_product(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO products (product_id, product_name, is_active) VALUES (?1, ?2, ?3)",
            params![product.product_id, product.product_name, product.is_active],
        )?;
        Ok(())
    }

    /// 启用 SKU 视图（按产品名、容量）
    pub fn list_active_skus(&self) -> RepositoryResult<Vec<SkuView>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE s.is_active = 1 AND p.is_active = 1 ORDER BY p.product_name, s.size_value",
            SKU_VIEW_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_sku_view)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// SKU 子串搜索（产品名 / 规格 / SKU 编码）
    pub fn search_skus(&self, term: &str, limit: i64) -> RepositoryResult<Vec<SkuView>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE s.is_active = 1 AND p.is_active = 1
              AND (p.product_name LIKE ?1 ESCAPE '\'
                   OR COALESCE(s.variant_name, '') LIKE ?1 ESCAPE '\'
                   OR s.sku_code LIKE ?1 ESCAPE '\')
            ORDER BY p.product_name, s.size_value
            LIMIT ?2"#,
            SKU_VIEW_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![like_contains(term.trim()), limit], map_sku_view)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_sku(&self, sku_id: &str) -> RepositoryResult<Option<Sku>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT sku_id, product_id, sku_code, variant_name, size_value, size_unit, is_active
                 FROM skus WHERE sku_id = ?1",
                params![sku_id],
                |row| {
                    Ok(Sku {
                        sku_id: row.get(0)?,
                        product_id: row.get(1)?,
                        sku_code: row.get(2)?,
                        variant_name: row.get(3)?,
                        size_value: row.get(4)?,
                        size_unit: row.get(5)?,
                        is_active: row.get(6)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn insert_sku(&self, sku: &Sku) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO skus (sku_id, product_id, sku_code, variant_name, size_value, size_unit, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sku.sku_id,
                sku.product_id,
                sku.sku_code,
                sku.variant_name,
                sku.size_value,
                sku.size_unit,
                sku.is_active,
            ],
        )?;
        Ok(())
    }
}

fn map_location(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        location_id: row.get(0)?,
        location_name: row.get(1)?,
        location_code: row.get(2)?,
        location_type: row.get(3)?,
        is_active: row.get(4)?,
    })
}

fn map_machine(row: &Row) -> rusqlite::Result<Machine> {
    Ok(Machine {
        machine_id: row.get(0)?,
        machine_code: row.get(1)?,
        machine_name: row.get(2)?,
        machine_type: row.get(3)?,
        status: row.get(4)?,
        location_id: row.get(5)?,
    })
}

fn map_raw_material(row: &Row) -> rusqlite::Result<RawMaterial> {
    Ok(RawMaterial {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        active: row.get(3)?,
    })
}

fn map_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        product_id: row.get(0)?,
        product_name: row.get(1)?,
        is_active: row.get(2)?,
    })
}

fn map_sku_view(row: &Row) -> rusqlite::Result<SkuView> {
    let product_name: String = row.get(3)?;
    let variant_name: Option<String> = row.get(4)?;
    let size_value: f64 = row.get(5)?;
    let size_unit: String = row.get(6)?;
    let display_label =
        sku_display_label(&product_name, variant_name.as_deref(), size_value, &size_unit);
    Ok(SkuView {
        sku_id: row.get(0)?,
        sku_code: row.get(1)?,
        product_id: row.get(2)?,
        product_name,
        variant_name,
        size_value,
        size_unit,
        display_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> MasterDataRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        MasterDataRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn machine(id: &str, code: &str, kind: &str, status: &str) -> Machine {
        Machine {
            machine_id: id.into(),
            machine_code: code.into(),
            machine_name: code.into(),
            machine_type: kind.into(),
            status: status.into(),
            location_id: None,
        }
    }

    #[test]
    fn test_press_machines_exclude_filter_and_inactive() {
        let repo = setup();
        repo.insert_machine(&machine("m2", "P2", "Expeller", "active")).unwrap();
        repo.insert_machine(&machine("m1", "P1", "Expeller", "active")).unwrap();
        repo.insert_machine(&machine("f1", "F1", "Filter", "active")).unwrap();
        repo.insert_machine(&machine("m3", "P3", "Expeller", "maintenance")).unwrap();

        let codes: Vec<_> = repo
            .list_active_press_machines()
            .unwrap()
            .into_iter()
            .map(|m| m.machine_code)
            .collect();
        assert_eq!(codes, vec!["P1", "P2"]);
    }

    #[test]
    fn test_first_active_location_uses_registration_order() {
        let repo = setup();
        for (id, name, active) in [("l1", "Zeta", false), ("l2", "Mill", true), ("l3", "Alpha", true)] {
            repo.insert_location(&Location {
                location_id: id.into(),
                location_name: name.into(),
                location_code: id.to_uppercase(),
                location_type: None,
                is_active: active,
            })
            .unwrap();
        }
        assert_eq!(repo.first_active_location().unwrap().unwrap().location_id, "l2");
        assert_eq!(repo.list_active_locations().unwrap()[0].location_name, "Alpha");
    }

    #[test]
    fn test_sku_search_and_label() {
        let repo = setup();
        repo.insert_product(&Product {
            product_id: "p1".into(),
            product_name: "Groundnut Oil".into(),
            is_active: true,
        })
        .unwrap();
        for (id, size) in [("s1", 1.0), ("s2", 0.5)] {
            repo.insert_sku(&Sku {
                sku_id: id.into(),
                product_id: "p1".into(),
                sku_code: format!("GN-{}", id),
                variant_name: Some("Cold Pressed".into()),
                size_value: size,
                size_unit: "L".into(),
                is_active: true,
            })
            .unwrap();
        }

        let all = repo.list_active_skus().unwrap();
        assert_eq!(all[0].sku_id, "s2");
        assert_eq!(all[0].display_label, "Groundnut Oil Cold Pressed 0.5 L");

        assert_eq!(repo.search_skus("groundnut", 50).unwrap().len(), 2);
        assert_eq!(repo.search_skus("gn-s1", 50).unwrap().len(), 1);
        assert_eq!(repo.search_skus("ground", 1).unwrap().len(), 1);
    }
}
