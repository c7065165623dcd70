// ==========================================
// Just Pressed 运营管理系统 - 生产看板数据仓储
// ==========================================
// 职责: 按 epoch 区间读取事实行，连表补齐分组名
// 单位换算在此完成，聚合在领域层
// ==========================================

use crate::domain::dashboard::{BottlingFact, ExtractionFact, FiltrationFact, UNKNOWN_LABEL};
use crate::domain::types::QtyUnit;
use crate::repository::db_utils::invalid_enum;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct DashboardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DashboardRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 已完成批次（数量换算为 kg）
    pub fn extraction_facts(&self, from_epoch: i64, to_epoch: i64) -> RepositoryResult<Vec<ExtractionFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT NULLIF(TRIM(b.seed_type), ''),
                   CASE WHEN m.machine_id IS NULL THEN NULL
                        ELSE m.machine_code || ' - ' || m.machine_name END,
                   u.full_name,
                   b.seed_input_qty, COALESCE(b.oil_output_qty, 0), b.unit
            FROM production_batches b
            LEFT JOIN machines m ON m.machine_id = b.machine_id
            LEFT JOIN users u ON u.user_id = b.created_by
            WHERE b.batch_status = 'completed' AND b.is_deleted = 0
              AND b.start_epoch BETWEEN ?1 AND ?2
            ORDER BY b.start_epoch
            "#,
        )?;
        let facts = stmt
            .query_map(params![from_epoch, to_epoch], |row| {
                let unit_raw: String = row.get(5)?;
                let unit = QtyUnit::from_str(&unit_raw).ok_or_else(|| invalid_enum(5, &unit_raw))?;
                let input: f64 = row.get(3)?;
                let oil: f64 = row.get(4)?;
                Ok(ExtractionFact {
                    seed_label: label_or_unknown(row.get(0)?),
                    machine_label: label_or_unknown(row.get(1)?),
                    operator_label: label_or_unknown(row.get(2)?),
                    input_kg: unit.to_kg(input),
                    oil_kg: unit.to_kg(oil),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }

    /// 已停止过滤
    pub fn filtration_facts(&self, from_epoch: i64, to_epoch: i64) -> RepositoryResult<Vec<FiltrationFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.name, f.input_qty_kg, COALESCE(f.filtered_oil_kg, 0)
            FROM filtering_entries f
            LEFT JOIN raw_materials r ON r.id = f.raw_material_id
            WHERE f.stop_epoch IS NOT NULL AND f.is_deleted = 0
              AND f.start_epoch BETWEEN ?1 AND ?2
            ORDER BY f.start_epoch
            "#,
        )?;
        let facts = stmt
            .query_map(params![from_epoch, to_epoch], |row| {
                Ok(FiltrationFact {
                    seed_label: label_or_unknown(row.get(0)?),
                    input_kg: row.get(1)?,
                    filtered_kg: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }

    pub fn bottling_facts(&self, from_epoch: i64, to_epoch: i64) -> RepositoryResult<Vec<BottlingFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.sku_id, p.product_name, s.size_value, s.size_unit,
                   COALESCE(NULLIF(TRIM(s.variant_name), ''), s.sku_code),
                   e.bottles_filled
            FROM bottling_entries e
            LEFT JOIN skus s ON s.sku_id = e.sku_id
            LEFT JOIN products p ON p.product_id = s.product_id
            WHERE e.is_deleted = 0
              AND e.bottled_at_epoch BETWEEN ?1 AND ?2
            ORDER BY e.bottled_at_epoch
            "#,
        )?;
        let facts = stmt
            .query_map(params![from_epoch, to_epoch], |row| {
                let size_value: Option<f64> = row.get(2)?;
                let size_unit: Option<String> = row.get(3)?;
                let size_label = match (size_value, size_unit) {
                    (Some(v), Some(u)) => format!("{} {}", v, u),
                    _ => "—".to_string(),
                };
                Ok(BottlingFact {
                    sku_id: row.get(0)?,
                    product_name: row
                        .get::<_, Option<String>>(1)?
                        .unwrap_or_else(|| "—".to_string()),
                    size_label,
                    sku_label: label_or_unknown(row.get(4)?),
                    bottles: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }
}

fn label_or_unknown(raw: Option<String>) -> String {
    raw.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> DashboardRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO users (user_id, username, full_name) VALUES ('u1', 'ravi', 'Ravi K');
            INSERT INTO machines (machine_id, machine_code, machine_name, machine_type)
              VALUES ('m1', 'P1', 'Press 1', 'Press');
            INSERT INTO raw_materials (id, name) VALUES ('r1', 'Sesame');
            INSERT INTO production_batches (batch_id, production_date, machine_id, operator_id,
                raw_material_id, seed_type, seed_input_qty, unit, oil_output_qty, cake_output_qty,
                batch_status, start_time_ist, start_epoch, created_by)
            VALUES
              ('BP-1', '2026-02-03', 'm1', 'u1', 'r1', 'Sesame', 2000, 'g', 800, 1000, 'completed', 'x', 100, 'u1'),
              ('BP-2', '2026-02-03', 'm1', 'u1', 'r1', '', 10, 'kg', NULL, NULL, 'completed', 'x', 200, 'ghost'),
              ('BP-3', '2026-02-03', 'm1', 'u1', 'r1', 'Sesame', 10, 'kg', NULL, NULL, 'in_progress', 'x', 150, 'u1'),
              ('BP-4', '2026-02-03', 'm1', 'u1', 'r1', 'Sesame', 10, 'kg', 4, 5, 'completed', 'x', 999, 'u1');
            "#,
        )
        .unwrap();
        DashboardRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_extraction_facts_normalise_and_label() {
        let repo = setup();
        let facts = repo.extraction_facts(0, 500).unwrap();
        assert_eq!(facts.len(), 2);

        assert!((facts[0].input_kg - 2.0).abs() < 1e-9);
        assert!((facts[0].oil_kg - 0.8).abs() < 1e-9);
        assert_eq!(facts[0].machine_label, "P1 - Press 1");
        assert_eq!(facts[0].operator_label, "Ravi K");

        assert_eq!(facts[1].seed_label, UNKNOWN_LABEL);
        assert_eq!(facts[1].operator_label, UNKNOWN_LABEL);
        assert_eq!(facts[1].oil_kg, 0.0);
    }

    #[test]
    fn test_empty_range() {
        let repo = setup();
        assert!(repo.filtration_facts(0, 500).unwrap().is_empty());
        assert!(repo.bottling_facts(0, 500).unwrap().is_empty());
    }
}
