// ==========================================
// Just Pressed 运营管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS），启动与测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 共享连接类型（所有仓储从 AppState 注入同一个连接）
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表，并包装为共享连接
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 创建全部业务表（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "数据库 schema_version={} 高于当前代码期望的 {}，请确认程序版本",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        _ => {}
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ===== 配置 =====
CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- ===== 用户与模块权限 =====
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    phone TEXT,
    email TEXT,
    employee_id TEXT,
    role TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS modules (
    module_id TEXT PRIMARY KEY,
    module_key TEXT NOT NULL UNIQUE,
    module_name TEXT NOT NULL,
    icon TEXT,
    display_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_permissions (
    user_id TEXT NOT NULL REFERENCES users(user_id),
    module_id TEXT NOT NULL REFERENCES modules(module_id),
    can_view INTEGER NOT NULL DEFAULT 0,
    can_write INTEGER NOT NULL DEFAULT 0,
    can_edit INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, module_id)
);

-- ===== 主数据 =====
CREATE TABLE IF NOT EXISTS locations (
    location_id TEXT PRIMARY KEY,
    location_name TEXT NOT NULL,
    location_code TEXT NOT NULL,
    location_type TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS machines (
    machine_id TEXT PRIMARY KEY,
    machine_code TEXT NOT NULL,
    machine_name TEXT NOT NULL,
    machine_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    location_id TEXT REFERENCES locations(location_id)
);

CREATE TABLE IF NOT EXISTS raw_materials (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    image_url TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS products (
    product_id TEXT PRIMARY KEY,
    product_name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS skus (
    sku_id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES products(product_id),
    sku_code TEXT NOT NULL,
    variant_name TEXT,
    size_value REAL NOT NULL,
    size_unit TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- ===== 客户 =====
CREATE TABLE IF NOT EXISTS customer_tags (
    tag_id TEXT PRIMARY KEY,
    tag_name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    tag_color TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT PRIMARY KEY,
    customer_name TEXT NOT NULL,
    country_code TEXT NOT NULL DEFAULT '+91',
    phone TEXT,
    pincode TEXT,
    address_line1 TEXT,
    address_line2 TEXT,
    lat_long TEXT,
    google_maps_code TEXT,
    landmark TEXT,
    city TEXT,
    state TEXT,
    tags_json TEXT NOT NULL DEFAULT '[]',
    notes TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    created_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_customers_phone ON customers(phone, is_deleted);
CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(customer_name);

-- ===== 生产 =====
CREATE TABLE IF NOT EXISTS production_batches (
    batch_id TEXT PRIMARY KEY,
    production_date TEXT NOT NULL,
    machine_id TEXT NOT NULL REFERENCES machines(machine_id),
    operator_id TEXT NOT NULL,
    raw_material_id TEXT NOT NULL REFERENCES raw_materials(id),
    seed_type TEXT NOT NULL,
    seed_input_qty REAL NOT NULL,
    unit TEXT NOT NULL DEFAULT 'kg',
    oil_output_qty REAL,
    cake_output_qty REAL,
    batch_status TEXT NOT NULL,
    start_time_ist TEXT NOT NULL,
    start_epoch INTEGER NOT NULL,
    end_time_ist TEXT,
    end_epoch INTEGER,
    location_id TEXT,
    created_by TEXT NOT NULL,
    updated_by TEXT,
    updated_at TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_batches_status ON production_batches(batch_status, is_deleted, start_epoch);

CREATE TABLE IF NOT EXISTS filtering_entries (
    id TEXT PRIMARY KEY,
    raw_material_id TEXT NOT NULL REFERENCES raw_materials(id),
    input_qty_kg REAL NOT NULL,
    filtered_oil_kg REAL,
    start_time_ist TEXT NOT NULL,
    start_epoch INTEGER NOT NULL,
    stop_time_ist TEXT,
    stop_epoch INTEGER,
    location_id TEXT,
    created_by TEXT NOT NULL,
    stopped_by TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_filtering_running ON filtering_entries(stop_epoch, is_deleted, start_epoch);

CREATE TABLE IF NOT EXISTS bottling_entries (
    id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES products(product_id),
    sku_id TEXT NOT NULL REFERENCES skus(sku_id),
    bottles_filled INTEGER NOT NULL,
    bottled_at_ist TEXT NOT NULL,
    bottled_at_epoch INTEGER NOT NULL,
    location_id TEXT,
    created_by TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

-- ===== 库间调拨 =====
CREATE TABLE IF NOT EXISTS stock_movements (
    movement_id TEXT PRIMARY KEY,
    from_location_id TEXT NOT NULL REFERENCES locations(location_id),
    to_location_id TEXT NOT NULL REFERENCES locations(location_id),
    status TEXT NOT NULL,
    sent_by TEXT NOT NULL,
    sent_at_ist TEXT NOT NULL,
    sent_at_epoch INTEGER NOT NULL,
    notes TEXT,
    verified_by TEXT,
    verified_at_ist TEXT,
    verified_at_epoch INTEGER,
    verify_remarks TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_movements_status ON stock_movements(status, is_deleted, sent_at_epoch);

CREATE TABLE IF NOT EXISTS stock_movement_items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movement_id TEXT NOT NULL REFERENCES stock_movements(movement_id),
    sku_id TEXT NOT NULL REFERENCES skus(sku_id),
    qty_sent INTEGER NOT NULL,
    reason TEXT NOT NULL,
    qty_received INTEGER,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

-- ===== 发货 =====
CREATE TABLE IF NOT EXISTS dispatches (
    dispatch_id TEXT PRIMARY KEY,
    from_location_id TEXT NOT NULL REFERENCES locations(location_id),
    shipped_to TEXT NOT NULL,
    dispatch_date TEXT NOT NULL,
    dispatched_at_ist TEXT NOT NULL,
    dispatched_at_epoch INTEGER NOT NULL,
    dispatched_by TEXT NOT NULL,
    remarks TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS dispatch_items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dispatch_id TEXT NOT NULL REFERENCES dispatches(dispatch_id),
    sku_id TEXT NOT NULL REFERENCES skus(sku_id),
    quantity_dispatched INTEGER NOT NULL
);

-- ===== 退货 =====
CREATE TABLE IF NOT EXISTS returns (
    return_id TEXT PRIMARY KEY,
    return_code TEXT NOT NULL UNIQUE,
    received_location_id TEXT NOT NULL REFERENCES locations(location_id),
    order_id TEXT,
    awb_number TEXT,
    received_date TEXT NOT NULL,
    received_at_ist TEXT NOT NULL,
    received_at_epoch INTEGER NOT NULL,
    received_by TEXT NOT NULL,
    remarks TEXT,
    photos_json TEXT NOT NULL DEFAULT '[]',
    videos_json TEXT NOT NULL DEFAULT '[]',
    is_deleted INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS return_items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    return_id TEXT NOT NULL REFERENCES returns(return_id),
    sku_id TEXT NOT NULL REFERENCES skus(sku_id),
    quantity_returned INTEGER NOT NULL,
    physical_condition TEXT NOT NULL,
    action_taken TEXT NOT NULL
);

-- ===== 操作日志 =====
CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);
CREATE INDEX IF NOT EXISTS idx_action_entity ON action_log(entity_type, entity_id, action_ts);
CREATE INDEX IF NOT EXISTS idx_action_actor_ts ON action_log(actor, action_ts);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_read_schema_version_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
