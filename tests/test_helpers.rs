// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、参考数据写入
// ==========================================
#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use just_pressed_ops::db::{ensure_schema, open_sqlite_connection, SharedConnection};
use just_pressed_ops::domain::master::{Location, Machine, Product, RawMaterial, Sku};
use just_pressed_ops::domain::user::User;
use just_pressed_ops::repository::master_data_repo::MasterDataRepository;
use just_pressed_ops::repository::user_repo::UserRepository;
use tempfile::NamedTempFile;

// ==========================================
// 参考数据 ID
// ==========================================

pub const LOC_MILL: &str = "loc-mill";
pub const LOC_STORE: &str = "loc-store";
pub const MACHINE_P1: &str = "m-p1";
pub const MACHINE_P2: &str = "m-p2";
pub const MACHINE_FILTER: &str = "m-f1";
pub const SEED_GROUNDNUT: &str = "rm-ground";
pub const SEED_SESAME: &str = "rm-sesame";
pub const PRODUCT_GROUNDNUT: &str = "p-ground";
pub const PRODUCT_SESAME: &str = "p-sesame";
pub const SKU_GROUNDNUT_500: &str = "sku-g-500";
pub const SKU_GROUNDNUT_1L: &str = "sku-g-1l";
pub const SKU_SESAME_500: &str = "sku-s-500";

pub const OPERATOR: &str = "u-ravi";
pub const VIEWER: &str = "u-meera";
pub const INACTIVE_USER: &str = "u-left";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是有效 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（schema 已存在）
pub fn open_shared(db_path: &str) -> Result<SharedConnection, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 写入地点 / 机台 / 油籽 / 产品 / SKU / 用户 / 模块权限
pub fn seed_reference_data(conn: &SharedConnection) -> Result<(), Box<dyn Error>> {
    let master = MasterDataRepository::new(conn.clone());

    for (id, name, code) in [(LOC_MILL, "Mill", "MIL"), (LOC_STORE, "City Store", "STR")] {
        master.insert_location(&Location {
            location_id: id.to_string(),
            location_name: name.to_string(),
            location_code: code.to_string(),
            location_type: None,
            is_active: true,
        })?;
    }

    for (id, code, kind) in [
        (MACHINE_P1, "P1", "Press"),
        (MACHINE_P2, "P2", "Press"),
        (MACHINE_FILTER, "F1", "Filter"),
    ] {
        master.insert_machine(&Machine {
            machine_id: id.to_string(),
            machine_code: code.to_string(),
            machine_name: format!("{} {}", kind, code),
            machine_type: kind.to_string(),
            status: "active".to_string(),
            location_id: Some(LOC_MILL.to_string()),
        })?;
    }

    for (id, name) in [(SEED_GROUNDNUT, "Groundnut"), (SEED_SESAME, "Sesame")] {
        master.insert_raw_material(&RawMaterial {
            id: id.to_string(),
            name: name.to_string(),
            image_url: None,
            active: true,
        })?;
    }

    for (id, name) in [
        (PRODUCT_GROUNDNUT, "Groundnut Oil"),
        (PRODUCT_SESAME, "Sesame Oil"),
    ] {
        master.insert_product(&Product {
            product_id: id.to_string(),
            product_name: name.to_string(),
            is_active: true,
        })?;
    }

    for (id, product, code, size, unit) in [
        (SKU_GROUNDNUT_500, PRODUCT_GROUNDNUT, "GO-500", 500.0, "ml"),
        (SKU_GROUNDNUT_1L, PRODUCT_GROUNDNUT, "GO-1L", 1.0, "L"),
        (SKU_SESAME_500, PRODUCT_SESAME, "SO-500", 500.0, "ml"),
    ] {
        master.insert_sku(&Sku {
            sku_id: id.to_string(),
            product_id: product.to_string(),
            sku_code: code.to_string(),
            variant_name: None,
            size_value: size,
            size_unit: unit.to_string(),
            is_active: true,
        })?;
    }

    let users = UserRepository::new(conn.clone());
    for (id, name, active) in [
        (OPERATOR, "Ravi K", true),
        (VIEWER, "Meera S", true),
        (INACTIVE_USER, "Former Staff", false),
    ] {
        users.insert_user(&User {
            user_id: id.to_string(),
            username: id.trim_start_matches("u-").to_string(),
            full_name: name.to_string(),
            phone: None,
            email: None,
            employee_id: None,
            role: None,
            is_active: active,
        })?;
    }

    // display_order 与插入顺序故意不同
    for (key, name, order) in [
        ("customers", "Customers", 5),
        ("production_tracking", "Production Tracking", 1),
        ("dispatch", "Dispatch", 4),
        ("stock_movement", "Stock Movement", 2),
        ("returns", "Returns", 6),
    ] {
        users.insert_module(&format!("mod-{}", key), key, name, None, order)?;
    }

    for key in ["production_tracking", "stock_movement", "dispatch", "customers", "returns"] {
        users.grant(OPERATOR, &format!("mod-{}", key), true, true, false)?;
    }
    users.grant(VIEWER, "mod-customers", true, false, false)?;
    users.grant(VIEWER, "mod-dispatch", false, false, false)?;

    Ok(())
}
