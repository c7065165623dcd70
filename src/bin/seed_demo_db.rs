// ==========================================
// 演示数据库：备份旧库 → 建表 → 写入主数据/用户/权限 → 走一遍生产流程
// ==========================================
// 用法: seed_demo_db [db_path]
// ==========================================

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;

use just_pressed_ops::api::{
    RecordBottlingRequest, SendTransferRequest, StartExtractionRequest, StartFilteringRequest,
    TransferLineInput,
};
use just_pressed_ops::app::{default_db_path, AppState};
use just_pressed_ops::db::open_shared_connection;
use just_pressed_ops::domain::master::{Location, Machine, Product, RawMaterial, Sku};
use just_pressed_ops::domain::types::{QtyUnit, TransferReason};
use just_pressed_ops::domain::user::User;
use just_pressed_ops::repository::master_data_repo::MasterDataRepository;
use just_pressed_ops::repository::user_repo::UserRepository;

const DEMO_USER_ID: &str = "u-demo-admin";

/// (module_key, module_name, icon)
const MODULES: [(&str, &str, &str); 7] = [
    ("production_tracking", "Production Tracking", "factory"),
    ("stock_movement", "Stock Movement", "truck"),
    ("dashboard_production", "Production Dashboard", "chart"),
    ("dispatch", "Dispatch", "package"),
    ("customers", "Customers", "users"),
    ("returns", "Returns", "undo"),
    ("inventory", "Inventory", "boxes"),
];

fn main() -> Result<(), Box<dyn Error>> {
    just_pressed_ops::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    backup_and_reset_db(&db_path)?;

    let conn = open_shared_connection(&db_path)?;
    let master = MasterDataRepository::new(conn.clone());
    let users = UserRepository::new(conn.clone());

    seed_master_data(&master)?;
    seed_users(&users)?;

    let state = AppState::from_connection(conn)?;
    run_demo_flow(&state)?;

    eprintln!("Seeded demo database at {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_master_data(master: &MasterDataRepository) -> Result<(), Box<dyn Error>> {
    for (id, name, code) in [
        ("loc-mill", "Mill", "MIL"),
        ("loc-store", "City Store", "STR"),
        ("loc-wh", "Warehouse", "WH"),
    ] {
        master.insert_location(&Location {
            location_id: id.to_string(),
            location_name: name.to_string(),
            location_code: code.to_string(),
            location_type: None,
            is_active: true,
        })?;
    }

    for (id, code, kind) in [
        ("m-p1", "P1", "Press"),
        ("m-p2", "P2", "Press"),
        ("m-f1", "F1", "Filter"),
    ] {
        master.insert_machine(&Machine {
            machine_id: id.to_string(),
            machine_code: code.to_string(),
            machine_name: format!("{} {}", kind, code),
            machine_type: kind.to_string(),
            status: "active".to_string(),
            location_id: Some("loc-mill".to_string()),
        })?;
    }

    for (id, name) in [
        ("rm-ground", "Groundnut"),
        ("rm-sesame", "Sesame"),
        ("rm-coconut", "Coconut"),
    ] {
        master.insert_raw_material(&RawMaterial {
            id: id.to_string(),
            name: name.to_string(),
            image_url: None,
            active: true,
        })?;
    }

    for (id, name) in [("p-ground", "Groundnut Oil"), ("p-sesame", "Sesame Oil")] {
        master.insert_product(&Product {
            product_id: id.to_string(),
            product_name: name.to_string(),
            is_active: true,
        })?;
    }

    for (id, product, code, size, unit) in [
        ("sku-g-500", "p-ground", "GO-500", 500.0, "ml"),
        ("sku-g-1l", "p-ground", "GO-1L", 1.0, "L"),
        ("sku-s-500", "p-sesame", "SO-500", 500.0, "ml"),
    ] {
        master.insert_sku(&Sku {
            sku_id: id.to_string(),
            product_id: product.to_string(),
            sku_code: code.to_string(),
            variant_name: Some("Cold Pressed".to_string()),
            size_value: size,
            size_unit: unit.to_string(),
            is_active: true,
        })?;
    }
    Ok(())
}

fn seed_users(users: &UserRepository) -> Result<(), Box<dyn Error>> {
    users.insert_user(&User {
        user_id: DEMO_USER_ID.to_string(),
        username: "admin".to_string(),
        full_name: "Demo Admin".to_string(),
        phone: None,
        email: None,
        employee_id: Some("E001".to_string()),
        role: Some("admin".to_string()),
        is_active: true,
    })?;

    for (order, (key, name, icon)) in MODULES.iter().enumerate() {
        let module_id = format!("mod-{}", key);
        users.insert_module(&module_id, key, name, Some(*icon), order as i64 + 1)?;
        users.grant(DEMO_USER_ID, &module_id, true, true, true)?;
    }
    Ok(())
}

/// 通过 API 写入一条完整的生产/调拨链路，保证看板有数据
fn run_demo_flow(state: &AppState) -> Result<(), Box<dyn Error>> {
    let batch = state.production_api.start_extraction(
        &StartExtractionRequest {
            machine_id: "m-p1".to_string(),
            raw_material_id: "rm-ground".to_string(),
            seed_input_qty: 100.0,
            unit: QtyUnit::Kg,
        },
        DEMO_USER_ID,
    )?;
    state
        .production_api
        .stop_extraction(&batch.batch_id, 38.5, 58.0, DEMO_USER_ID)?;

    let filter = state.production_api.start_filtering(
        &StartFilteringRequest {
            raw_material_id: "rm-ground".to_string(),
            input_qty_kg: 38.5,
            location_id: None,
        },
        DEMO_USER_ID,
    )?;
    state
        .production_api
        .stop_filtering(&filter.id, 36.0, DEMO_USER_ID)?;

    state.production_api.record_bottling(
        &RecordBottlingRequest {
            product_id: "p-ground".to_string(),
            sku_id: "sku-g-500".to_string(),
            bottles_filled: 60,
            location_id: None,
        },
        DEMO_USER_ID,
    )?;

    let sent = state.stock_movement_api.send_transfer(
        &SendTransferRequest {
            from_location_id: "loc-mill".to_string(),
            to_location_id: "loc-store".to_string(),
            notes: Some("demo".to_string()),
            lines: vec![TransferLineInput {
                sku_id: "sku-g-500".to_string(),
                qty_sent: 24,
                reason: TransferReason::FreshStock,
            }],
        },
        DEMO_USER_ID,
    )?;
    eprintln!("Pending transfer {}", sent.friendly_code);
    Ok(())
}
