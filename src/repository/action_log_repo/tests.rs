use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_test_log(action_type: ActionType, actor: &str, entity_id: &str) -> ActionLog {
    ActionLog::new(action_type, actor, "customer", entity_id).with_detail("Test log")
}

fn write(conn: &Arc<Mutex<Connection>>, log: &ActionLog) {
    ActionLogRepository::insert_on(&conn.lock().unwrap(), log).unwrap();
}

#[test]
fn test_insert_and_find_by_id() {
    let conn = setup_test_db();
    let repo = ActionLogRepository::new(conn.clone());

    let log = make_test_log(ActionType::CreateCustomer, "user1", "c1")
        .with_payload(&serde_json::json!({"phone": "9876543210"}));
    write(&conn, &log);

    let found = repo.find_by_id(&log.action_id).unwrap().unwrap();
    assert_eq!(found.actor, "user1");
    assert_eq!(found.entity_id, "c1");
    assert_eq!(found.payload_json.unwrap()["phone"], "9876543210");
}

#[test]
fn test_insert_inside_rolled_back_transaction_leaves_nothing() {
    let conn = setup_test_db();
    let repo = ActionLogRepository::new(conn.clone());
    let log = make_test_log(ActionType::DeleteCustomer, "user1", "c1");
    {
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        ActionLogRepository::insert_on(&tx, &log).unwrap();
        // 未提交即丢弃
    }
    assert!(repo.find_by_id(&log.action_id).unwrap().is_none());
}

#[test]
fn test_find_by_entity_and_actor() {
    let conn = setup_test_db();
    let repo = ActionLogRepository::new(conn.clone());

    for log in [
        make_test_log(ActionType::CreateCustomer, "user1", "c1"),
        make_test_log(ActionType::UpdateCustomer, "user2", "c1"),
        make_test_log(ActionType::CreateCustomer, "user1", "c2"),
    ] {
        write(&conn, &log);
    }

    assert_eq!(repo.find_by_entity("customer", "c1").unwrap().len(), 2);
    assert!(repo.find_by_entity("dispatch", "c1").unwrap().is_empty());
    assert_eq!(repo.find_by_actor("user1", 10).unwrap().len(), 2);
    assert_eq!(repo.find_by_actor("user1", 1).unwrap().len(), 1);
    assert_eq!(repo.find_recent(2).unwrap().len(), 2);
}

#[test]
fn test_find_by_time_range() {
    let conn = setup_test_db();
    let repo = ActionLogRepository::new(conn.clone());
    write(&conn, &make_test_log(ActionType::DeleteCustomer, "user1", "c9"));

    let now = Utc::now().naive_utc();
    let hits = repo
        .find_by_time_range(now - Duration::minutes(5), now + Duration::minutes(5))
        .unwrap();
    assert_eq!(hits.len(), 1);

    let none = repo
        .find_by_time_range(now - Duration::days(3), now - Duration::days(2))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_find_missing_returns_none() {
    let repo = ActionLogRepository::new(setup_test_db());
    assert!(repo.find_by_id("nope").unwrap().is_none());
}
