use super::AuditLogRepository;
use crate::domain::AuditEntry;
use crate::repository::stores::AuditSink;
use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::initialize_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_entry(id: &str, entity_id: &str, action: &str, minutes: i64) -> AuditEntry {
    AuditEntry {
        id: id.to_string(),
        entity_type: "COMPANY".to_string(),
        entity_id: entity_id.to_string(),
        action: action.to_string(),
        old_value: Some(json!({"referred_by": null})),
        new_value: Some(json!({"referred_by": "A1"})),
        performed_by: "admin".to_string(),
        performed_at: Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes),
    }
}

#[test]
fn test_append_and_list_for_entity() {
    let repo = AuditLogRepository::new(setup_test_db());

    repo.append(&make_entry("AU2", "C1", "LOCK_ATTRIBUTION", 5)).unwrap();
    repo.append(&make_entry("AU1", "C1", "ASSIGN_AGENT", 0)).unwrap();
    repo.append(&make_entry("AU3", "C2", "ASSIGN_AGENT", 1)).unwrap();

    let entries = repo.list_for_entity("COMPANY", "C1").unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["AU1", "AU2"]);
    assert_eq!(entries[0].new_value, Some(json!({"referred_by": "A1"})));
}

#[test]
fn test_duplicate_id_is_rejected() {
    let repo = AuditLogRepository::new(setup_test_db());
    repo.append(&make_entry("AU1", "C1", "ASSIGN_AGENT", 0)).unwrap();
    assert!(repo.append(&make_entry("AU1", "C1", "ASSIGN_AGENT", 0)).is_err());
}

#[test]
fn test_find_by_action_and_range() {
    let repo = AuditLogRepository::new(setup_test_db());
    repo.append(&make_entry("AU1", "C1", "ASSIGN_AGENT", 0)).unwrap();
    repo.append(&make_entry("AU2", "C2", "ASSIGN_AGENT", 10)).unwrap();
    repo.append(&make_entry("AU3", "C1", "LOCK_ATTRIBUTION", 20)).unwrap();

    let assigns = repo.find_by_action("ASSIGN_AGENT", 10).unwrap();
    assert_eq!(assigns.len(), 2);
    assert_eq!(assigns[0].id, "AU2");

    let start = Utc.with_ymd_and_hms(2026, 4, 1, 9, 5, 0).unwrap();
    let end = start + Duration::minutes(30);
    assert_eq!(repo.count_in_range(start, end).unwrap(), 2);
}
