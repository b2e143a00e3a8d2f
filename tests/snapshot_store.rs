// tests/snapshot_store.rs
use chrono::{TimeZone, Utc};
use egf_calendar::snapshot::{JsonFileStore, MemoryStore, Snapshot, SnapshotStore};
use egf_calendar::SnapshotError;
use std::fs;

#[test]
fn absent_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("missing.json"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn corrupt_file_is_reported_not_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("egf-calendar.json");
    fs::write(&path, "{\"2024::Paris, FR::Cup A\": ").unwrap();
    let store = JsonFileStore::new(&path);

    let err = store.load().unwrap_err();
    assert!(err.is_corrupt(), "unexpected error: {err}");
    assert!(matches!(err, SnapshotError::Corrupt { .. }));
    assert!(err.to_string().contains("egf-calendar.json"));
    // The broken document is left in place for inspection.
    assert!(fs::read_to_string(&path).unwrap().starts_with("{\"2024"));
}

#[test]
fn non_utf8_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("egf-calendar.json");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    assert!(JsonFileStore::new(&path).load().unwrap_err().is_corrupt());
}

#[test]
fn save_replaces_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("egf-calendar.json");
    let store = JsonFileStore::new(&path);
    let t = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

    let mut snap = Snapshot::new();
    snap.created_or_insert("2024::Paris, FR::Cup A", t);
    snap.modified_or_insert("ab12", t);
    store.save(&snap).unwrap();
    assert_eq!(store.load().unwrap(), snap);

    snap.modified_or_insert("cd34", t);
    store.save(&snap).unwrap();
    let back = store.load().unwrap();
    assert_eq!(back.len(), 3);
    assert!(!path.with_file_name("egf-calendar.json.tmp").exists());
}

#[test]
fn legacy_flat_file_is_imported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("egf-calendar.json");
    fs::write(
        &path,
        r#"{"2024::Paris, FR::Cup A": "2024-01-10T08:00:00", "9f86d081884c7d659a2feaa0c55ad015": "2024-02-01T08:00:00"}"#,
    )
    .unwrap();
    let snap = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(
        snap.created("2024::Paris, FR::Cup A"),
        Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
    );
    assert_eq!(
        snap.modified("9f86d081884c7d659a2feaa0c55ad015"),
        Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap())
    );
}

#[test]
fn memory_store_reports_corruption_too() {
    let store = MemoryStore::with_document("not json");
    assert!(store.load().unwrap_err().is_corrupt());
}
