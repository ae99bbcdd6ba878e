use portal_api::storage::{BlogRecord, Collection, Database, DatabaseError, Record, RecordStore};
use serde_json::json;

const OFFICERS: &str = "Officers";
const BLOGS: &str = "Blogs";

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data"), &[OFFICERS, BLOGS]).unwrap();
    (dir, db)
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn test_put_and_get_officer() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);
    let officer = record(json!({"OfficerID": "O1", "Name": "Alice", "Rank": 3}));

    db.put_item(&officers, &officer).unwrap();

    let retrieved = db
        .get_item(&officers, "O1")
        .unwrap()
        .expect("officer should exist");
    assert_eq!(retrieved, officer);
}

#[test]
fn test_get_item_not_found() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);
    assert!(db.get_item(&officers, "nonexistent").unwrap().is_none());
    assert!(db.get_item(&officers, "").unwrap().is_none());
}

#[test]
fn test_put_item_requires_key_attribute() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);

    let result = db.put_item(&officers, &record(json!({"Name": "No Key"})));
    assert!(matches!(result, Err(DatabaseError::MissingKey("OfficerID"))));

    let result = db.put_item(&officers, &record(json!({"OfficerID": 42})));
    assert!(matches!(result, Err(DatabaseError::MissingKey("OfficerID"))));

    assert!(db.scan(&officers).unwrap().is_empty());
}

#[test]
fn test_put_item_replaces_existing() {
    let (_dir, db) = test_db();
    let blogs = Collection::blogs(BLOGS);

    db.put_item(&blogs, &BlogRecord::new("B1", "Ann", "First").to_record())
        .unwrap();
    db.put_item(&blogs, &BlogRecord::new("B1", "Bob", "Second").to_record())
        .unwrap();

    let all = db.scan(&blogs).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["Author"], "Bob");
    assert_eq!(all[0]["Title"], "Second");
}

#[test]
fn test_scan_returns_every_record() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);
    for id in ["O3", "O1", "O2"] {
        db.put_item(&officers, &record(json!({"OfficerID": id})))
            .unwrap();
    }

    let ids: Vec<String> = db
        .scan(&officers)
        .unwrap()
        .iter()
        .map(|r| r["OfficerID"].as_str().unwrap().to_string())
        .collect();
    // redb iterates in key order
    assert_eq!(ids, vec!["O1", "O2", "O3"]);
}

#[test]
fn test_scan_empty_collection() {
    let (_dir, db) = test_db();
    assert!(db.scan(&Collection::blogs(BLOGS)).unwrap().is_empty());
}

#[test]
fn test_collections_are_independent() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);
    let blogs = Collection::blogs(BLOGS);

    db.put_item(&officers, &record(json!({"OfficerID": "X"})))
        .unwrap();
    db.put_item(&blogs, &BlogRecord::new("X", "Ann", "T").to_record())
        .unwrap();

    assert_eq!(db.scan(&officers).unwrap().len(), 1);
    assert_eq!(db.scan(&blogs).unwrap().len(), 1);
    assert!(db.get_item(&officers, "X").unwrap().unwrap().get("Author").is_none());
    assert_eq!(db.get_item(&blogs, "X").unwrap().unwrap()["Author"], "Ann");
}

#[test]
fn test_unknown_collection_is_an_error() {
    let (_dir, db) = test_db();
    assert!(db.scan(&Collection::officers("NotOpened")).is_err());
}

#[test]
fn test_nested_values_round_trip() {
    let (_dir, db) = test_db();
    let officers = Collection::officers(OFFICERS);
    let officer = record(json!({
        "OfficerID": "O9",
        "Name": "Complex",
        "Active": true,
        "Score": 4.5,
        "Terms": [2021, 2022],
        "Contact": {"Email": "o9@example.com", "Phone": null},
        "Offset": -3
    }));

    db.put_item(&officers, &officer).unwrap();
    assert_eq!(db.get_item(&officers, "O9").unwrap().unwrap(), officer);
}

#[test]
fn test_records_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let officers = Collection::officers(OFFICERS);
    {
        let db = Database::open(dir.path().join("data"), &[OFFICERS, BLOGS]).unwrap();
        db.put_item(&officers, &record(json!({"OfficerID": "O1", "Name": "Alice"})))
            .unwrap();
    }

    let db = Database::open(dir.path().join("data"), &[OFFICERS, BLOGS]).unwrap();
    let officer = db.get_item(&officers, "O1").unwrap().unwrap();
    assert_eq!(officer["Name"], "Alice");
}
