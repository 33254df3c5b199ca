use super::*;
use time::macros::date;

#[test]
fn empty_detection_covers_blank_containers() {
    assert!(FieldValue::Empty.is_empty());
    assert!(FieldValue::Text(String::new()).is_empty());
    assert!(FieldValue::Ids(vec![]).is_empty());
    assert!(FieldValue::List(vec![]).is_empty());
    assert!(FieldValue::Record(ValueMap::new()).is_empty());
    assert!(!FieldValue::Number(0.0).is_empty());
    assert!(!FieldValue::Id(0).is_empty());
}

#[test]
fn record_with_only_blank_members_counts_as_empty() {
    let mut map = ValueMap::new();
    map.insert("name".into(), FieldValue::Text(String::new()));
    assert!(FieldValue::Record(map.clone()).is_empty());
    map.insert("name".into(), FieldValue::Text("Dairy".into()));
    assert!(!FieldValue::Record(map).is_empty());
}

#[test]
fn snapshot_get_missing_key_is_empty() {
    let snapshot = Snapshot::new();
    assert_eq!(snapshot.get("nope"), &FieldValue::Empty);
    assert!(!snapshot.contains("nope"));
}

#[test]
fn snapshot_clear_keeps_key_present() {
    let mut snapshot = Snapshot::new().with("categoryId", FieldValue::Id(4));
    snapshot.clear("categoryId");
    assert!(snapshot.contains("categoryId"));
    assert!(snapshot.get("categoryId").is_empty());
}

#[test]
fn snapshot_json_omits_empty_entries() {
    let snapshot = Snapshot::new()
        .with("name", FieldValue::Text("Milk".into()))
        .with("categoryId", FieldValue::Empty)
        .with("tags", FieldValue::Ids(vec![1, 2]));
    assert_eq!(snapshot.to_json(), serde_json::json!({ "name": "Milk", "tags": [1, 2] }));
}

#[test]
fn date_serializes_as_rfc3339_midnight() {
    let value = FieldValue::Date(date!(2024 - 03 - 05));
    assert_eq!(value.to_json(), serde_json::json!("2024-03-05T00:00:00Z"));
}

#[test]
fn list_rows_serialize_as_objects() {
    let row: ListItemRecord = [("quantity", FieldValue::Number(2.0)), ("itemId", FieldValue::Id(9))]
        .into_iter()
        .collect();
    let value = FieldValue::List(vec![row]);
    assert_eq!(value.to_json(), serde_json::json!([{ "itemId": 9, "quantity": 2.0 }]));
}

#[test]
fn list_mut_replaces_non_list_slot() {
    let mut snapshot = Snapshot::new().with("purchases", FieldValue::Empty);
    snapshot.list_mut("purchases").push(ListItemRecord::default());
    assert_eq!(snapshot.get("purchases").as_rows().len(), 1);
}

#[test]
fn accessors_return_none_for_other_variants() {
    let value = FieldValue::Text("x".into());
    assert_eq!(value.as_number(), None);
    assert_eq!(value.as_id(), None);
    assert!(value.as_ids().is_empty());
    assert_eq!(value.as_text(), Some("x"));
}

#[test]
fn date_text_round_trips_through_iso_form() {
    let parsed = parse_date(" 2023-12-31 ").unwrap();
    assert_eq!(parsed, date!(2023 - 12 - 31));
    assert_eq!(format_date(parsed), "2023-12-31");
    assert_eq!(parse_date("31/12/2023"), None);
}
