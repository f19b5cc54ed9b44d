use rowvault_core::db::open_db_in_memory;
use rowvault_core::{Dataset, DatasetKind, IndexPolicy};
use rusqlite::Connection;

const TABLE: &str = "events";

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    Dataset::bag(&conn, TABLE).unwrap().ensure_table().unwrap();
    conn
}

fn values(bag: &Dataset<'_>, key: &[u8]) -> Vec<i64> {
    bag.get_all::<i64>(key)
        .unwrap()
        .into_iter()
        .map(|record| record.value.unwrap())
        .collect()
}

#[test]
fn bag_accepts_duplicate_keys_in_insertion_order() {
    let conn = setup();
    let bag = Dataset::bag(&conn, TABLE).unwrap();
    assert_eq!(bag.kind(), DatasetKind::Bag);
    assert_eq!(bag.schema().index_policy, IndexPolicy::NonUnique);

    let first = bag.put(b"k", 1_i64).unwrap();
    let second = bag.put(b"k", 2_i64).unwrap();
    assert!(second.sequence_id > first.sequence_id);

    let records = bag.get_all::<i64>(b"k").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sequence_id, first.sequence_id);
    assert_eq!(records[1].sequence_id, second.sequence_id);
    assert_eq!(values(&bag, b"k"), vec![1, 2]);
    assert_eq!(bag.count(b"k").unwrap(), 2);
}

#[test]
fn get_returns_first_inserted_row() {
    let conn = setup();
    let bag = Dataset::bag(&conn, TABLE).unwrap();

    bag.put(b"k", 10_i64).unwrap();
    bag.put(b"k", 20_i64).unwrap();
    assert_eq!(bag.get::<i64>(b"k").unwrap().unwrap().value, Some(10));
}

#[test]
fn delete_removes_every_row_under_key() {
    let conn = setup();
    let bag = Dataset::bag(&conn, TABLE).unwrap();

    bag.put(b"k", 1_i64).unwrap();
    bag.put(b"k", 2_i64).unwrap();
    bag.put(b"other", 3_i64).unwrap();

    assert_eq!(bag.delete(b"k").unwrap(), 2);
    assert!(bag.get_all::<i64>(b"k").unwrap().is_empty());
    assert_eq!(values(&bag, b"other"), vec![3]);
    assert_eq!(bag.delete(b"k").unwrap(), 0);
}

#[test]
fn set_overwrites_every_row_under_key() {
    let conn = setup();
    let bag = Dataset::bag(&conn, TABLE).unwrap();

    bag.put(b"k", 1_i64).unwrap();
    bag.put(b"k", 2_i64).unwrap();
    bag.put(b"other", 9_i64).unwrap();

    assert_eq!(bag.set(b"k", &0_i64).unwrap(), 2);
    assert_eq!(values(&bag, b"k"), vec![0, 0]);
    assert_eq!(values(&bag, b"other"), vec![9]);
    assert!(bag
        .get_all::<i64>(b"k")
        .unwrap()
        .iter()
        .all(|record| record.updated_at.is_some()));
}

#[test]
fn set_with_transforms_each_row_independently() {
    let conn = setup();
    let bag = Dataset::bag(&conn, TABLE).unwrap();

    bag.put(b"k", 10_i64).unwrap();
    bag.put(b"k", 20_i64).unwrap();

    let mut seen = Vec::new();
    let changed = bag
        .set_with(b"k", |n: i64| {
            seen.push(n);
            n + 1
        })
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(seen, vec![10, 20]);
    assert_eq!(values(&bag, b"k"), vec![11, 21]);
}

#[test]
fn bag_table_uses_plain_key_index_and_map_uses_unique_one() {
    let conn = setup();
    Dataset::map(&conn, "singles").unwrap().ensure_table().unwrap();

    let bag_indexes = key_indexes(&conn, TABLE);
    assert_eq!(bag_indexes, vec![("events_key_idx".to_string(), false)]);

    let map_indexes = key_indexes(&conn, "singles");
    assert_eq!(map_indexes.len(), 1);
    assert!(map_indexes[0].1, "map key index must be unique");
}

#[test]
fn keyword_table_name_gets_table_and_index() {
    let conn = open_db_in_memory().unwrap();
    let bag = Dataset::bag(&conn, "order").unwrap();
    bag.ensure_table().unwrap();
    bag.ensure_table().unwrap();
    assert!(bag.table_exists().unwrap());

    bag.put(b"k", 1_i64).unwrap();
    bag.put(b"k", 2_i64).unwrap();
    assert_eq!(bag.set_with(b"k", |n: i64| n + 1).unwrap(), 2);
    assert_eq!(values(&bag, b"k"), vec![2, 3]);
    assert_eq!(bag.count(b"k").unwrap(), 2);

    assert_eq!(
        key_indexes(&conn, "order"),
        vec![("order_key_idx".to_string(), false)]
    );
}

fn key_indexes(conn: &Connection, table: &str) -> Vec<(String, bool)> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA index_list(\"{table}\");"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut indexes = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let name: String = row.get("name").unwrap();
        let unique: i64 = row.get("unique").unwrap();
        indexes.push((name, unique == 1));
    }
    indexes
}
