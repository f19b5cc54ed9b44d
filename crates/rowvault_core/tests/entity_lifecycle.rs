use rowvault_core::db::open_db_in_memory;
use rowvault_core::{
    Attributes, BasicStorage, Dataset, DatasetError, MissingPolicy, Model, Storage, Term,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn people(conn: &Connection) -> Model<BasicStorage<'_>> {
    let dataset = Dataset::map(conn, "people").unwrap();
    dataset.ensure_table().unwrap();
    Model::new(BasicStorage::new(dataset))
}

fn count_of(attributes: &Attributes) -> i64 {
    attributes
        .get("count")
        .and_then(Term::as_int)
        .unwrap_or_default()
}

#[test]
fn put_returns_reloaded_entity_with_timestamps() {
    let conn = setup();
    let model = people(&conn);

    let entity = model
        .put("ada", Attributes::new().with("a", 1).with("name", "Ada"))
        .unwrap();
    assert_eq!(entity.key(), b"ada");
    assert_eq!(entity.get("a"), Some(&Term::Int(1)));
    assert_eq!(entity.get("name").and_then(Term::as_str), Some("Ada"));
    assert!(entity.created_at().is_some());
    assert!(entity.updated_at().is_none());
    assert!(!entity.is_dirty());
}

#[test]
fn put_existing_key_fails_with_duplicate_key() {
    let conn = setup();
    let model = people(&conn);

    model.put("ada", Attributes::new()).unwrap();
    let err = model.put("ada", Attributes::new().with("x", 1)).unwrap_err();
    assert!(err.is_duplicate_key());
}

#[test]
fn get_missing_key_returns_none() {
    let conn = setup();
    let model = people(&conn);
    assert!(model.get("nobody").unwrap().is_none());
}

#[test]
fn edits_are_local_until_saved() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    entity.set("a", 2);
    assert!(entity.is_dirty());

    let stored = model.get("ada").unwrap().unwrap();
    assert_eq!(stored.get("a"), Some(&Term::Int(1)));
}

#[test]
fn save_replaces_stored_attributes_exactly() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    entity.set("b", 2);
    entity.remove("a");
    assert!(entity.save().unwrap());
    assert!(!entity.is_dirty());

    entity.reload().unwrap();
    assert_eq!(entity.attributes(), &Attributes::new().with("b", 2));
    assert!(entity.updated_at().is_some());
    assert!(entity.updated_at() >= entity.created_at());
}

#[test]
fn discard_restores_last_persisted_state() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    entity.set("a", 5);
    entity.attributes_mut().set("junk", true);
    entity.discard();
    assert_eq!(entity.attributes(), &Attributes::new().with("a", 1));

    entity.set("a", 7);
    entity.save().unwrap();
    entity.set("a", 8);
    entity.discard();
    assert_eq!(entity.get("a"), Some(&Term::Int(7)));
}

#[test]
fn reload_discards_unsaved_edits() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    entity.set("a", 99);
    entity.reload().unwrap();
    assert_eq!(entity.get("a"), Some(&Term::Int(1)));
}

#[test]
fn update_transforms_freshly_persisted_attributes() {
    let conn = setup();
    let model = people(&conn);

    let mut stale = model.put("ada", Attributes::new().with("count", 0)).unwrap();
    let mut other = model.get("ada").unwrap().unwrap();
    other.set("count", 5);
    other.save().unwrap();

    let changed = stale
        .update(|mut current| {
            let next = count_of(&current) + 1;
            current.set("count", next);
            current
        })
        .unwrap();
    assert!(changed);
    assert_eq!(count_of(stale.attributes()), 6);
    assert!(!stale.is_dirty());

    stale.reload().unwrap();
    assert_eq!(count_of(stale.attributes()), 6);
    assert!(stale.updated_at().is_some());
}

#[test]
fn update_refreshes_updated_at_visible_after_reload() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("count", 1)).unwrap();
    assert!(entity.updated_at().is_none());

    assert!(entity.update(|current| current.with("seen", true)).unwrap());
    entity.reload().unwrap();
    assert_eq!(entity.get("seen"), Some(&Term::Bool(true)));
    assert_eq!(count_of(entity.attributes()), 1);
    assert!(entity.updated_at().unwrap() >= entity.created_at().unwrap());
}

#[test]
fn writes_to_vanished_key_fail_by_default() {
    let conn = setup();
    let model = people(&conn);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    assert_eq!(model.delete("ada").unwrap(), 1);

    let err = entity.save().unwrap_err();
    assert!(matches!(err, DatasetError::NotFound(ref key) if key == b"ada"));
    assert!(entity.update(|current| current).unwrap_err().is_not_found());
    assert!(entity.reload().unwrap_err().is_not_found());
}

#[test]
fn writes_to_vanished_key_return_false_when_ignored() {
    let conn = setup();
    let dataset = Dataset::map(&conn, "people").unwrap();
    dataset.ensure_table().unwrap();
    let model = Model::new(BasicStorage::new(dataset)).with_missing_policy(MissingPolicy::Ignore);
    assert_eq!(model.missing_policy(), MissingPolicy::Ignore);

    let mut entity = model.put("ada", Attributes::new().with("a", 1)).unwrap();
    model.delete("ada").unwrap();

    assert!(!entity.save().unwrap());
    assert!(!entity.update(|current| current).unwrap());
    assert!(model.get("ada").unwrap().is_none());
}

#[test]
fn model_works_over_a_borrowed_storage() {
    let conn = setup();
    let dataset = Dataset::map(&conn, "people").unwrap();
    dataset.ensure_table().unwrap();
    let storage = BasicStorage::new(dataset);
    let model = Model::new(&storage);

    model.put("ada", Attributes::new().with("a", 1)).unwrap();
    let raw = storage.get::<Attributes>(b"ada").unwrap().unwrap();
    assert_eq!(raw.value, Some(Attributes::new().with("a", 1)));
    assert_eq!(storage.dataset().name(), "people");
}

#[test]
fn bag_backed_update_touches_every_row_under_key() {
    let conn = setup();
    let dataset = Dataset::bag(&conn, "visits").unwrap();
    dataset.ensure_table().unwrap();
    let model = Model::new(BasicStorage::new(dataset));

    let mut entity = model.put("ada", Attributes::new().with("count", 1)).unwrap();
    model
        .storage()
        .put(b"ada", Attributes::new().with("count", 10))
        .unwrap();

    assert!(entity
        .update(|mut current| {
            let next = count_of(&current) * 2;
            current.set("count", next);
            current
        })
        .unwrap());

    let counts = model
        .storage()
        .dataset()
        .get_all::<Attributes>(b"ada")
        .unwrap()
        .into_iter()
        .map(|record| count_of(&record.value.unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![2, 20]);

    // The entity tracks the row `get` returns, not the last row rewritten.
    assert_eq!(count_of(entity.attributes()), 2);
    assert!(!entity.is_dirty());
    entity.reload().unwrap();
    assert_eq!(count_of(entity.attributes()), 2);

    assert_eq!(model.delete("ada").unwrap(), 2);
}
