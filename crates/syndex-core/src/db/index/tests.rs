use crate::{
    db::{
        index::{DeclareOutcome, Index, IndexRegistry},
        store::{Record, RecordId},
    },
    model::IndexModel,
    value::Value,
};

fn tokenized_index() -> Index {
    Index::new(IndexModel::new("Person", "name", true).expect("valid index model"))
}

fn exact_index() -> Index {
    Index::new(IndexModel::new("Person", "name", false).expect("valid index model"))
}

#[test]
fn tokenized_find_matches_whole_tokens_case_insensitively() {
    let index = tokenized_index();
    let id = RecordId::from_u128(1);
    index.put(&Value::from("Andreas Ronge"), id);

    assert!(index.find(&Value::from("ronge")).contains(&id));
    assert!(index.find(&Value::from("RONGE")).contains(&id));
    assert!(index.find(&Value::from("andreas")).contains(&id));
    assert!(
        index.find(&Value::from("ron")).is_empty(),
        "partial substrings are not tokens and must not match"
    );
}

#[test]
fn exact_find_requires_the_full_string() {
    let index = exact_index();
    let id = RecordId::from_u128(1);
    index.put(&Value::from("Andreas Ronge"), id);

    assert!(index.find(&Value::from("ronge")).is_empty());
    assert!(index.find(&Value::from("Andreas Ronge")).contains(&id));
}

#[test]
fn put_is_idempotent_and_remove_leaves_no_duplicate() {
    let index = exact_index();
    let id = RecordId::from_u128(7);
    let value = Value::from("hello");

    index.put(&value, id);
    index.put(&value, id);
    index.remove(&value, id);

    assert!(
        index.find(&value).is_empty(),
        "double put then single remove must leave no dangling entry"
    );
}

#[test]
fn remove_prunes_empty_token_sets() {
    let index = tokenized_index();
    let id = RecordId::from_u128(2);
    index.put(&Value::from("hej hopp"), id);
    index.remove(&Value::from("hej hopp"), id);

    assert!(index.entries().is_empty(), "empty token sets must be pruned");
}

#[test]
fn remove_of_absent_identity_is_a_no_op() {
    let index = exact_index();
    index.put(&Value::from("hello"), RecordId::from_u128(1));
    index.remove(&Value::from("hello"), RecordId::from_u128(2));

    assert!(index.find(&Value::from("hello")).contains(&RecordId::from_u128(1)));
}

#[test]
fn drop_entries_empties_the_index() {
    let index = exact_index();
    index.put(&Value::from("hello"), RecordId::from_u128(1));
    index.drop_entries();

    assert!(index.is_empty());
    assert!(index.find(&Value::from("hello")).is_empty());
}

#[test]
fn rebuild_rederives_entries_from_live_records() {
    let index = exact_index();
    index.put(&Value::from("stale"), RecordId::from_u128(9));

    let mut a = Record::new(RecordId::from_u128(1));
    a.set_property("name", Value::from("fresh"));
    let mut b = Record::new(RecordId::from_u128(2));
    b.set_property("other", Value::from("unrelated"));

    index.rebuild([&a, &b]);

    assert!(index.find(&Value::from("stale")).is_empty());
    assert!(index.find(&Value::from("fresh")).contains(&a.id()));
    assert_eq!(
        index.entries().len(),
        1,
        "records without the indexed property contribute nothing"
    );
}

#[test]
fn numeric_and_boolean_values_project_onto_canonical_tokens() {
    let index = Index::new(IndexModel::new("TestNode", "age", false).expect("valid index model"));
    let id = RecordId::from_u128(3);
    index.put(&Value::from(0i64), id);

    assert!(index.find(&Value::from(0i64)).contains(&id));
    assert!(index.find(&Value::from(1i64)).is_empty());

    let height = Index::new(
        IndexModel::new("TestNode", "height", false).expect("valid index model"),
    );
    height.put(&Value::from(2.0 * 0.1), id);
    assert!(height.find(&Value::from(0.2)).contains(&id));
}

#[test]
fn equal_text_of_different_types_does_not_collide() {
    let index = Index::new(IndexModel::new("TestNode", "age", false).expect("valid index model"));
    let id = RecordId::from_u128(4);
    index.put(&Value::from(0i64), id);

    assert!(index.find(&Value::from(0u64)).is_empty());
    assert!(index.find(&Value::from("0")).is_empty());
    assert!(index.find(&Value::from(0i64)).contains(&id));
}

#[test]
fn registry_declare_is_idempotent_for_identical_arguments() {
    let registry = IndexRegistry::new();
    let model = IndexModel::new("Person", "name", true).expect("valid index model");

    let first = registry.declare(model.clone());
    assert!(matches!(first, DeclareOutcome::Created(_)));

    let second = registry.declare(model);
    assert!(
        matches!(second, DeclareOutcome::Unchanged),
        "identical re-declaration must be a no-op"
    );
}

#[test]
fn registry_replaces_index_when_tokenized_changes() {
    let registry = IndexRegistry::new();
    registry.declare(IndexModel::new("Person", "name", false).expect("valid index model"));
    registry
        .get("name")
        .expect("declared index should resolve")
        .put(&Value::from("Andreas Ronge"), RecordId::from_u128(1));

    let outcome =
        registry.declare(IndexModel::new("Person", "name", true).expect("valid index model"));
    let DeclareOutcome::Replaced(replacement) = outcome else {
        panic!("changed tokenized flag must replace the index");
    };

    assert!(replacement.model().tokenized);
    assert!(
        replacement.is_empty(),
        "a replacement starts empty until the caller rebuilds it"
    );
}

#[test]
fn registry_remove_drops_entries_and_unregisters() {
    let registry = IndexRegistry::new();
    registry.declare(IndexModel::new("Person", "name", false).expect("valid index model"));
    let index = registry.get("name").expect("declared index should resolve");
    index.put(&Value::from("foo2"), RecordId::from_u128(1));

    let removed = registry.remove("name").expect("removal should return the index");
    assert!(removed.is_empty(), "removal drops the index's entries");
    assert!(registry.get("name").is_none());
    assert!(registry.declared().is_empty());
}
