use crate::{
    db::{
        Db, TypeStore,
        query::{FindQuery, Predicate},
        store::Record,
    },
    test_support::{commit_record, store_with_indexes},
    value::Value,
};
use std::sync::Arc;

/// Two groups of five records: foo0..foo4 and bar0..bar4, ages 0..4 each.
fn populated_store(db: &Db) -> (Arc<TypeStore>, Vec<Record>, Vec<Record>) {
    let store = store_with_indexes(
        db,
        "TestNode",
        &["name", "age", "male", "height", "score"],
        &[("name", false), ("age", false), ("male", false), ("height", false)],
    );

    let mut foos = Vec::new();
    let mut bars = Vec::new();
    for (prefix, group) in [("foo", &mut foos), ("bar", &mut bars)] {
        for n in 0..5i64 {
            let height = f64::from(u8::try_from(n).unwrap_or_default()) * 0.1;
            group.push(commit_record(
                db,
                &store,
                &[
                    ("name", Value::from(format!("{prefix}{n}"))),
                    ("age", Value::from(n)),
                    ("male", Value::from(n == 0)),
                    ("height", Value::from(height)),
                    ("score", Value::from(40 + n)),
                ],
            ));
        }
    }

    (store, foos, bars)
}

#[test]
fn find_by_name_returns_one_record() {
    let db = Db::new();
    let (store, foos, _) = populated_store(&db);

    let found = store.find("name", &Value::from("foo2"));
    assert_eq!(found.len(), 1);
    assert!(found.contains(&foos[2].id()));
}

#[test]
fn find_by_age_returns_one_record_per_group() {
    let db = Db::new();
    let (store, foos, bars) = populated_store(&db);

    let found = store.find("age", &Value::from(0i64));
    assert_eq!(found.len(), 2);
    assert!(found.contains(&foos[0].id()));
    assert!(found.contains(&bars[0].id()));
}

#[test]
fn find_all_intersects_two_fields() {
    let db = Db::new();
    let (store, foos, _) = populated_store(&db);

    let found = store.find_all(
        &FindQuery::new()
            .eq("age", 0i64)
            .eq("name", "foo0"),
    );
    assert_eq!(found.len(), 1);
    assert!(found.contains(&foos[0].id()));
}

#[test]
fn find_by_boolean_property() {
    let db = Db::new();
    let (store, foos, bars) = populated_store(&db);

    let found = store.find("male", &Value::from(true));
    assert_eq!(found.len(), 2);
    assert!(found.contains(&foos[0].id()));
    assert!(found.contains(&bars[0].id()));
}

#[test]
fn find_by_float_property() {
    let db = Db::new();
    let (store, foos, bars) = populated_store(&db);

    let found = store.find("height", &Value::from(0.2));
    assert_eq!(found.len(), 2);
    assert!(found.contains(&foos[2].id()));
    assert!(found.contains(&bars[2].id()));
}

#[test]
fn find_on_undeclared_property_returns_empty() {
    let db = Db::new();
    let store = store_with_indexes(&db, "NoIndex", &["age"], &[]);

    assert!(store.find("age", &Value::from(0i64)).is_empty());
    assert!(
        store
            .find_all(&FindQuery::new().eq("age", 0i64))
            .is_empty(),
        "a constraint on an undeclared property can match nothing"
    );
}

#[test]
fn empty_find_query_returns_empty() {
    let db = Db::new();
    let (store, _, _) = populated_store(&db);

    assert!(store.find_all(&FindQuery::new()).is_empty());
}

#[test]
fn predicate_conjunction_served_from_indexes() {
    let db = Db::new();
    let (store, foos, _) = populated_store(&db);

    let found = store.find_where(&Predicate::and([
        Predicate::eq("age", 0i64),
        Predicate::eq("name", "foo0"),
    ]));
    assert_eq!(found.len(), 1);
    assert!(found.contains(&foos[0].id()));
}

#[test]
fn ordered_comparison_falls_back_to_scan() {
    let db = Db::new();
    let (store, _, _) = populated_store(&db);

    let found = store.find_where(&Predicate::gt("score", 41i64));
    assert_eq!(
        found.len(),
        6,
        "score > 41 matches ages 2..4 in both groups"
    );
}

#[test]
fn indexed_equality_narrows_a_scan_residual() {
    let db = Db::new();
    let (store, foos, bars) = populated_store(&db);

    let found = store.find_where(&Predicate::and([
        Predicate::eq("age", 3i64),
        Predicate::gt("score", 41i64),
    ]));
    assert_eq!(found.len(), 2);
    assert!(found.contains(&foos[3].id()));
    assert!(found.contains(&bars[3].id()));
}

#[test]
fn equality_on_unindexed_property_is_served_by_scan() {
    let db = Db::new();
    let (store, foos, bars) = populated_store(&db);

    // 'score' has no index; equality on it must still be answerable.
    let found = store.find_where(&Predicate::eq("score", 44i64));
    assert_eq!(found.len(), 2);
    assert!(found.contains(&foos[4].id()));
    assert!(found.contains(&bars[4].id()));
}

#[test]
fn mixed_type_clauses_never_match() {
    let db = Db::new();
    let (store, _, _) = populated_store(&db);

    // ages are Int; a Uint clause must not coerce.
    assert!(store.find_where(&Predicate::eq("age", 0u64)).is_empty());
}

#[test]
fn trivially_true_predicate_matches_every_live_record() {
    let db = Db::new();
    let (store, _, _) = populated_store(&db);

    let found = store.find_where(&Predicate::and([]));
    assert_eq!(found.len(), 10);
}
