#[cfg(test)]
mod tests;

use crate::{
    db::{TypeStore, store::RecordId},
    obs::sink::{self, MetricsEvent, PlanKind},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    const fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Gte => matches!(ordering, Ordering::Greater | Ordering::Equal),
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Lte => matches!(ordering, Ordering::Less | Ordering::Equal),
        }
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ComparePredicate {
    pub property: String,
    pub op: CompareOp,
    pub value: Value,
}

///
/// Predicate
///
/// Typed predicate tree: a conjunction of comparison clauses. Equality
/// clauses on indexed properties are served from the indexes; everything
/// else falls back to scanning live records.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Predicate {
    And(Vec<Predicate>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn and(clauses: impl IntoIterator<Item = Self>) -> Self {
        Self::And(clauses.into_iter().collect())
    }

    #[must_use]
    pub fn compare(property: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate {
            property: property.into(),
            op,
            value: value.into(),
        })
    }

    fn collect_clauses<'a>(&'a self, out: &mut Vec<&'a ComparePredicate>) {
        match self {
            Self::And(children) => {
                for child in children {
                    child.collect_clauses(out);
                }
            }
            Self::Compare(clause) => out.push(clause),
        }
    }
}

///
/// FindQuery
///
/// Explicit list of `(property, value)` equality constraints, AND-combined
/// by intersecting each property's index result.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FindQuery {
    constraints: Vec<(String, Value)>,
}

impl FindQuery {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn eq(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.push((property.into(), value.into()));
        self
    }

    #[must_use]
    pub fn constraints(&self) -> &[(String, Value)] {
        &self.constraints
    }
}

/// Serve a find query from the indexes alone.
///
/// A constraint on an undeclared property can match nothing, so the whole
/// query finds nothing; this is the "no index" case, not an error. An empty
/// query has no constraint to serve and also finds nothing.
pub(crate) fn find_all(store: &TypeStore, query: &FindQuery) -> BTreeSet<RecordId> {
    if query.constraints.is_empty() {
        return BTreeSet::new();
    }

    let mut sets = Vec::with_capacity(query.constraints.len());
    for (property, value) in &query.constraints {
        let Some(index) = store.indexes().get(property) else {
            return BTreeSet::new();
        };
        sets.push(index.find(value));
    }

    sink::record(MetricsEvent::Plan {
        kind: if sets.len() > 1 {
            PlanKind::Intersection
        } else {
            PlanKind::Index
        },
    });

    intersect(sets)
}

/// Serve a predicate-tree query.
///
/// Indexed equality clauses narrow the candidate set through the indexes;
/// residual clauses (ordered comparisons, or equality on unindexed
/// properties) are evaluated against the records themselves.
pub(crate) fn find_where(store: &TypeStore, predicate: &Predicate) -> BTreeSet<RecordId> {
    let mut clauses = Vec::new();
    predicate.collect_clauses(&mut clauses);

    let mut indexed_sets = Vec::new();
    let mut residual = Vec::new();
    for clause in clauses {
        if clause.op == CompareOp::Eq
            && let Some(index) = store.indexes().get(&clause.property)
        {
            indexed_sets.push(index.find(&clause.value));
        } else {
            residual.push(clause);
        }
    }

    let candidates = if indexed_sets.is_empty() {
        None
    } else {
        sink::record(MetricsEvent::Plan {
            kind: if indexed_sets.len() > 1 {
                PlanKind::Intersection
            } else {
                PlanKind::Index
            },
        });
        Some(intersect(indexed_sets))
    };

    if residual.is_empty() {
        return match candidates {
            Some(ids) => ids,
            // A trivially true predicate matches every live record.
            None => store.with_records(|records| records.live().map(|r| r.id()).collect()),
        };
    }

    match candidates {
        Some(ids) => store.with_records(|records| {
            ids.into_iter()
                .filter(|id| {
                    records
                        .get(id)
                        .is_some_and(|record| {
                            residual.iter().all(|clause| clause_matches(record, clause))
                        })
                })
                .collect()
        }),
        None => {
            sink::record(MetricsEvent::Plan {
                kind: PlanKind::FullScan,
            });
            store.with_records(|records| {
                let mut scanned: u64 = 0;
                let out = records
                    .live()
                    .filter(|record| {
                        scanned = scanned.saturating_add(1);
                        residual.iter().all(|clause| clause_matches(record, clause))
                    })
                    .map(crate::db::store::Record::id)
                    .collect();
                sink::record(MetricsEvent::RowsScanned { rows: scanned });
                out
            })
        }
    }
}

fn clause_matches(record: &crate::db::store::Record, clause: &ComparePredicate) -> bool {
    let Some(actual) = record.property(&clause.property) else {
        return false;
    };

    // Mixed-type clauses never match; no coercion.
    actual
        .compare_same_family(&clause.value)
        .is_some_and(|ordering| clause.op.matches(ordering))
}

/// Intersect result sets, smallest first.
fn intersect(mut sets: Vec<BTreeSet<RecordId>>) -> BTreeSet<RecordId> {
    sets.sort_by_key(BTreeSet::len);

    let mut iter = sets.into_iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };
    let rest: Vec<_> = iter.collect();

    first
        .into_iter()
        .filter(|id| rest.iter().all(|set| set.contains(id)))
        .collect()
}
