mod registry;
#[cfg(test)]
mod tests;

pub use registry::{DeclareOutcome, IndexRegistry};

use crate::{
    db::{
        store::{Record, RecordId},
        txn::IndexDelta,
    },
    model::IndexModel,
    obs::sink::{self, MetricsEvent},
    value::{Value, ValueTag},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

///
/// IndexToken
///
/// The indexable projection of a property value. Exact indexes file the
/// canonical text verbatim; tokenized indexes file lowercase word tokens.
/// Tokens carry the value's type tag, so equal text of different types
/// never collides ("0" as Int vs Uint).
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct IndexToken {
    tag: ValueTag,
    text: String,
}

impl IndexToken {
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        self.tag
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Project a value onto its index tokens.
///
/// Tokenized projection splits on non-alphanumeric boundaries and lowercases,
/// so matching is whole-token and case-insensitive. There is no substring
/// matching: "ronge" matches "Andreas Ronge", "ron" does not.
fn project(value: &Value, tokenized: bool) -> BTreeSet<IndexToken> {
    let tag = value.tag();
    let text = value.canonical_text();

    if tokenized {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| IndexToken {
                tag,
                text: token.to_lowercase(),
            })
            .collect()
    } else {
        BTreeSet::from([IndexToken { tag, text }])
    }
}

type Entries = BTreeMap<IndexToken, BTreeSet<RecordId>>;

///
/// Index
///
/// Per-property lookup structure from value token to record identities.
/// Entries reflect committed state only; commit-time application and rebuild
/// hold the exclusive section, reads proceed concurrently.
///

#[derive(Debug)]
pub struct Index {
    model: IndexModel,
    entries: RwLock<Entries>,
}

impl Index {
    #[must_use]
    pub const fn new(model: IndexModel) -> Self {
        Self {
            model,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &IndexModel {
        &self.model
    }

    /// Add an identity under every token projected from the value.
    /// Idempotent; adding twice has no additional effect.
    pub fn put(&self, value: &Value, id: RecordId) {
        let mut entries = self.write_entries();
        let inserts = Self::put_locked(&mut entries, &self.model, value, id);
        drop(entries);

        sink::record(MetricsEvent::IndexApply {
            inserts,
            removes: 0,
        });
    }

    /// Remove an identity from every token projected from the value.
    /// No-op if absent.
    pub fn remove(&self, value: &Value, id: RecordId) {
        let mut entries = self.write_entries();
        let removes = Self::remove_locked(&mut entries, &self.model, value, id);
        drop(entries);

        sink::record(MetricsEvent::IndexApply {
            inserts: 0,
            removes,
        });
    }

    /// Look up identities for a value.
    ///
    /// Exact indexes match the canonical text verbatim. Tokenized indexes
    /// return the union of identities filed under any of the query's own
    /// tokens. An empty result is a valid outcome.
    #[must_use]
    pub fn find(&self, value: &Value) -> BTreeSet<RecordId> {
        let tokens = project(value, self.model.tokenized);
        let entries = self.read_entries();

        let mut out = BTreeSet::new();
        for token in &tokens {
            if let Some(ids) = entries.get(token) {
                out.extend(ids.iter().copied());
            }
        }

        out
    }

    /// Remove all entries. Subsequent finds return empty until repopulated.
    pub fn drop_entries(&self) {
        self.write_entries().clear();
    }

    /// Clear all entries, then re-derive them from the current property
    /// values of every live record. The migration boundary when an index
    /// definition changes.
    pub fn rebuild<'a>(&self, live: impl IntoIterator<Item = &'a Record>) {
        let mut entries = self.write_entries();
        entries.clear();

        for record in live {
            if let Some(value) = record.property(&self.model.property) {
                Self::put_locked(&mut entries, &self.model, value, record.id());
            }
        }

        let count = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        drop(entries);

        sink::record(MetricsEvent::IndexRebuilt { entries: count });
    }

    /// Apply one commit group under a single exclusive section, in staging
    /// order. Readers never observe a partially applied group.
    pub(crate) fn apply(&self, deltas: &[IndexDelta]) {
        let mut entries = self.write_entries();

        let mut inserts = 0;
        let mut removes = 0;
        for delta in deltas {
            if let Some(old) = &delta.old {
                removes += Self::remove_locked(&mut entries, &self.model, old, delta.id);
            }
            if let Some(new) = &delta.new {
                inserts += Self::put_locked(&mut entries, &self.model, new, delta.id);
            }
        }
        drop(entries);

        sink::record(MetricsEvent::IndexApply { inserts, removes });
    }

    /// Snapshot all entry pairs (diagnostics only).
    #[must_use]
    pub fn entries(&self) -> Vec<(IndexToken, BTreeSet<RecordId>)> {
        self.read_entries()
            .iter()
            .map(|(token, ids)| (token.clone(), ids.clone()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    fn put_locked(entries: &mut Entries, model: &IndexModel, value: &Value, id: RecordId) -> u64 {
        let mut inserts = 0;
        for token in project(value, model.tokenized) {
            if entries.entry(token).or_default().insert(id) {
                inserts += 1;
            }
        }
        inserts
    }

    fn remove_locked(
        entries: &mut Entries,
        model: &IndexModel,
        value: &Value,
        id: RecordId,
    ) -> u64 {
        let mut removes = 0;
        for token in project(value, model.tokenized) {
            if let Some(ids) = entries.get_mut(&token) {
                if ids.remove(&id) {
                    removes += 1;
                }
                if ids.is_empty() {
                    entries.remove(&token);
                }
            }
        }
        removes
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries
            .read()
            .expect("index entry lock poisoned")
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries
            .write()
            .expect("index entry lock poisoned")
    }
}
