use crate::value::Value;
use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};
use ulid::Ulid;

///
/// RecordId
///
/// Opaque stable identity for a record. Immutable once assigned and never
/// reused after deletion.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct RecordId(Ulid);

impl RecordId {
    /// Generate a fresh identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Build an identity from raw bits. Intended for fixtures.
    #[must_use]
    pub const fn from_u128(bits: u128) -> Self {
        Self(Ulid(bits))
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// Record
///
/// A mutable entity with an identity and a set of named properties.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    properties: BTreeMap<String, Value>,
    deleted: bool,
}

impl Record {
    #[must_use]
    pub const fn new(id: RecordId) -> Self {
        Self {
            id,
            properties: BTreeMap::new(),
            deleted: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Set a property, returning the previous value if any.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) const fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

///
/// RecordStore
///
/// Committed records only; staged mutations live in the transaction context
/// until commit. Deleted records are removed outright.
///

#[derive(Debug, Default, Deref, DerefMut)]
pub struct RecordStore(BTreeMap<RecordId, Record>);

impl RecordStore {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Iterate live records, in identity order.
    pub fn live(&self) -> impl Iterator<Item = &Record> {
        self.0.values().filter(|record| !record.is_deleted())
    }
}
