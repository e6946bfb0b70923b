use crate::{Error, handle::Handle};
use syndex_core::{db::Db, model::TypeModel};

///
/// TypeDef
///
/// Runtime declaration of a record type: property names plus index
/// declarations. Registering produces the shared per-type registry and a
/// typed [`Handle`] over it.
///

#[derive(Clone, Debug, Default)]
pub struct TypeDef {
    name: String,
    properties: Vec<String>,
    indexes: Vec<(String, bool)>,
}

impl TypeDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Declare a property. Undeclared properties cannot be written or
    /// indexed.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    /// Declare an exact-match index on a previously declared property.
    #[must_use]
    pub fn index(self, property: impl Into<String>) -> Self {
        self.index_with(property, false)
    }

    /// Declare a tokenized (case-insensitive, whole-word) index on a
    /// previously declared property.
    #[must_use]
    pub fn tokenized_index(self, property: impl Into<String>) -> Self {
        self.index_with(property, true)
    }

    /// Register the type and declare its indexes.
    pub fn register(self, db: &Db) -> Result<Handle, Error> {
        let model = TypeModel::new(self.name, self.properties)?;
        let store = db.register_type(model)?;
        for (property, tokenized) in &self.indexes {
            store.declare_index(property, *tokenized)?;
        }

        Ok(Handle::new(store))
    }

    #[must_use]
    fn index_with(mut self, property: impl Into<String>, tokenized: bool) -> Self {
        self.indexes.push((property.into(), tokenized));
        self
    }
}
