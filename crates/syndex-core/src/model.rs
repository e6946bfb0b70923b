use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};

///
/// ModelError
///

#[derive(Debug, ThisError)]
pub enum ModelError {
    #[error("type name must not be empty")]
    EmptyTypeName,

    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("property '{0}' declared twice")]
    DuplicateProperty(String),
}

impl From<ModelError> for InternalError {
    fn from(err: ModelError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Schema, err.to_string())
    }
}

///
/// TypeModel
///
/// Runtime descriptor of a record type: its name and the set of declared
/// properties. Undeclared properties are invisible to indexing and `find`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeModel {
    pub name: String,
    pub properties: Vec<String>,
}

impl TypeModel {
    pub fn new(
        name: impl Into<String>,
        properties: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyTypeName);
        }

        let mut out: Vec<String> = Vec::new();
        for property in properties {
            let property = property.into();
            if property.is_empty() {
                return Err(ModelError::EmptyPropertyName);
            }
            if out.contains(&property) {
                return Err(ModelError::DuplicateProperty(property));
            }
            out.push(property);
        }

        Ok(Self {
            name,
            properties: out,
        })
    }

    #[must_use]
    pub fn declares(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

///
/// IndexModel
///
/// Runtime descriptor for one per-property index. Pure description; the
/// entry map lives in `db::index`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexModel {
    pub name: String,
    pub property: String,
    pub tokenized: bool,
}

impl IndexModel {
    pub fn new(
        type_name: &str,
        property: impl Into<String>,
        tokenized: bool,
    ) -> Result<Self, ModelError> {
        let property = property.into();
        if type_name.is_empty() {
            return Err(ModelError::EmptyTypeName);
        }
        if property.is_empty() {
            return Err(ModelError::EmptyPropertyName);
        }

        Ok(Self {
            name: format!("{type_name}.{property}"),
            property,
            tokenized,
        })
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokenized {
            write!(f, "TOKENIZED {}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}
