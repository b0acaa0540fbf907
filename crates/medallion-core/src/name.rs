//! Validated catalog and schema identifiers.
//!
//! Names are rendered unquoted into DDL, so they are restricted to the
//! identifier characters every lakehouse SQL dialect accepts bare:
//! - Non-empty, at most 255 characters
//! - ASCII letters, digits and underscores
//! - Must not start with a digit
//!
//! The metastore folds unquoted identifiers to lowercase, so names are
//! stored lowercased and `GOLD` and `gold` are the same schema.
//!
//! # Example
//!
//! ```rust
//! use medallion_core::name::{CatalogName, SchemaName, SchemaRef};
//!
//! let catalog = CatalogName::new("fmcg").unwrap();
//! let schema = SchemaName::new("gold").unwrap();
//! assert_eq!(SchemaRef::new(catalog, schema).to_string(), "fmcg.gold");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 255;

fn validate(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            message: format!("{kind} name cannot be empty"),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName {
            message: format!("{kind} name '{name}' is too long (maximum {MAX_NAME_LEN} characters)"),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::InvalidName {
            message: format!(
                "{kind} name '{name}' contains invalid characters (only letters, digits, and underscores allowed)"
            ),
        });
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::InvalidName {
            message: format!("{kind} name '{name}' cannot start with a digit"),
        });
    }

    Ok(())
}

macro_rules! namespace_name {
    ($(#[$meta:meta])* $ty:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $ty(String);

        impl $ty {
            /// Creates a new name after validating the format, folded to lowercase.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidName`] if the name is invalid.
            pub fn new(name: impl Into<String>) -> Result<Self> {
                let name = name.into().to_ascii_lowercase();
                validate($kind, &name)?;
                Ok(Self(name))
            }

            /// Creates a name without validation.
            ///
            /// The caller must ensure the name is valid, e.g. a compile-time
            /// constant or a name already read back from the platform.
            #[must_use]
            pub fn new_unchecked(name: impl Into<String>) -> Self {
                Self(name.into().to_ascii_lowercase())
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

namespace_name!(
    /// Name of a top-level catalog.
    CatalogName,
    "catalog"
);

namespace_name!(
    /// Name of a schema inside a catalog.
    SchemaName,
    "schema"
);

/// A schema qualified by its parent catalog, rendered `catalog.schema`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaRef {
    /// Parent catalog.
    pub catalog: CatalogName,
    /// Schema name within the catalog.
    pub schema: SchemaName,
}

impl SchemaRef {
    /// Creates a qualified schema reference.
    #[must_use]
    pub fn new(catalog: CatalogName, schema: SchemaName) -> Self {
        Self { catalog, schema }
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.schema)
    }
}

impl FromStr for SchemaRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((catalog, schema)) = s.split_once('.') else {
            return Err(Error::InvalidName {
                message: format!("'{s}' is not a qualified schema name (expected catalog.schema)"),
            });
        };
        Ok(Self::new(catalog.parse()?, schema.parse()?))
    }
}
