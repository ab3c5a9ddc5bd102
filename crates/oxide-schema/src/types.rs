//! Abstract column types and their per-dialect declarations.
//!
//! A [`TypeRegistry`] is a small rule table mapping each [`ColumnType`] to a
//! [`TypeRule`]. Platforms build their registry once at construction; the
//! table is read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::schema::Column;

/// Precision used for decimal columns that do not declare one.
pub const DEFAULT_PRECISION: u32 = 10;

/// Dialect independent column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 16-bit integer.
    #[serde(rename = "smallint")]
    SmallInt,
    /// 32-bit integer.
    #[serde(rename = "integer")]
    Integer,
    /// 64-bit integer.
    #[serde(rename = "bigint")]
    BigInt,
    /// Exact numeric with precision and scale.
    #[serde(rename = "decimal")]
    Decimal,
    /// Double precision floating point.
    #[serde(rename = "float")]
    Float,
    /// Boolean.
    #[serde(rename = "boolean")]
    Boolean,
    /// Character string with a length.
    #[serde(rename = "string")]
    String,
    /// Character string restricted to ASCII.
    #[serde(rename = "ascii_string")]
    AsciiString,
    /// Unbounded character data.
    #[serde(rename = "text")]
    Text,
    /// Binary string with a length.
    #[serde(rename = "binary")]
    Binary,
    /// Unbounded binary data.
    #[serde(rename = "blob")]
    Blob,
    /// Calendar date.
    #[serde(rename = "date")]
    Date,
    /// Date and time without time zone.
    #[serde(rename = "datetime")]
    DateTime,
    /// Date and time with time zone.
    #[serde(rename = "datetimetz")]
    DateTimeTz,
    /// Time of day.
    #[serde(rename = "time")]
    Time,
    /// UUID.
    #[serde(rename = "guid")]
    Guid,
    /// JSON document.
    #[serde(rename = "json")]
    Json,
}

impl ColumnType {
    /// Every abstract type.
    pub const ALL: [Self; 17] = [
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Decimal,
        Self::Float,
        Self::Boolean,
        Self::String,
        Self::AsciiString,
        Self::Text,
        Self::Binary,
        Self::Blob,
        Self::Date,
        Self::DateTime,
        Self::DateTimeTz,
        Self::Time,
        Self::Guid,
        Self::Json,
    ];

    /// The type's serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::AsciiString => "ascii_string",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Blob => "blob",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTimeTz => "datetimetz",
            Self::Time => "time",
            Self::Guid => "guid",
            Self::Json => "json",
        }
    }

    /// Types that carry a length and have fixed and variable forms.
    #[must_use]
    pub const fn is_sized(self) -> bool {
        matches!(self, Self::String | Self::AsciiString | Self::Binary)
    }

    /// Integer types, the only ones that may be autoincrement.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::BigInt)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one abstract type is declared on a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    /// A declaration that ignores every column option.
    Keyword(&'static str),
    /// `VARIABLE(n)` or `FIXED(n)` depending on the fixed flag.
    Sized {
        /// Keyword for the variable-length form.
        variable: &'static str,
        /// Keyword for the fixed-length form.
        fixed: &'static str,
        /// Whether a missing length is an error rather than a bare keyword.
        length_required: bool,
    },
    /// `KEYWORD(precision, scale)`.
    Numeric(&'static str),
    /// Integer storage type, with the native identity spelling if any.
    Integer {
        /// Declaration of an ordinary column.
        storage: &'static str,
        /// Declaration of an autoincrement column.
        identity: Option<&'static str>,
    },
}

/// Per-platform table of [`TypeRule`]s plus the reverse mapping from
/// database type names to abstract types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    platform: &'static str,
    rules: HashMap<ColumnType, TypeRule>,
    db_types: HashMap<&'static str, ColumnType>,
}

impl TypeRegistry {
    /// Creates an empty registry for the named platform.
    #[must_use]
    pub fn new(platform: &'static str) -> Self {
        Self {
            platform,
            rules: HashMap::new(),
            db_types: HashMap::new(),
        }
    }

    /// Adds the declaration rule for a type.
    #[must_use]
    pub fn rule(mut self, column_type: ColumnType, rule: TypeRule) -> Self {
        self.rules.insert(column_type, rule);
        self
    }

    /// Maps a lower-case database type name back to an abstract type.
    #[must_use]
    pub fn db_type(mut self, name: &'static str, column_type: ColumnType) -> Self {
        self.db_types.insert(name, column_type);
        self
    }

    /// The rule registered for a type.
    #[must_use]
    pub fn rule_for(&self, column_type: ColumnType) -> Option<TypeRule> {
        self.rules.get(&column_type).copied()
    }

    /// The abstract type a database type name maps to.
    #[must_use]
    pub fn abstract_type(&self, db_type: &str) -> Option<ColumnType> {
        self.db_types.get(db_type.to_lowercase().as_str()).copied()
    }

    /// Whether a database type name is known.
    #[must_use]
    pub fn has_db_type(&self, db_type: &str) -> bool {
        self.abstract_type(db_type).is_some()
    }

    /// Renders the type declaration of a column.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ColumnLengthRequired`] when a length is needed and
    /// missing, [`SchemaError::UnsupportedOperation`] when the platform has
    /// no rule for the column's type.
    pub fn declaration(&self, column: &Column) -> Result<String> {
        let rule = self.rule_for(column.column_type).ok_or_else(|| {
            SchemaError::unsupported(self.platform, format!("column type {}", column.column_type))
        })?;

        match rule {
            TypeRule::Keyword(keyword) => Ok(keyword.to_string()),
            TypeRule::Sized {
                variable,
                fixed,
                length_required,
            } => {
                let keyword = if column.fixed { fixed } else { variable };
                match column.length.filter(|len| *len > 0) {
                    Some(len) => Ok(format!("{keyword}({len})")),
                    None if length_required || column.fixed => {
                        Err(SchemaError::ColumnLengthRequired {
                            platform: self.platform,
                            column: column.name.to_string(),
                            column_type: column.column_type.to_string(),
                        })
                    }
                    None => Ok(keyword.to_string()),
                }
            }
            TypeRule::Numeric(keyword) => Ok(format!(
                "{keyword}({}, {})",
                column.precision.unwrap_or(DEFAULT_PRECISION),
                column.scale
            )),
            TypeRule::Integer { storage, identity } => Ok(match identity {
                Some(identity) if column.autoincrement => identity.to_string(),
                _ => storage.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new("test")
            .rule(
                ColumnType::String,
                TypeRule::Sized {
                    variable: "VARCHAR",
                    fixed: "CHAR",
                    length_required: false,
                },
            )
            .rule(
                ColumnType::Binary,
                TypeRule::Sized {
                    variable: "VARBINARY",
                    fixed: "BINARY",
                    length_required: true,
                },
            )
            .rule(ColumnType::Decimal, TypeRule::Numeric("NUMERIC"))
            .rule(
                ColumnType::Integer,
                TypeRule::Integer {
                    storage: "INT",
                    identity: Some("SERIAL"),
                },
            )
            .rule(ColumnType::Text, TypeRule::Keyword("TEXT"))
            .db_type("varchar", ColumnType::String)
    }

    #[test]
    fn test_sized_types() {
        let registry = registry();
        let column = Column::new("name", ColumnType::String).length(16);
        assert_eq!(registry.declaration(&column).unwrap(), "VARCHAR(16)");

        let column = column.fixed(true);
        assert_eq!(registry.declaration(&column).unwrap(), "CHAR(16)");

        let column = Column::new("name", ColumnType::String);
        assert_eq!(registry.declaration(&column).unwrap(), "VARCHAR");
    }

    #[test]
    fn test_required_length() {
        let registry = registry();
        let column = Column::new("data", ColumnType::Binary);
        assert!(matches!(
            registry.declaration(&column),
            Err(SchemaError::ColumnLengthRequired { column, .. }) if column == "data"
        ));

        // A fixed column always needs its length.
        let column = Column::new("code", ColumnType::String).fixed(true);
        assert!(matches!(
            registry.declaration(&column),
            Err(SchemaError::ColumnLengthRequired { .. })
        ));
    }

    #[test]
    fn test_numeric_defaults() {
        let registry = registry();
        let column = Column::new("price", ColumnType::Decimal);
        assert_eq!(registry.declaration(&column).unwrap(), "NUMERIC(10, 0)");

        let column = column.precision(8).scale(2);
        assert_eq!(registry.declaration(&column).unwrap(), "NUMERIC(8, 2)");
    }

    #[test]
    fn test_integer_identity() {
        let registry = registry();
        let column = Column::new("id", ColumnType::Integer);
        assert_eq!(registry.declaration(&column).unwrap(), "INT");
        assert_eq!(
            registry.declaration(&column.autoincrement(true)).unwrap(),
            "SERIAL"
        );
    }

    #[test]
    fn test_missing_rule() {
        let column = Column::new("doc", ColumnType::Json);
        assert!(matches!(
            registry().declaration(&column),
            Err(SchemaError::UnsupportedOperation { platform: "test", .. })
        ));
    }

    #[test]
    fn test_reverse_mapping() {
        let registry = registry();
        assert_eq!(registry.abstract_type("VARCHAR"), Some(ColumnType::String));
        assert!(!registry.has_db_type("long raw"));
    }
}
