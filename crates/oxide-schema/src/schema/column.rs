//! Column definitions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;
use crate::types::{ColumnType, DEFAULT_PRECISION};

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// Explicit `DEFAULT NULL`.
    Null,
    /// Boolean literal, rendered by the platform.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal, quoted and escaped by the platform.
    String(String),
    /// Raw SQL expression such as `CURRENT_TIMESTAMP`.
    Expression(String),
}

/// A table column.
///
/// Columns are NOT NULL unless [`Column::nullable`] is called. Numeric
/// precision defaults to 10 and scale to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: Identifier,
    /// Abstract type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Length of string and binary columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Precision of decimal columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Scale of decimal columns.
    #[serde(default)]
    pub scale: u32,
    /// Whether a string or binary column has fixed length.
    #[serde(default)]
    pub fixed: bool,
    /// Whether the column accepts NULL.
    #[serde(default)]
    pub nullable: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Whether values are generated on insert.
    #[serde(default)]
    pub autoincrement: bool,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// Creates a NOT NULL column of the given type.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            precision: None,
            scale: 0,
            fixed: false,
            nullable: false,
            default: None,
            autoincrement: false,
            comment: None,
        }
    }

    /// Sets the length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the fixed-length flag.
    #[must_use]
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Sets the precision.
    #[must_use]
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the scale.
    #[must_use]
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Forbids NULL values.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the autoincrement flag.
    #[must_use]
    pub fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The comment, with an empty comment treated as none.
    #[must_use]
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    /// Checks the column invariants.
    ///
    /// # Errors
    ///
    /// Empty name, a fixed string or binary column without length, or a
    /// scale larger than the precision.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "Column" });
        }
        if self.fixed && self.column_type.is_sized() && self.length.unwrap_or(0) == 0 {
            return Err(SchemaError::ColumnLengthRequired {
                platform: "every platform",
                column: self.name.to_string(),
                column_type: self.column_type.to_string(),
            });
        }
        let precision = self.precision.unwrap_or(DEFAULT_PRECISION);
        if self.column_type == ColumnType::Decimal && self.scale > precision {
            return Err(SchemaError::InvalidPrecision {
                column: self.name.to_string(),
                precision,
                scale: self.scale,
            });
        }
        Ok(())
    }
}
