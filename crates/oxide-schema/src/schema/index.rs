//! Index definitions.

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Name given to primary key indexes.
pub const PRIMARY_KEY_NAME: &str = "primary";

/// A secondary index or the primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name. Empty names are replaced by a generated one when the
    /// index is added to a table.
    #[serde(default)]
    pub name: Identifier,
    /// Indexed columns, in order.
    pub columns: Vec<Identifier>,
    /// Whether values must be unique.
    #[serde(default)]
    pub unique: bool,
    /// Whether this is the primary key. Implies `unique`.
    #[serde(default)]
    pub primary: bool,
    /// Predicate of a partial index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Index {
    /// Creates a non-unique index.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| Identifier::new(c)).collect(),
            unique: false,
            primary: false,
            condition: None,
        }
    }

    /// Creates a primary key index.
    #[must_use]
    pub fn primary_key(columns: &[&str]) -> Self {
        Self::new(PRIMARY_KEY_NAME, columns).primary()
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index as primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    /// Restricts the index to rows matching a predicate.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Whether the index covers the given column.
    #[must_use]
    pub fn has_column(&self, column: &Identifier) -> bool {
        self.columns.iter().any(|c| c.matches(column))
    }

    /// Whether the index leads with exactly the given columns, so it can
    /// serve lookups on them.
    #[must_use]
    pub fn spans_columns(&self, columns: &[Identifier]) -> bool {
        !columns.is_empty()
            && columns.len() <= self.columns.len()
            && columns.iter().zip(&self.columns).all(|(a, b)| a.matches(b))
    }

    /// Structural equality: same columns in the same order, same flags and
    /// same predicate. Names are ignored.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self.spans_columns(&other.columns)
            && self.unique == other.unique
            && self.primary == other.primary
            && self.condition == other.condition
    }
}
