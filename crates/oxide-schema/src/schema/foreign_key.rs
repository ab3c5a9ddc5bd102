//! Foreign key constraints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;

/// Action taken on referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferentialAction {
    /// Propagate the change.
    Cascade,
    /// Set the referencing columns to NULL.
    SetNull,
    /// Reject the change at the end of the statement.
    NoAction,
    /// Reject the change immediately.
    Restrict,
    /// Set the referencing columns to their defaults.
    SetDefault,
}

impl ReferentialAction {
    /// Canonical SQL spelling.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = SchemaError;

    /// Parses an action case-insensitively, tolerating extra whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "NO ACTION" => Ok(Self::NoAction),
            "RESTRICT" => Ok(Self::Restrict),
            "SET DEFAULT" => Ok(Self::SetDefault),
            _ => Err(SchemaError::UnknownReferentialAction(s.to_string())),
        }
    }
}

impl TryFrom<String> for ReferentialAction {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ReferentialAction> for String {
    fn from(value: ReferentialAction) -> Self {
        value.as_sql().to_string()
    }
}

/// A foreign key from local columns to columns of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name; empty means unnamed.
    #[serde(default)]
    pub name: Identifier,
    /// Referencing columns.
    pub local_columns: Vec<Identifier>,
    /// Referenced table.
    pub foreign_table: Identifier,
    /// Referenced columns, same cardinality as `local_columns`.
    pub foreign_columns: Vec<Identifier>,
    /// Action on update of the referenced row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
    /// Action on delete of the referenced row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

impl ForeignKeyConstraint {
    /// Creates an unnamed foreign key without referential actions.
    #[must_use]
    pub fn new(local_columns: &[&str], foreign_table: &str, foreign_columns: &[&str]) -> Self {
        Self {
            name: Identifier::default(),
            local_columns: local_columns.iter().map(|c| Identifier::new(c)).collect(),
            foreign_table: Identifier::new(foreign_table),
            foreign_columns: foreign_columns.iter().map(|c| Identifier::new(c)).collect(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<Identifier>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the update action.
    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Sets the delete action.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Checks that both column lists are non-empty and line up.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ForeignKeyColumnMismatch`].
    pub fn validate(&self, table: &Identifier) -> Result<()> {
        if self.local_columns.is_empty()
            || self.local_columns.len() != self.foreign_columns.len()
        {
            return Err(SchemaError::ForeignKeyColumnMismatch {
                table: table.to_string(),
                name: self.name.to_string(),
                local: self.local_columns.len(),
                foreign: self.foreign_columns.len(),
            });
        }
        Ok(())
    }

    /// Whether the constraint points at the given table.
    #[must_use]
    pub fn references(&self, table: &Identifier) -> bool {
        self.foreign_table.matches(table)
    }

    /// Structural equality, ignoring the constraint name.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        fn same_columns(a: &[Identifier], b: &[Identifier]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
        }

        same_columns(&self.local_columns, &other.local_columns)
            && same_columns(&self.foreign_columns, &other.foreign_columns)
            && self.foreign_table.matches(&other.foreign_table)
            && effective_action(self.on_update) == effective_action(other.on_update)
            && effective_action(self.on_delete) == effective_action(other.on_delete)
    }
}

/// An absent action behaves like NO ACTION.
fn effective_action(action: Option<ReferentialAction>) -> ReferentialAction {
    action.unwrap_or(ReferentialAction::NoAction)
}
