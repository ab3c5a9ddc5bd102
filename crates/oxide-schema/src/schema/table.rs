//! Tables.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;

use super::{Column, ForeignKeyConstraint, Index};

/// Longest generated index or constraint name.
pub const MAX_GENERATED_NAME_LENGTH: usize = 63;

/// Builds a deterministic asset name from a prefix and the CRC32 of each
/// part, e.g. `IDX_22660D028FD6E0FB`.
#[must_use]
pub fn generate_identifier_name(prefix: &str, parts: &[&str]) -> String {
    let hash: String = parts
        .iter()
        .map(|part| format!("{:x}", crc32fast::hash(part.as_bytes())))
        .collect();
    let mut name = format!("{prefix}_{hash}").to_uppercase();
    name.truncate(MAX_GENERATED_NAME_LENGTH);
    name
}

/// A table: ordered columns, an optional primary key, secondary indexes,
/// foreign keys and a comment.
///
/// Columns and indexes are keyed by their lower-cased name. Mutators
/// validate their input and leave the table untouched on error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableDef", into = "TableDef")]
pub struct Table {
    name: Identifier,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    primary_key: Option<Index>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    comment: Option<String>,
    /// Keys of indexes added on behalf of a foreign key.
    implicit_indexes: HashSet<String>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.indexes == other.indexes
            && self.primary_key == other.primary_key
            && self.foreign_keys == other.foreign_keys
            && self.comment == other.comment
    }
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            comment: None,
            implicit_indexes: HashSet::new(),
        }
    }

    /// Table name.
    #[must_use]
    pub const fn name(&self) -> &Identifier {
        &self.name
    }

    // ========================================================================
    // Columns
    // ========================================================================

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// The column fails [`Column::validate`] or its name is taken.
    pub fn add_column(&mut self, column: Column) -> Result<&mut Self> {
        column.validate()?;
        let key = column.name.key();
        if self.columns.contains_key(&key) {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.to_string(),
                column: column.name.to_string(),
            });
        }
        self.columns.insert(key, column);
        Ok(self)
    }

    /// Looks a column up by name, case-insensitively.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(&Identifier::new(name).key())
    }

    /// Mutable access to a column.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(&Identifier::new(name).key())
    }

    /// Whether the table has the named column.
    #[must_use]
    pub fn has_column(&self, name: &Identifier) -> bool {
        self.columns.contains_key(&name.key())
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// The first autoincrement column, if any.
    #[must_use]
    pub fn autoincrement_column(&self) -> Option<&Column> {
        self.columns.values().find(|c| c.autoincrement)
    }

    /// Removes a column together with the indexes covering it. Foreign keys
    /// are left alone; [`Table::validate`] reports the dangling reference.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let column = self.columns.shift_remove(&Identifier::new(name).key())?;
        let stale: Vec<String> = self
            .indexes
            .iter()
            .filter(|(_, index)| index.has_column(&column.name))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.indexes.shift_remove(&key);
            self.implicit_indexes.remove(&key);
        }
        if self
            .primary_key
            .as_ref()
            .is_some_and(|pk| pk.has_column(&column.name))
        {
            self.primary_key = None;
        }
        Some(column)
    }

    // ========================================================================
    // Primary key and indexes
    // ========================================================================

    /// Sets the primary key. Its columns become NOT NULL.
    ///
    /// # Errors
    ///
    /// No columns given, or one of them does not exist.
    pub fn set_primary_key(&mut self, columns: &[&str]) -> Result<&mut Self> {
        self.apply_primary_key(Index::primary_key(columns))
    }

    fn apply_primary_key(&mut self, index: Index) -> Result<&mut Self> {
        self.check_index_columns(&index)?;
        for column in &index.columns {
            if let Some(column) = self.columns.get_mut(&column.key()) {
                column.nullable = false;
            }
        }
        self.primary_key = Some(index);
        Ok(self)
    }

    /// The primary key index.
    #[must_use]
    pub const fn primary_key(&self) -> Option<&Index> {
        self.primary_key.as_ref()
    }

    /// Removes the primary key.
    pub fn drop_primary_key(&mut self) -> Option<Index> {
        self.primary_key.take()
    }

    /// Adds a non-unique index. A missing name is generated from the table
    /// and column names.
    ///
    /// # Errors
    ///
    /// See [`Table::add_index_definition`].
    pub fn add_index(&mut self, columns: &[&str], name: Option<&str>) -> Result<&mut Self> {
        self.add_index_definition(Index::new(name.unwrap_or_default(), columns))
    }

    /// Adds a unique index. A missing name is generated from the table and
    /// column names.
    ///
    /// # Errors
    ///
    /// See [`Table::add_index_definition`].
    pub fn add_unique_index(&mut self, columns: &[&str], name: Option<&str>) -> Result<&mut Self> {
        self.add_index_definition(Index::new(name.unwrap_or_default(), columns).unique())
    }

    /// Adds an index. Primary indexes replace the primary key.
    ///
    /// An explicit index takes over from an implicit foreign key index it
    /// covers.
    ///
    /// # Errors
    ///
    /// Empty column list, unknown column, or an explicit index of the same
    /// name already exists.
    pub fn add_index_definition(&mut self, mut index: Index) -> Result<&mut Self> {
        if index.primary {
            return self.apply_primary_key(index);
        }
        if index.name.is_empty() {
            let prefix = if index.unique { "UNIQ" } else { "IDX" };
            index.name = Identifier::unquoted(self.generated_name(prefix, &index.columns));
        }
        self.check_index_columns(&index)?;

        let key = index.name.key();
        if self.indexes.contains_key(&key) && !self.implicit_indexes.contains(&key) {
            return Err(SchemaError::DuplicateIndex {
                table: self.name.to_string(),
                index: index.name.to_string(),
            });
        }

        let superseded: Vec<String> = self
            .implicit_indexes
            .iter()
            .filter(|k| {
                self.indexes
                    .get(*k)
                    .is_some_and(|implicit| index.spans_columns(&implicit.columns))
            })
            .cloned()
            .collect();
        for k in superseded {
            self.indexes.shift_remove(&k);
            self.implicit_indexes.remove(&k);
        }

        self.indexes.insert(key, index);
        Ok(self)
    }

    /// Looks a secondary index up by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(&Identifier::new(name).key())
    }

    /// Secondary indexes in insertion order.
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    /// Whether an index was created implicitly for a foreign key.
    #[must_use]
    pub fn is_implicit_index(&self, index: &Index) -> bool {
        self.implicit_indexes.contains(&index.name.key())
    }

    /// Removes a secondary index.
    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        let key = Identifier::new(name).key();
        self.implicit_indexes.remove(&key);
        self.indexes.shift_remove(&key)
    }

    /// Renames a secondary index, keeping its position.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownIndex`] or [`SchemaError::DuplicateIndex`].
    pub fn rename_index(&mut self, old: &str, new: &str) -> Result<&mut Self> {
        let old_key = Identifier::new(old).key();
        let new_name = Identifier::new(new);
        let new_key = new_name.key();
        if new_key != old_key && self.indexes.contains_key(&new_key) {
            return Err(SchemaError::DuplicateIndex {
                table: self.name.to_string(),
                index: new_name.to_string(),
            });
        }
        let Some(position) = self.indexes.get_index_of(&old_key) else {
            return Err(SchemaError::UnknownIndex {
                table: self.name.to_string(),
                index: old.to_string(),
            });
        };

        let (_, mut index) = self
            .indexes
            .shift_remove_index(position)
            .ok_or_else(|| SchemaError::UnknownIndex {
                table: self.name.to_string(),
                index: old.to_string(),
            })?;
        index.name = new_name;
        self.implicit_indexes.remove(&old_key);
        self.indexes.shift_insert(position, new_key, index);
        Ok(self)
    }

    fn check_index_columns(&self, index: &Index) -> Result<()> {
        if index.columns.is_empty() {
            return Err(SchemaError::EmptyIndex {
                table: self.name.to_string(),
                index: index.name.to_string(),
            });
        }
        self.check_columns(&index.columns, || format!("Index '{}'", index.name))
    }

    fn check_columns(
        &self,
        columns: &[Identifier],
        constraint: impl Fn() -> String,
    ) -> Result<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(SchemaError::UnknownColumn {
                table: self.name.to_string(),
                constraint: constraint(),
                column: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn generated_name(&self, prefix: &str, columns: &[Identifier]) -> String {
        let parts: Vec<&str> = std::iter::once(self.name.name())
            .chain(columns.iter().map(Identifier::name))
            .collect();
        generate_identifier_name(prefix, &parts)
    }

    // ========================================================================
    // Foreign keys
    // ========================================================================

    /// Adds a foreign key. A missing name is generated, and an index over
    /// the local columns is added unless one already leads with them.
    ///
    /// # Errors
    ///
    /// Mismatched column lists or an unknown local column.
    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKeyConstraint) -> Result<&mut Self> {
        foreign_key.validate(&self.name)?;
        self.check_columns(&foreign_key.local_columns, || {
            format!("Foreign key '{}'", foreign_key.name)
        })?;
        if foreign_key.name.is_empty() {
            foreign_key.name =
                Identifier::unquoted(self.generated_name("FK", &foreign_key.local_columns));
        }

        let covered = self
            .primary_key
            .iter()
            .chain(self.indexes.values())
            .any(|index| index.spans_columns(&foreign_key.local_columns));
        if !covered {
            let name = self.generated_name("IDX", &foreign_key.local_columns);
            let index = Index {
                name: Identifier::unquoted(name),
                columns: foreign_key.local_columns.clone(),
                unique: false,
                primary: false,
                condition: None,
            };
            let key = index.name.key();
            self.indexes.insert(key.clone(), index);
            self.implicit_indexes.insert(key);
        }

        self.foreign_keys.push(foreign_key);
        Ok(self)
    }

    /// Foreign keys in insertion order.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKeyConstraint] {
        &self.foreign_keys
    }

    /// Looks a foreign key up by name.
    #[must_use]
    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKeyConstraint> {
        let name = Identifier::new(name);
        self.foreign_keys.iter().find(|fk| fk.name.matches(&name))
    }

    /// Removes a foreign key by name. Its implicit index stays.
    pub fn remove_foreign_key(&mut self, name: &str) -> Option<ForeignKeyConstraint> {
        let name = Identifier::new(name);
        let position = self.foreign_keys.iter().position(|fk| fk.name.matches(&name))?;
        Some(self.foreign_keys.remove(position))
    }

    // ========================================================================
    // Comment and validation
    // ========================================================================

    /// Sets or clears the table comment.
    pub fn set_comment(&mut self, comment: Option<String>) -> &mut Self {
        self.comment = comment;
        self
    }

    /// The table comment, with an empty comment treated as none.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    /// Re-checks every invariant. Generation calls this first.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "Table" });
        }
        for column in self.columns.values() {
            column.validate()?;
        }
        for index in self.primary_key.iter().chain(self.indexes.values()) {
            self.check_index_columns(index)?;
        }
        for fk in &self.foreign_keys {
            fk.validate(&self.name)?;
            self.check_columns(&fk.local_columns, || format!("Foreign key '{}'", fk.name))?;
        }
        Ok(())
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Flat, serde-friendly shape of a [`Table`]. Deserialization replays it
/// through the validating builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableDef {
    name: Identifier,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    primary_key: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    foreign_keys: Vec<ForeignKeyConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl TryFrom<TableDef> for Table {
    type Error = SchemaError;

    fn try_from(def: TableDef) -> Result<Self> {
        let mut table = Self::new(def.name);
        for column in def.columns {
            table.add_column(column)?;
        }
        if !def.primary_key.is_empty() {
            let mut index = Index::primary_key(&[]);
            index.columns = def.primary_key;
            table.apply_primary_key(index)?;
        }
        for index in def.indexes {
            table.add_index_definition(index)?;
        }
        for fk in def.foreign_keys {
            table.add_foreign_key(fk)?;
        }
        table.comment = def.comment;
        Ok(table)
    }
}

impl From<Table> for TableDef {
    fn from(table: Table) -> Self {
        Self {
            name: table.name,
            columns: table.columns.into_values().collect(),
            primary_key: table.primary_key.map(|pk| pk.columns).unwrap_or_default(),
            indexes: table.indexes.into_values().collect(),
            foreign_keys: table.foreign_keys,
            comment: table.comment,
        }
    }
}
