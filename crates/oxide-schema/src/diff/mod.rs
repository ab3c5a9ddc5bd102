//! Schema differencing.
//!
//! A [`Comparator`] compares two snapshots and produces a [`TableDiff`] or
//! a [`SchemaDiff`]. Diffs are plain data: rendering them is the job of a
//! [`Platform`], which orders the statements so every prefix of the script
//! leaves a consistent schema.

mod comparator;

pub use comparator::Comparator;

use tracing::debug;

use crate::error::Result;
use crate::identifier::Identifier;
use crate::platform::{CreateFlags, Platform};
use crate::schema::{Column, ForeignKeyConstraint, Index, Sequence, Table};

// ============================================================================
// Column changes
// ============================================================================

/// A column attribute that can differ between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnProperty {
    /// Abstract type.
    Type,
    /// Declared length.
    Length,
    /// Fixed or variable length.
    Fixed,
    /// Decimal precision.
    Precision,
    /// Decimal scale.
    Scale,
    /// `NULL` / `NOT NULL`.
    Nullable,
    /// Default value.
    Default,
    /// Autoincrement flag.
    Autoincrement,
    /// Column comment.
    Comment,
}

impl ColumnProperty {
    /// Properties that only affect the rendered type declaration.
    pub const TYPE_PROPERTIES: [Self; 5] = [
        Self::Type,
        Self::Length,
        Self::Fixed,
        Self::Precision,
        Self::Scale,
    ];

    /// Whether the property belongs to the type declaration.
    #[must_use]
    pub fn is_type_property(self) -> bool {
        Self::TYPE_PROPERTIES.contains(&self)
    }
}

/// A column present in both snapshots with differing attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDiff {
    /// Column as it was.
    pub old: Column,
    /// Column as it should be.
    pub new: Column,
    /// What changed, never empty.
    pub changed_properties: Vec<ColumnProperty>,
}

impl ColumnDiff {
    /// Whether the given property changed.
    #[must_use]
    pub fn has_changed(&self, property: ColumnProperty) -> bool {
        self.changed_properties.contains(&property)
    }

    /// Whether anything besides the comment changed.
    #[must_use]
    pub fn has_structural_change(&self) -> bool {
        self.changed_properties
            .iter()
            .any(|p| *p != ColumnProperty::Comment)
    }

    /// Whether the column declaration changed. Autoincrement and comment
    /// changes are realized by separate statements.
    #[must_use]
    pub fn has_definition_change(&self) -> bool {
        self.changed_properties
            .iter()
            .any(|p| !matches!(p, ColumnProperty::Comment | ColumnProperty::Autoincrement))
    }

    /// Whether the comment changed.
    #[must_use]
    pub fn has_comment_change(&self) -> bool {
        self.has_changed(ColumnProperty::Comment)
    }
}

/// A column whose only difference is its name.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedColumn {
    /// Name in the old snapshot.
    pub old: Identifier,
    /// The column under its new name.
    pub new: Column,
}

// ============================================================================
// Constraint changes
// ============================================================================

/// An index whose only difference is its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedIndex {
    /// Name in the old snapshot.
    pub old: Identifier,
    /// The index under its new name.
    pub new: Index,
}

/// A foreign key whose only difference is its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedForeignKey {
    /// Name in the old snapshot.
    pub old: Identifier,
    /// The constraint under its new name.
    pub new: ForeignKeyConstraint,
}

/// Primary key replacement. Either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyChange {
    /// Key to drop.
    pub old: Option<Index>,
    /// Key to add.
    pub new: Option<Index>,
}

// ============================================================================
// TableDiff
// ============================================================================

/// Everything that differs between two snapshots of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    /// Table name in the old snapshot. All statements target it; a rename
    /// comes last.
    pub name: Identifier,
    /// New table name, if renamed.
    pub new_name: Option<Identifier>,

    /// Columns only in the new snapshot.
    pub added_columns: Vec<Column>,
    /// Columns present in both snapshots with different properties.
    pub changed_columns: Vec<ColumnDiff>,
    /// Columns that changed name and nothing else.
    pub renamed_columns: Vec<RenamedColumn>,
    /// Columns only in the old snapshot.
    pub removed_columns: Vec<Column>,

    /// Indexes only in the new snapshot.
    pub added_indexes: Vec<Index>,
    /// New definitions of indexes that kept their name.
    pub changed_indexes: Vec<Index>,
    /// Indexes only in the old snapshot.
    pub removed_indexes: Vec<Index>,
    /// Indexes that changed name and nothing else.
    pub renamed_indexes: Vec<RenamedIndex>,

    /// Constraints only in the new snapshot.
    pub added_foreign_keys: Vec<ForeignKeyConstraint>,
    /// New definitions of constraints that kept their name.
    pub changed_foreign_keys: Vec<ForeignKeyConstraint>,
    /// Constraints only in the old snapshot.
    pub removed_foreign_keys: Vec<ForeignKeyConstraint>,
    /// Constraints that changed name and nothing else.
    pub renamed_foreign_keys: Vec<RenamedForeignKey>,

    /// Primary key to drop and/or add.
    pub primary_key: Option<PrimaryKeyChange>,
    /// `Some(None)` clears the comment.
    pub new_comment: Option<Option<String>>,
}

impl TableDiff {
    /// An empty diff for the given table.
    #[must_use]
    pub const fn new(name: Identifier) -> Self {
        Self {
            name,
            new_name: None,
            added_columns: Vec::new(),
            changed_columns: Vec::new(),
            renamed_columns: Vec::new(),
            removed_columns: Vec::new(),
            added_indexes: Vec::new(),
            changed_indexes: Vec::new(),
            removed_indexes: Vec::new(),
            renamed_indexes: Vec::new(),
            added_foreign_keys: Vec::new(),
            changed_foreign_keys: Vec::new(),
            removed_foreign_keys: Vec::new(),
            renamed_foreign_keys: Vec::new(),
            primary_key: None,
            new_comment: None,
        }
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_name.is_none()
            && self.added_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.changed_indexes.is_empty()
            && self.removed_indexes.is_empty()
            && self.renamed_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.changed_foreign_keys.is_empty()
            && self.removed_foreign_keys.is_empty()
            && self.renamed_foreign_keys.is_empty()
            && self.primary_key.is_none()
            && self.new_comment.is_none()
    }
}

// ============================================================================
// SchemaDiff
// ============================================================================

/// A foreign key of a surviving table that points at a dropped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedForeignKey {
    /// Table owning the constraint.
    pub table: Identifier,
    /// The constraint to drop.
    pub foreign_key: ForeignKeyConstraint,
}

/// Differences between two schemas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDiff {
    /// Tables only in the target schema.
    pub new_tables: Vec<Table>,
    /// Tables present in both schemas that differ.
    pub changed_tables: Vec<TableDiff>,
    /// Tables only in the current schema.
    pub removed_tables: Vec<Table>,
    /// Sequences only in the target schema.
    pub new_sequences: Vec<Sequence>,
    /// New definitions of sequences whose increment or cache changed.
    pub changed_sequences: Vec<Sequence>,
    /// Sequences only in the current schema.
    pub removed_sequences: Vec<Sequence>,
    /// Dropped before anything else so the referenced tables can go.
    pub orphaned_foreign_keys: Vec<OrphanedForeignKey>,
}

impl SchemaDiff {
    /// Whether the schemas are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_tables.is_empty()
            && self.changed_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.new_sequences.is_empty()
            && self.changed_sequences.is_empty()
            && self.removed_sequences.is_empty()
            && self.orphaned_foreign_keys.is_empty()
    }

    /// Migration script.
    ///
    /// Orphaned foreign keys are dropped first, then sequences change, new
    /// tables are created with their foreign keys added once every table
    /// exists, removed tables are dropped, and finally existing tables are
    /// altered.
    ///
    /// Dialects that cannot alter foreign keys skip the orphan drops: the
    /// constraint goes away with the referenced table. Dropping a foreign
    /// key through [`Platform::alter_table_sql`] on those dialects still
    /// fails.
    ///
    /// # Errors
    ///
    /// The first statement the platform cannot express.
    pub fn to_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        let alterable = platform.capabilities().supports_foreign_key_alteration;
        let mut sql = Vec::new();

        if alterable {
            for orphan in &self.orphaned_foreign_keys {
                sql.push(platform.drop_foreign_key_sql(&orphan.foreign_key, &orphan.table)?);
            }
        } else if !self.orphaned_foreign_keys.is_empty() {
            debug!(
                platform = platform.name(),
                skipped = self.orphaned_foreign_keys.len(),
                "orphaned foreign keys left to the dropped tables"
            );
        }

        for sequence in &self.changed_sequences {
            sql.push(platform.alter_sequence_sql(sequence)?);
        }
        for sequence in &self.removed_sequences {
            sql.push(platform.drop_sequence_sql(sequence)?);
        }
        for sequence in &self.new_sequences {
            sql.push(platform.create_sequence_sql(sequence)?);
        }

        let flags = CreateFlags {
            indexes: true,
            foreign_keys: !alterable,
        };
        for table in &self.new_tables {
            sql.extend(platform.create_table_sql_with(table, flags)?);
        }
        if alterable {
            for table in &self.new_tables {
                for fk in table.foreign_keys() {
                    sql.push(platform.create_foreign_key_sql(fk, table.name())?);
                }
            }
        }

        for table in &self.removed_tables {
            sql.push(platform.drop_table_sql(&table.name().to_string()));
        }
        for diff in &self.changed_tables {
            sql.extend(platform.alter_table_sql(diff)?);
        }

        debug!(
            platform = platform.name(),
            new_tables = self.new_tables.len(),
            changed_tables = self.changed_tables.len(),
            removed_tables = self.removed_tables.len(),
            statements = sql.len(),
            "generated migration script"
        );
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn change(properties: &[ColumnProperty]) -> ColumnDiff {
        ColumnDiff {
            old: Column::new("a", ColumnType::Integer),
            new: Column::new("a", ColumnType::Integer),
            changed_properties: properties.to_vec(),
        }
    }

    #[test]
    fn test_column_diff_classification() {
        let comment = change(&[ColumnProperty::Comment]);
        assert!(comment.has_comment_change());
        assert!(!comment.has_structural_change());
        assert!(!comment.has_definition_change());

        let autoincrement = change(&[ColumnProperty::Autoincrement]);
        assert!(autoincrement.has_structural_change());
        assert!(!autoincrement.has_definition_change());

        let nullable = change(&[ColumnProperty::Nullable, ColumnProperty::Comment]);
        assert!(nullable.has_definition_change());
        assert!(nullable.has_changed(ColumnProperty::Nullable));
        assert!(!nullable.has_changed(ColumnProperty::Default));
    }

    #[test]
    fn test_type_properties() {
        assert!(ColumnProperty::Length.is_type_property());
        assert!(!ColumnProperty::Default.is_type_property());
    }

    #[test]
    fn test_empty_diffs() {
        assert!(TableDiff::new(Identifier::new("t")).is_empty());
        assert!(SchemaDiff::default().is_empty());

        let mut diff = TableDiff::new(Identifier::new("t"));
        diff.new_comment = Some(None);
        assert!(!diff.is_empty());
    }
}
