//! Snapshot comparison.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::Result;
use crate::identifier::Identifier;
use crate::platform::{IdentifierCase, Platform};
use crate::schema::{Column, ForeignKeyConstraint, Index, Schema, Table};

use super::{
    ColumnDiff, ColumnProperty, OrphanedForeignKey, PrimaryKeyChange, RenamedColumn,
    RenamedForeignKey, RenamedIndex, SchemaDiff, TableDiff,
};

/// Compares schema snapshots as seen by one platform.
///
/// Type changes are judged by the declaration the platform would render,
/// so changes the dialect cannot express (such as fixed versus variable
/// binary on Oracle) are not reported.
pub struct Comparator<'a> {
    platform: &'a dyn Platform,
    detect_renamed_columns: bool,
    detect_renamed_indexes: bool,
}

impl<'a> Comparator<'a> {
    /// Creates a comparator with rename detection enabled.
    #[must_use]
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            detect_renamed_columns: true,
            detect_renamed_indexes: true,
        }
    }

    /// Treat an unambiguous removed/added column pair as a rename.
    #[must_use]
    pub fn detect_renamed_columns(mut self, enabled: bool) -> Self {
        self.detect_renamed_columns = enabled;
        self
    }

    /// Treat a removed/added index pair with the same definition as a
    /// rename.
    #[must_use]
    pub fn detect_renamed_indexes(mut self, enabled: bool) -> Self {
        self.detect_renamed_indexes = enabled;
        self
    }

    /// The name the platform stores: quoted names verbatim, bare names
    /// folded. Dialects without folding compare bare names
    /// case-insensitively.
    fn stored_name(&self, identifier: &Identifier) -> String {
        let normalized = self.platform.normalize_identifier(identifier);
        if normalized.is_quoted()
            || self.platform.capabilities().identifier_case != IdentifierCase::Unchanged
        {
            normalized.name().to_string()
        } else {
            normalized.key()
        }
    }

    fn same_name(&self, a: &Identifier, b: &Identifier) -> bool {
        self.stored_name(a) == self.stored_name(b)
    }

    // ========================================================================
    // Schemas
    // ========================================================================

    /// Compares two schemas.
    ///
    /// # Errors
    ///
    /// A column type the platform cannot render.
    pub fn compare_schemas(&self, from: &Schema, to: &Schema) -> Result<SchemaDiff> {
        let mut diff = SchemaDiff::default();

        for table in to.tables() {
            match from.table(table.name().name()) {
                Some(old) => {
                    if let Some(table_diff) = self.diff_table(old, table)? {
                        diff.changed_tables.push(table_diff);
                    }
                }
                None => diff.new_tables.push(table.clone()),
            }
        }
        for table in from.tables() {
            if to.table(table.name().name()).is_none() {
                diff.removed_tables.push(table.clone());
            }
        }

        for removed in &diff.removed_tables {
            for table in from.tables() {
                if to.table(table.name().name()).is_none() {
                    continue;
                }
                for fk in table.foreign_keys().iter().filter(|fk| fk.references(removed.name())) {
                    // The orphan drop replaces the table-level one.
                    if let Some(table_diff) = diff
                        .changed_tables
                        .iter_mut()
                        .find(|d| d.name.matches(table.name()))
                    {
                        table_diff
                            .removed_foreign_keys
                            .retain(|removed_fk| !removed_fk.name.matches(&fk.name));
                    }
                    diff.orphaned_foreign_keys.push(OrphanedForeignKey {
                        table: table.name().clone(),
                        foreign_key: fk.clone(),
                    });
                }
            }
        }
        diff.changed_tables.retain(|d| !d.is_empty());

        for sequence in to.sequences() {
            match from.sequence(sequence.name.name()) {
                Some(old) if old.differs_from(sequence) => {
                    diff.changed_sequences.push(sequence.clone());
                }
                Some(_) => {}
                None => diff.new_sequences.push(sequence.clone()),
            }
        }
        for sequence in from.sequences() {
            if to.sequence(sequence.name.name()).is_none() {
                diff.removed_sequences.push(sequence.clone());
            }
        }

        debug!(
            platform = self.platform.name(),
            new_tables = diff.new_tables.len(),
            changed_tables = diff.changed_tables.len(),
            removed_tables = diff.removed_tables.len(),
            orphaned_foreign_keys = diff.orphaned_foreign_keys.len(),
            "compared schemas"
        );
        Ok(diff)
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Compares two snapshots of a table. Returns `None` when they are
    /// equivalent.
    ///
    /// # Errors
    ///
    /// A column type the platform cannot render.
    pub fn diff_table(&self, old: &Table, new: &Table) -> Result<Option<TableDiff>> {
        let mut diff = TableDiff::new(old.name().clone());

        self.diff_columns(old, new, &mut diff)?;
        self.diff_indexes(old, new, &mut diff);
        self.diff_foreign_keys(old, new, &mut diff);

        match (old.primary_key(), new.primary_key()) {
            (None, None) => {}
            (Some(a), Some(b)) if a.same_definition(b) => {}
            (a, b) => {
                diff.primary_key = Some(PrimaryKeyChange {
                    old: a.cloned(),
                    new: b.cloned(),
                });
            }
        }

        if !self.same_name(old.name(), new.name()) {
            diff.new_name = Some(new.name().clone());
        }
        if old.comment() != new.comment() {
            diff.new_comment = Some(new.comment().map(String::from));
        }

        if diff.is_empty() {
            trace!(table = %old.name(), "table unchanged");
            return Ok(None);
        }
        debug!(
            table = %old.name(),
            added_columns = diff.added_columns.len(),
            changed_columns = diff.changed_columns.len(),
            removed_columns = diff.removed_columns.len(),
            "table changed"
        );
        Ok(Some(diff))
    }

    /// Properties that differ between two definitions of a column.
    ///
    /// # Errors
    ///
    /// A column type the platform cannot render.
    pub fn diff_column(&self, old: &Column, new: &Column) -> Result<Vec<ColumnProperty>> {
        let mut changed = Vec::new();
        if old.column_type != new.column_type {
            changed.push(ColumnProperty::Type);
        }
        if old.length != new.length {
            changed.push(ColumnProperty::Length);
        }
        if old.fixed != new.fixed {
            changed.push(ColumnProperty::Fixed);
        }
        if old.precision != new.precision {
            changed.push(ColumnProperty::Precision);
        }
        if old.scale != new.scale {
            changed.push(ColumnProperty::Scale);
        }
        if old.nullable != new.nullable {
            changed.push(ColumnProperty::Nullable);
        }
        if old.default != new.default {
            changed.push(ColumnProperty::Default);
        }
        if old.autoincrement != new.autoincrement {
            changed.push(ColumnProperty::Autoincrement);
        }
        if old.comment_text() != new.comment_text() {
            changed.push(ColumnProperty::Comment);
        }

        if changed.iter().any(|p| p.is_type_property()) && self.same_declaration(old, new)? {
            trace!(column = %new.name, "type change renders the same declaration");
            changed.retain(|p| !p.is_type_property());
        }
        Ok(changed)
    }

    fn same_declaration(&self, old: &Column, new: &Column) -> Result<bool> {
        // Identity spellings are compared as the underlying storage type.
        let storage = |column: &Column| column.clone().autoincrement(false);
        Ok(self.platform.type_declaration_sql(&storage(old))?
            == self.platform.type_declaration_sql(&storage(new))?)
    }

    fn diff_columns(&self, old: &Table, new: &Table, diff: &mut TableDiff) -> Result<()> {
        let mut removed = Vec::new();
        for column in old.columns() {
            let Some(target) = new
                .column(column.name.name())
                .filter(|target| self.same_name(&column.name, &target.name))
            else {
                removed.push(column.clone());
                continue;
            };
            let changed_properties = self.diff_column(column, target)?;
            trace!(column = %column.name, changes = ?changed_properties, "compared column");
            if !changed_properties.is_empty() {
                diff.changed_columns.push(ColumnDiff {
                    old: column.clone(),
                    new: target.clone(),
                    changed_properties,
                });
            }
        }
        let mut added: Vec<Column> = new
            .columns()
            .filter(|c| {
                !old.column(c.name.name())
                    .is_some_and(|existing| self.same_name(&existing.name, &c.name))
            })
            .cloned()
            .collect();

        if self.detect_renamed_columns {
            self.detect_column_renames(&mut removed, &mut added, diff)?;
        }
        diff.removed_columns = removed;
        diff.added_columns = added;
        Ok(())
    }

    /// Pairs removed and added columns that differ only by name. A pair
    /// counts only when neither side has another candidate.
    fn detect_column_renames(
        &self,
        removed: &mut Vec<Column>,
        added: &mut Vec<Column>,
        diff: &mut TableDiff,
    ) -> Result<()> {
        let mut candidates = Vec::new();
        for (r, old) in removed.iter().enumerate() {
            for (a, new) in added.iter().enumerate() {
                let mut renamed = old.clone();
                renamed.name = new.name.clone();
                if self.diff_column(&renamed, new)?.is_empty() {
                    candidates.push((r, a));
                }
            }
        }

        let mut pairs: Vec<(usize, usize)> = candidates
            .iter()
            .copied()
            .filter(|&(r, a)| {
                candidates.iter().filter(|c| c.0 == r).count() == 1
                    && candidates.iter().filter(|c| c.1 == a).count() == 1
            })
            .collect();
        pairs.sort_unstable_by_key(|&(_, a)| a);

        for &(r, a) in &pairs {
            trace!(from = %removed[r].name, to = %added[a].name, "column renamed");
            diff.renamed_columns.push(RenamedColumn {
                old: removed[r].name.clone(),
                new: added[a].clone(),
            });
        }
        let paired_removed: HashSet<usize> = pairs.iter().map(|p| p.0).collect();
        let paired_added: HashSet<usize> = pairs.iter().map(|p| p.1).collect();
        let mut index = 0;
        removed.retain(|_| {
            index += 1;
            !paired_removed.contains(&(index - 1))
        });
        let mut index = 0;
        added.retain(|_| {
            index += 1;
            !paired_added.contains(&(index - 1))
        });
        Ok(())
    }

    fn diff_indexes(&self, old: &Table, new: &Table, diff: &mut TableDiff) {
        let mut leftover_old: Vec<&Index> = Vec::new();
        for index in old.indexes() {
            let twin = new
                .index(index.name.name())
                .filter(|target| self.same_name(&index.name, &target.name));
            match twin {
                Some(target) if target.same_definition(index) => {}
                Some(target) => diff.changed_indexes.push(target.clone()),
                None => leftover_old.push(index),
            }
        }
        let mut leftover_new: Vec<&Index> = new
            .indexes()
            .filter(|index| {
                !old.index(index.name.name())
                    .is_some_and(|existing| self.same_name(&existing.name, &index.name))
            })
            .collect();

        for index in leftover_old {
            let twin = leftover_new
                .iter()
                .position(|candidate| candidate.same_definition(index));
            match twin {
                Some(position) if self.detect_renamed_indexes => {
                    let target = leftover_new.remove(position);
                    if self.platform.capabilities().supports_rename_index {
                        diff.renamed_indexes.push(RenamedIndex {
                            old: index.name.clone(),
                            new: target.clone(),
                        });
                    } else {
                        trace!(from = %index.name, to = %target.name, "index rename ignored");
                    }
                }
                _ => diff.removed_indexes.push(index.clone()),
            }
        }
        diff.added_indexes = leftover_new.into_iter().cloned().collect();
    }

    fn diff_foreign_keys(&self, old: &Table, new: &Table, diff: &mut TableDiff) {
        let mut unmatched_new: Vec<&ForeignKeyConstraint> = new.foreign_keys().iter().collect();
        let mut leftover_old = Vec::new();

        for fk in old.foreign_keys() {
            let Some(position) = unmatched_new.iter().position(|c| c.same_definition(fk)) else {
                leftover_old.push(fk);
                continue;
            };
            let target = unmatched_new.remove(position);
            if self.same_name(&target.name, &fk.name) {
                continue;
            }
            if self.platform.capabilities().supports_rename_constraint {
                diff.renamed_foreign_keys.push(RenamedForeignKey {
                    old: fk.name.clone(),
                    new: target.clone(),
                });
            } else {
                trace!(from = %fk.name, to = %target.name, "constraint rename ignored");
            }
        }

        for fk in leftover_old {
            match unmatched_new.iter().position(|c| self.same_name(&c.name, &fk.name)) {
                Some(position) => {
                    diff.changed_foreign_keys.push(unmatched_new.remove(position).clone());
                }
                None => diff.removed_foreign_keys.push(fk.clone()),
            }
        }
        diff.added_foreign_keys = unmatched_new.into_iter().cloned().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OraclePlatform, PostgresPlatform, SqlitePlatform};
    use crate::schema::DefaultValue;
    use crate::types::ColumnType;

    fn users() -> Table {
        let mut table = Table::new("users");
        table
            .add_column(Column::new("id", ColumnType::Integer))
            .unwrap()
            .add_column(Column::new("email", ColumnType::String).length(255))
            .unwrap()
            .set_primary_key(&["id"])
            .unwrap()
            .add_index(&["email"], Some("idx_email"))
            .unwrap();
        table
    }

    #[test]
    fn test_identical_tables() {
        let platform = PostgresPlatform::new();
        let comparator = Comparator::new(&platform);
        assert_eq!(comparator.diff_table(&users(), &users()).unwrap(), None);
    }

    #[test]
    fn test_changed_column_properties() {
        let platform = PostgresPlatform::new();
        let mut new = users();
        *new.column_mut("email").unwrap() = Column::new("email", ColumnType::String)
            .length(100)
            .nullable()
            .default(DefaultValue::String("x".into()));
        let diff = Comparator::new(&platform).diff_table(&users(), &new).unwrap().unwrap();
        assert_eq!(diff.changed_columns.len(), 1);
        assert_eq!(
            diff.changed_columns[0].changed_properties,
            vec![ColumnProperty::Length, ColumnProperty::Nullable, ColumnProperty::Default]
        );
    }

    #[test]
    fn test_unrendered_type_change_is_ignored() {
        let platform = OraclePlatform::new();
        let old = Column::new("data", ColumnType::Binary).length(16);
        let new = old.clone().fixed(true);
        let comparator = Comparator::new(&platform);
        assert!(comparator.diff_column(&old, &new).unwrap().is_empty());

        let sqlite = SqlitePlatform::new();
        let old = Column::new("s", ColumnType::String).length(10);
        let new = Column::new("s", ColumnType::String).length(20);
        assert_eq!(
            Comparator::new(&sqlite).diff_column(&old, &new).unwrap(),
            vec![ColumnProperty::Length]
        );
    }

    #[test]
    fn test_empty_comment_equals_none() {
        let platform = PostgresPlatform::new();
        let old = Column::new("a", ColumnType::Integer);
        let new = old.clone().comment("");
        assert!(Comparator::new(&platform).diff_column(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn test_unambiguous_rename() {
        let platform = PostgresPlatform::new();
        let mut new = users();
        new.remove_column("email");
        new.add_column(Column::new("mail", ColumnType::String).length(255))
            .unwrap();
        let mut old = users();
        old.remove_index("idx_email");
        new.remove_index("idx_email");

        let diff = Comparator::new(&platform).diff_table(&old, &new).unwrap().unwrap();
        assert_eq!(diff.renamed_columns.len(), 1);
        assert_eq!(diff.renamed_columns[0].old.name(), "email");
        assert_eq!(diff.renamed_columns[0].new.name.name(), "mail");
        assert!(diff.added_columns.is_empty());
        assert!(diff.removed_columns.is_empty());

        let diff = Comparator::new(&platform)
            .detect_renamed_columns(false)
            .diff_table(&old, &new)
            .unwrap()
            .unwrap();
        assert!(diff.renamed_columns.is_empty());
        assert_eq!(diff.added_columns.len(), 1);
        assert_eq!(diff.removed_columns.len(), 1);
    }

    #[test]
    fn test_ambiguous_rename_is_add_and_drop() {
        let platform = PostgresPlatform::new();
        let mut old = Table::new("t");
        old.add_column(Column::new("a", ColumnType::Integer)).unwrap();
        let mut new = Table::new("t");
        new.add_column(Column::new("b", ColumnType::Integer))
            .unwrap()
            .add_column(Column::new("c", ColumnType::Integer))
            .unwrap();
        let diff = Comparator::new(&platform).diff_table(&old, &new).unwrap().unwrap();
        assert!(diff.renamed_columns.is_empty());
        assert_eq!(diff.added_columns.len(), 2);
        assert_eq!(diff.removed_columns.len(), 1);
    }

    #[test]
    fn test_index_rename_follows_capability() {
        let mut new = users();
        new.rename_index("idx_email", "idx_users_email").unwrap();

        let postgres = PostgresPlatform::new();
        let diff = Comparator::new(&postgres).diff_table(&users(), &new).unwrap().unwrap();
        assert_eq!(diff.renamed_indexes.len(), 1);
        assert_eq!(diff.renamed_indexes[0].old.name(), "idx_email");

        let sqlite = SqlitePlatform::new();
        assert_eq!(Comparator::new(&sqlite).diff_table(&users(), &new).unwrap(), None);

        let diff = Comparator::new(&postgres)
            .detect_renamed_indexes(false)
            .diff_table(&users(), &new)
            .unwrap()
            .unwrap();
        assert_eq!(diff.removed_indexes.len(), 1);
        assert_eq!(diff.added_indexes.len(), 1);
    }

    #[test]
    fn test_changed_index_keeps_name() {
        let platform = PostgresPlatform::new();
        let mut new = users();
        new.remove_index("idx_email");
        new.add_unique_index(&["email"], Some("idx_email")).unwrap();
        let diff = Comparator::new(&platform).diff_table(&users(), &new).unwrap().unwrap();
        assert_eq!(diff.changed_indexes.len(), 1);
        assert!(diff.changed_indexes[0].unique);
    }

    #[test]
    fn test_foreign_keys_matched_by_structure() {
        let platform = PostgresPlatform::new();
        let with_fk = |name: &str| {
            let mut table = Table::new("posts");
            table
                .add_column(Column::new("user_id", ColumnType::Integer))
                .unwrap()
                .add_foreign_key(
                    ForeignKeyConstraint::new(&["user_id"], "users", &["id"]).named(name),
                )
                .unwrap();
            table
        };

        let diff = Comparator::new(&platform)
            .diff_table(&with_fk("fk_a"), &with_fk("fk_b"))
            .unwrap()
            .unwrap();
        assert_eq!(diff.renamed_foreign_keys.len(), 1);
        assert_eq!(diff.renamed_foreign_keys[0].old.name(), "fk_a");
        assert!(diff.added_foreign_keys.is_empty());

        let sqlite = SqlitePlatform::new();
        assert_eq!(
            Comparator::new(&sqlite).diff_table(&with_fk("fk_a"), &with_fk("fk_b")).unwrap(),
            None
        );
    }

    #[test]
    fn test_primary_key_and_comment_changes() {
        let platform = PostgresPlatform::new();
        let mut new = users();
        new.drop_primary_key();
        new.set_comment(Some("people".into()));
        let diff = Comparator::new(&platform).diff_table(&users(), &new).unwrap().unwrap();
        let change = diff.primary_key.unwrap();
        assert!(change.old.is_some());
        assert!(change.new.is_none());
        assert_eq!(diff.new_comment, Some(Some("people".into())));
    }

    #[test]
    fn test_table_rename_ignores_case() {
        let platform = PostgresPlatform::new();
        let mut upper = Table::new("USERS");
        let mut lower = Table::new("users");
        for table in [&mut upper, &mut lower] {
            table.add_column(Column::new("id", ColumnType::Integer)).unwrap();
        }
        assert_eq!(Comparator::new(&platform).diff_table(&lower, &upper).unwrap(), None);
    }

    fn single_column(table: &str, column: &str) -> Table {
        let mut t = Table::new(table);
        t.add_column(Column::new(column, ColumnType::Integer)).unwrap();
        t
    }

    #[test]
    fn test_quoted_names_compare_case_sensitively() {
        let platform = OraclePlatform::new();
        let comparator = Comparator::new(&platform);

        let diff = comparator
            .diff_table(&single_column("\"Foo\"", "id"), &single_column("\"FOO\"", "id"))
            .unwrap()
            .unwrap();
        assert_eq!(diff.new_name, Some(Identifier::new("\"FOO\"")));
        assert_eq!(
            platform.alter_table_sql(&diff).unwrap(),
            vec!["ALTER TABLE \"Foo\" RENAME TO \"FOO\""]
        );

        let diff = comparator
            .diff_table(&single_column("t", "\"Id\""), &single_column("t", "\"ID\""))
            .unwrap()
            .unwrap();
        assert!(diff.added_columns.is_empty());
        assert!(diff.removed_columns.is_empty());
        assert_eq!(diff.renamed_columns.len(), 1);
        assert_eq!(diff.renamed_columns[0].old, Identifier::new("\"Id\""));
        assert_eq!(
            platform.alter_table_sql(&diff).unwrap(),
            vec!["ALTER TABLE t RENAME COLUMN \"Id\" TO \"ID\""]
        );
    }

    #[test]
    fn test_bare_names_are_folded_before_comparison() {
        // Oracle stores a bare `users` as USERS.
        let oracle = OraclePlatform::new();
        let diff = Comparator::new(&oracle)
            .diff_table(&single_column("users", "id"), &single_column("\"users\"", "id"))
            .unwrap()
            .unwrap();
        assert_eq!(diff.new_name, Some(Identifier::new("\"users\"")));
        assert_eq!(
            Comparator::new(&oracle)
                .diff_table(&single_column("users", "id"), &single_column("\"USERS\"", "id"))
                .unwrap(),
            None
        );

        // PostgreSQL folds to lower case, SQLite compares bare names
        // without regard to case.
        let postgres = PostgresPlatform::new();
        assert_eq!(
            Comparator::new(&postgres)
                .diff_table(&single_column("users", "id"), &single_column("\"users\"", "id"))
                .unwrap(),
            None
        );
        let sqlite = SqlitePlatform::new();
        assert_eq!(
            Comparator::new(&sqlite)
                .diff_table(&single_column("Users", "ID"), &single_column("users", "id"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_quoted_index_case_change_is_a_rename() {
        let platform = OraclePlatform::new();
        let build = |name: &str| {
            let mut t = single_column("t", "a");
            t.add_index(&["a"], Some(name)).unwrap();
            t
        };
        let diff = Comparator::new(&platform)
            .diff_table(&build("\"Idx_A\""), &build("\"IDX_A\""))
            .unwrap()
            .unwrap();
        assert!(diff.changed_indexes.is_empty());
        assert_eq!(diff.renamed_indexes.len(), 1);
        assert_eq!(diff.renamed_indexes[0].old, Identifier::new("\"Idx_A\""));
    }
}
