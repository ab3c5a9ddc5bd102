//! Database platforms.
//!
//! A [`Platform`] turns schema objects and diffs into DDL for one dialect.
//! Every dialect is a small struct owning its [`Capabilities`], its
//! [`KeywordList`] and its [`TypeRegistry`], all built in `new()` and never
//! mutated afterwards. Shared behaviour lives in the trait's default
//! methods; dialects override the few statements they spell differently.

mod oracle;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use oracle::OraclePlatform;
pub use postgres::PostgresPlatform;
pub use sqlite::SqlitePlatform;

use crate::diff::{ColumnDiff, TableDiff};
use crate::error::{Result, SchemaError};
use crate::identifier::{Identifier, QUOTE};
use crate::keywords::KeywordList;
use crate::schema::{
    Column, DefaultValue, ForeignKeyConstraint, Index, ReferentialAction, Sequence, Table,
};
use crate::types::TypeRegistry;

// ============================================================================
// Capabilities
// ============================================================================

/// How a dialect folds unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    /// Unquoted names are stored upper-cased.
    Upper,
    /// Unquoted names are stored lower-cased.
    Lower,
    /// Names are stored as written.
    Unchanged,
}

/// Feature flags callers branch on instead of testing the dialect.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `SAVEPOINT` support.
    pub supports_savepoints: bool,
    /// Native autoincrement columns.
    pub supports_identity_columns: bool,
    /// `COMMENT ON TABLE` / `COMMENT ON COLUMN`.
    pub supports_comment_on_statement: bool,
    /// Standalone sequences.
    pub supports_sequences: bool,
    /// Changing a column's type, default or nullability in place.
    pub supports_alter_column: bool,
    /// Adding and dropping foreign keys after table creation. Without it,
    /// foreign keys are declared inside `CREATE TABLE`.
    pub supports_foreign_key_alteration: bool,
    /// `ALTER INDEX .. RENAME TO ..`.
    pub supports_rename_index: bool,
    /// `ALTER TABLE .. RENAME CONSTRAINT ..`.
    pub supports_rename_constraint: bool,
    /// Indexes with a `WHERE` predicate.
    pub supports_partial_indexes: bool,
    /// `CREATE DATABASE` / `DROP DATABASE` or an equivalent.
    pub supports_create_drop_database: bool,
    /// Case folding of unquoted identifiers.
    pub identifier_case: IdentifierCase,
    /// Longest identifier the engine accepts.
    pub max_identifier_length: usize,
}

/// Which parts of a table [`Platform::create_table_sql_with`] emits
/// besides the `CREATE TABLE` statement itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFlags {
    /// Emit `CREATE INDEX` for secondary indexes.
    pub indexes: bool,
    /// Emit foreign keys, inline or as `ALTER TABLE` depending on the
    /// dialect.
    pub foreign_keys: bool,
}

impl Default for CreateFlags {
    fn default() -> Self {
        Self {
            indexes: true,
            foreign_keys: true,
        }
    }
}

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionIsolationLevel {
    /// Dirty reads allowed.
    ReadUncommitted,
    /// Only committed data is read.
    ReadCommitted,
    /// Rows read once read the same again.
    RepeatableRead,
    /// Full serializability.
    Serializable,
}

impl TransactionIsolationLevel {
    /// SQL spelling.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Whether `part` is a valid bare identifier given per-position character
/// classes.
pub(crate) fn is_bare_with(part: &str, first: fn(char) -> bool, rest: fn(char) -> bool) -> bool {
    let mut chars = part.chars();
    chars.next().is_some_and(first) && chars.all(rest)
}

// ============================================================================
// Platform trait
// ============================================================================

/// DDL generation strategy for one dialect.
///
/// Every generation method is deterministic and returns either a complete
/// statement list or an error; statements carry no terminator.
pub trait Platform: Send + Sync {
    /// Dialect name, used in error messages.
    fn name(&self) -> &'static str;

    /// Feature flags.
    fn capabilities(&self) -> &Capabilities;

    /// Reserved words.
    fn keywords(&self) -> &KeywordList;

    /// Column type rules.
    fn type_registry(&self) -> &TypeRegistry;

    /// Whether a single name part can appear unquoted, reserved words
    /// aside.
    fn is_bare_identifier(&self, part: &str) -> bool;

    // ------------------------------------------------------------------------
    // Identifiers and literals
    // ------------------------------------------------------------------------

    /// Quotes a name unconditionally, doubling embedded quotes.
    fn quote_single_identifier(&self, name: &str) -> String {
        let escaped = name.replace(QUOTE, "\"\"");
        format!("{QUOTE}{escaped}{QUOTE}")
    }

    /// Renders an identifier, quoting each dotted part when the caller
    /// quoted it, when it is reserved, or when it is not a bare name.
    fn quote_identifier_of(&self, identifier: &Identifier) -> String {
        identifier
            .parts()
            .map(|part| {
                if identifier.is_quoted()
                    || self.keywords().is_keyword(part)
                    || !self.is_bare_identifier(part)
                {
                    self.quote_single_identifier(part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Parses and renders a name.
    fn quote_identifier(&self, name: &str) -> String {
        self.quote_identifier_of(&Identifier::new(name))
    }

    /// Applies the dialect's case folding to an unquoted identifier.
    fn normalize_identifier(&self, identifier: &Identifier) -> Identifier {
        if identifier.is_quoted() {
            return identifier.clone();
        }
        match self.capabilities().identifier_case {
            IdentifierCase::Upper => Identifier::unquoted(identifier.name().to_uppercase()),
            IdentifierCase::Lower => Identifier::unquoted(identifier.name().to_lowercase()),
            IdentifierCase::Unchanged => identifier.clone(),
        }
    }

    /// Wraps a value in single quotes, doubling embedded ones.
    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a list of column names.
    fn columns_list_sql(&self, columns: &[Identifier]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier_of(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ------------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------------

    /// The column's type declaration.
    ///
    /// # Errors
    ///
    /// Invalid column, missing required length, or a type the dialect
    /// cannot store.
    fn type_declaration_sql(&self, column: &Column) -> Result<String> {
        column.validate()?;
        self.type_registry().declaration(column)
    }

    /// Boolean literal.
    fn convert_boolean(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    /// ` DEFAULT ..` clause, empty when the column has none. A nullable
    /// column without a default gets `DEFAULT NULL`.
    fn default_value_sql(&self, column: &Column) -> String {
        let value = match &column.default {
            None if column.nullable => "NULL".to_string(),
            None => return String::new(),
            Some(DefaultValue::Null) => "NULL".to_string(),
            Some(DefaultValue::Boolean(b)) => self.convert_boolean(*b).to_string(),
            Some(DefaultValue::Integer(i)) => i.to_string(),
            Some(DefaultValue::Float(f)) => f.to_string(),
            Some(DefaultValue::String(s)) => self.quote_string_literal(s),
            Some(DefaultValue::Expression(e)) => e.clone(),
        };
        format!(" DEFAULT {value}")
    }

    /// `name type[ DEFAULT v][ NOT NULL| NULL]`.
    ///
    /// # Errors
    ///
    /// See [`Platform::type_declaration_sql`].
    fn column_declaration_sql(&self, column: &Column) -> Result<String> {
        let null = if column.nullable { " NULL" } else { " NOT NULL" };
        Ok(format!(
            "{} {}{}{null}",
            self.quote_identifier_of(&column.name),
            self.type_declaration_sql(column)?,
            self.default_value_sql(column)
        ))
    }

    // ------------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------------

    /// Every statement needed to create a table.
    ///
    /// # Errors
    ///
    /// The table is invalid or uses a feature the dialect lacks.
    fn create_table_sql(&self, table: &Table) -> Result<Vec<String>> {
        self.create_table_sql_with(table, CreateFlags::default())
    }

    /// Creates a table, emitting only the parts selected by `flags`.
    ///
    /// # Errors
    ///
    /// See [`Platform::create_table_sql`].
    fn create_table_sql_with(&self, table: &Table, flags: CreateFlags) -> Result<Vec<String>> {
        table.validate()?;
        let capabilities = self.capabilities();
        let inline_foreign_keys =
            flags.foreign_keys && !capabilities.supports_foreign_key_alteration;

        let mut definitions = table
            .columns()
            .map(|column| self.column_declaration_sql(column))
            .collect::<Result<Vec<_>>>()?;
        if let Some(primary_key) = table.primary_key() {
            if let Some(clause) = self.primary_key_clause_sql(table, primary_key)? {
                definitions.push(clause);
            }
        }
        if inline_foreign_keys {
            for fk in table.foreign_keys() {
                definitions.push(self.foreign_key_declaration_sql(fk)?);
            }
        }

        let mut sql = vec![format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier_of(table.name()),
            definitions.join(", ")
        )];
        sql.extend(self.autoincrement_sql(table)?);

        if flags.foreign_keys && !inline_foreign_keys {
            for fk in table.foreign_keys() {
                sql.push(self.create_foreign_key_sql(fk, table.name())?);
            }
        }
        if flags.indexes {
            for index in table.indexes() {
                sql.push(self.create_index_sql(index, table.name())?);
            }
        }
        if capabilities.supports_comment_on_statement {
            if let Some(comment) = table.comment() {
                sql.push(self.comment_on_table_sql(table.name(), Some(comment))?);
            }
            for column in table.columns() {
                if let Some(comment) = column.comment_text() {
                    sql.push(self.comment_on_column_sql(
                        table.name(),
                        &column.name,
                        Some(comment),
                    )?);
                }
            }
        }

        debug!(
            platform = self.name(),
            table = %table.name(),
            statements = sql.len(),
            "generated create table script"
        );
        Ok(sql)
    }

    /// `PRIMARY KEY(..)` clause of `CREATE TABLE`, if any.
    ///
    /// # Errors
    ///
    /// The dialect cannot express this primary key.
    fn primary_key_clause_sql(
        &self,
        _table: &Table,
        primary_key: &Index,
    ) -> Result<Option<String>> {
        Ok(Some(format!(
            "PRIMARY KEY({})",
            self.columns_list_sql(&primary_key.columns)
        )))
    }

    /// Statements emulating an autoincrement column after `CREATE TABLE`.
    ///
    /// # Errors
    ///
    /// Generation of an emulation statement failed.
    fn autoincrement_sql(&self, _table: &Table) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Statements tearing down an emulated autoincrement column.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] on dialects with native
    /// identity columns.
    fn drop_autoincrement_sql(&self, _table: &str) -> Result<Vec<String>> {
        Err(SchemaError::unsupported(self.name(), "autoincrement emulation"))
    }

    /// `DROP TABLE name`.
    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table))
    }

    /// `TRUNCATE TABLE name`.
    fn truncate_table_sql(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.quote_identifier(table))
    }

    /// `ALTER TABLE old RENAME TO new`.
    fn rename_table_sql(&self, old: &Identifier, new: &Identifier) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier_of(old),
            self.quote_identifier_of(new)
        )
    }

    // ------------------------------------------------------------------------
    // Indexes
    // ------------------------------------------------------------------------

    /// Creates a secondary index, or adds a primary key to an existing
    /// table.
    ///
    /// # Errors
    ///
    /// Partial index on a dialect without them.
    fn create_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        let table_sql = self.quote_identifier_of(table);
        let columns = self.columns_list_sql(&index.columns);
        if index.primary {
            return Ok(format!("ALTER TABLE {table_sql} ADD PRIMARY KEY ({columns})"));
        }

        let predicate = match &index.condition {
            Some(_) if !self.capabilities().supports_partial_indexes => {
                return Err(SchemaError::unsupported(
                    self.name(),
                    format!("partial index {}", index.name),
                ));
            }
            Some(condition) => format!(" WHERE {condition}"),
            None => String::new(),
        };
        let unique = if index.unique { "UNIQUE " } else { "" };
        Ok(format!(
            "CREATE {unique}INDEX {} ON {table_sql} ({columns}){predicate}",
            self.quote_identifier_of(&index.name)
        ))
    }

    /// Drops a secondary index or the primary key.
    ///
    /// # Errors
    ///
    /// The dialect cannot drop a primary key.
    fn drop_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        if index.primary {
            return Ok(format!(
                "ALTER TABLE {} DROP PRIMARY KEY",
                self.quote_identifier_of(table)
            ));
        }
        Ok(format!("DROP INDEX {}", self.quote_identifier_of(&index.name)))
    }

    /// Renames an index, or recreates it where renaming is not possible.
    /// An unqualified old name inherits the table's namespace.
    ///
    /// # Errors
    ///
    /// Recreating the index failed.
    fn rename_index_sql(
        &self,
        old: &Identifier,
        index: &Index,
        table: &Identifier,
    ) -> Result<Vec<String>> {
        if !self.capabilities().supports_rename_index {
            let mut old_index = index.clone();
            old_index.name = old.clone();
            return Ok(vec![
                self.drop_index_sql(&old_index, table)?,
                self.create_index_sql(index, table)?,
            ]);
        }

        let old_sql = match (old.namespace(), table.namespace()) {
            (None, Some(namespace)) => format!(
                "{}.{}",
                self.quote_identifier_of(&table.with_name(namespace)),
                self.quote_identifier_of(old)
            ),
            _ => self.quote_identifier_of(old),
        };
        Ok(vec![format!(
            "ALTER INDEX {old_sql} RENAME TO {}",
            self.quote_identifier_of(&index.name)
        )])
    }

    // ------------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------------

    /// `CREATE SEQUENCE`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] without sequence support.
    fn create_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        Err(SchemaError::unsupported(
            self.name(),
            format!("sequence {}", sequence.name),
        ))
    }

    /// `ALTER SEQUENCE` for increment and cache changes.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] without sequence support.
    fn alter_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        Err(SchemaError::unsupported(
            self.name(),
            format!("sequence {}", sequence.name),
        ))
    }

    /// `DROP SEQUENCE name`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] without sequence support.
    fn drop_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        if !self.capabilities().supports_sequences {
            return Err(SchemaError::unsupported(
                self.name(),
                format!("sequence {}", sequence.name),
            ));
        }
        Ok(format!("DROP SEQUENCE {}", self.quote_identifier_of(&sequence.name)))
    }

    // ------------------------------------------------------------------------
    // Foreign keys
    // ------------------------------------------------------------------------

    /// `[CONSTRAINT name ]FOREIGN KEY (..) REFERENCES t (..)[ options]`.
    ///
    /// # Errors
    ///
    /// A referential action the dialect cannot express.
    fn foreign_key_declaration_sql(&self, fk: &ForeignKeyConstraint) -> Result<String> {
        let constraint = if fk.name.is_empty() {
            String::new()
        } else {
            format!("CONSTRAINT {} ", self.quote_identifier_of(&fk.name))
        };
        Ok(format!(
            "{constraint}FOREIGN KEY ({}) REFERENCES {} ({}){}",
            self.columns_list_sql(&fk.local_columns),
            self.quote_identifier_of(&fk.foreign_table),
            self.columns_list_sql(&fk.foreign_columns),
            self.advanced_foreign_key_options_sql(fk)?
        ))
    }

    /// ` ON UPDATE ..` and ` ON DELETE ..` clauses.
    ///
    /// # Errors
    ///
    /// A referential action the dialect cannot express.
    fn advanced_foreign_key_options_sql(&self, fk: &ForeignKeyConstraint) -> Result<String> {
        let mut sql = String::new();
        for (event, action) in [("UPDATE", fk.on_update), ("DELETE", fk.on_delete)] {
            if let Some(action) = action {
                let action = self.foreign_key_referential_action_sql(action.as_sql())?;
                if !action.is_empty() {
                    sql.push_str(&format!(" ON {event} {action}"));
                }
            }
        }
        Ok(sql)
    }

    /// Normalizes a referential action. Unknown input is upper-cased and
    /// passed through.
    ///
    /// # Errors
    ///
    /// An action the dialect cannot express.
    fn foreign_key_referential_action_sql(&self, action: &str) -> Result<String> {
        Ok(action
            .parse::<ReferentialAction>()
            .map_or_else(|_| action.to_uppercase(), |a| a.as_sql().to_string()))
    }

    /// `ALTER TABLE t ADD <declaration>`.
    ///
    /// # Errors
    ///
    /// Invalid foreign key, or the dialect only declares foreign keys
    /// inline.
    fn create_foreign_key_sql(
        &self,
        fk: &ForeignKeyConstraint,
        table: &Identifier,
    ) -> Result<String> {
        if !self.capabilities().supports_foreign_key_alteration {
            return Err(SchemaError::unsupported(
                self.name(),
                format!("adding foreign key {} to an existing table", fk.name),
            ));
        }
        fk.validate(table)?;
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier_of(table),
            self.foreign_key_declaration_sql(fk)?
        ))
    }

    /// `ALTER TABLE t DROP CONSTRAINT name`.
    ///
    /// # Errors
    ///
    /// Unnamed constraint, or no foreign key alteration.
    fn drop_foreign_key_sql(
        &self,
        fk: &ForeignKeyConstraint,
        table: &Identifier,
    ) -> Result<String> {
        if !self.capabilities().supports_foreign_key_alteration {
            return Err(SchemaError::unsupported(
                self.name(),
                format!("dropping foreign key {}", fk.name),
            ));
        }
        if fk.name.is_empty() {
            return Err(SchemaError::UnnamedConstraint {
                table: table.to_string(),
                action: "dropped",
            });
        }
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier_of(table),
            self.quote_identifier_of(&fk.name)
        ))
    }

    /// `ALTER TABLE t RENAME CONSTRAINT old TO new`.
    ///
    /// # Errors
    ///
    /// Unnamed constraint, or no constraint renaming.
    fn rename_foreign_key_sql(
        &self,
        old: &Identifier,
        fk: &ForeignKeyConstraint,
        table: &Identifier,
    ) -> Result<String> {
        if !self.capabilities().supports_rename_constraint {
            return Err(SchemaError::unsupported(
                self.name(),
                format!("renaming constraint {old}"),
            ));
        }
        if old.is_empty() || fk.name.is_empty() {
            return Err(SchemaError::UnnamedConstraint {
                table: table.to_string(),
                action: "renamed",
            });
        }
        Ok(format!(
            "ALTER TABLE {} RENAME CONSTRAINT {} TO {}",
            self.quote_identifier_of(table),
            self.quote_identifier_of(old),
            self.quote_identifier_of(&fk.name)
        ))
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Literal used to clear a comment.
    fn cleared_comment_sql(&self) -> &'static str {
        "NULL"
    }

    /// `COMMENT ON TABLE t IS ..`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] without `COMMENT ON`.
    fn comment_on_table_sql(&self, table: &Identifier, comment: Option<&str>) -> Result<String> {
        if !self.capabilities().supports_comment_on_statement {
            return Err(SchemaError::unsupported(self.name(), "COMMENT ON TABLE"));
        }
        Ok(format!(
            "COMMENT ON TABLE {} IS {}",
            self.quote_identifier_of(table),
            self.comment_literal(comment)
        ))
    }

    /// `COMMENT ON COLUMN t.c IS ..`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] without `COMMENT ON`.
    fn comment_on_column_sql(
        &self,
        table: &Identifier,
        column: &Identifier,
        comment: Option<&str>,
    ) -> Result<String> {
        if !self.capabilities().supports_comment_on_statement {
            return Err(SchemaError::unsupported(self.name(), "COMMENT ON COLUMN"));
        }
        Ok(format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            self.quote_identifier_of(table),
            self.quote_identifier_of(column),
            self.comment_literal(comment)
        ))
    }

    /// A comment as a string literal; empty and missing comments clear it.
    fn comment_literal(&self, comment: Option<&str>) -> String {
        comment
            .filter(|c| !c.is_empty())
            .map_or_else(
                || self.cleared_comment_sql().to_string(),
                |c| self.quote_string_literal(c),
            )
    }

    // ------------------------------------------------------------------------
    // ALTER TABLE
    // ------------------------------------------------------------------------

    /// Realizes a table diff.
    ///
    /// Statements are ordered so that every prefix leaves a consistent
    /// schema: constraint drops, added columns, renamed columns, changed
    /// columns, dropped columns, comments, constraint creation and renames,
    /// and finally the table rename.
    ///
    /// # Errors
    ///
    /// The first statement the dialect cannot express.
    fn alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let table = &diff.name;
        let mut sql = Vec::new();

        for fk in diff.removed_foreign_keys.iter().chain(&diff.changed_foreign_keys) {
            sql.push(self.drop_foreign_key_sql(fk, table)?);
        }
        for index in diff.removed_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.drop_index_sql(index, table)?);
        }
        if let Some(old) = diff.primary_key.as_ref().and_then(|pk| pk.old.as_ref()) {
            sql.push(self.drop_index_sql(old, table)?);
        }

        if !diff.added_columns.is_empty() {
            sql.extend(self.added_columns_sql(table, &diff.added_columns)?);
        }
        for renamed in &diff.renamed_columns {
            sql.push(self.rename_column_sql(table, &renamed.old, &renamed.new.name)?);
        }
        if diff.changed_columns.iter().any(ColumnDiff::has_structural_change) {
            sql.extend(self.changed_columns_sql(table, &diff.changed_columns)?);
        }
        if !diff.removed_columns.is_empty() {
            sql.extend(self.dropped_columns_sql(table, &diff.removed_columns)?);
        }

        if self.capabilities().supports_comment_on_statement {
            if let Some(comment) = &diff.new_comment {
                sql.push(self.comment_on_table_sql(table, comment.as_deref())?);
            }
            for column in &diff.added_columns {
                if let Some(comment) = column.comment_text() {
                    sql.push(self.comment_on_column_sql(table, &column.name, Some(comment))?);
                }
            }
            for change in diff.changed_columns.iter().filter(|c| c.has_comment_change()) {
                sql.push(self.comment_on_column_sql(
                    table,
                    &change.new.name,
                    change.new.comment_text(),
                )?);
            }
        }

        for fk in diff.added_foreign_keys.iter().chain(&diff.changed_foreign_keys) {
            sql.push(self.create_foreign_key_sql(fk, table)?);
        }
        for index in diff.added_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.create_index_sql(index, table)?);
        }
        if let Some(new) = diff.primary_key.as_ref().and_then(|pk| pk.new.as_ref()) {
            sql.push(self.create_index_sql(new, table)?);
        }
        for renamed in &diff.renamed_indexes {
            sql.extend(self.rename_index_sql(&renamed.old, &renamed.new, table)?);
        }
        for renamed in &diff.renamed_foreign_keys {
            sql.push(self.rename_foreign_key_sql(&renamed.old, &renamed.new, table)?);
        }

        if let Some(new_name) = &diff.new_name {
            sql.push(self.rename_table_sql(table, new_name));
        }

        debug!(
            platform = self.name(),
            table = %table,
            statements = sql.len(),
            "generated alter table script"
        );
        Ok(sql)
    }

    /// Adds columns, one `ALTER TABLE .. ADD COLUMN` each.
    ///
    /// # Errors
    ///
    /// A column declaration failed.
    fn added_columns_sql(&self, table: &Identifier, columns: &[Column]) -> Result<Vec<String>> {
        let table_sql = self.quote_identifier_of(table);
        columns
            .iter()
            .map(|column| {
                Ok(format!(
                    "ALTER TABLE {table_sql} ADD COLUMN {}",
                    self.column_declaration_sql(column)?
                ))
            })
            .collect()
    }

    /// `ALTER TABLE t RENAME COLUMN old TO new`.
    ///
    /// # Errors
    ///
    /// The dialect cannot rename columns.
    fn rename_column_sql(
        &self,
        table: &Identifier,
        old: &Identifier,
        new: &Identifier,
    ) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_identifier_of(table),
            self.quote_identifier_of(old),
            self.quote_identifier_of(new)
        ))
    }

    /// Changes column definitions in place. Comment-only changes are
    /// handled separately and may be skipped here.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] unless the dialect overrides
    /// it.
    fn changed_columns_sql(
        &self,
        _table: &Identifier,
        changes: &[ColumnDiff],
    ) -> Result<Vec<String>> {
        let column = changes
            .iter()
            .find(|c| c.has_structural_change())
            .map_or_else(String::new, |c| c.new.name.to_string());
        Err(SchemaError::unsupported(
            self.name(),
            format!("changing column {column}"),
        ))
    }

    /// Drops columns, one `ALTER TABLE .. DROP COLUMN` each.
    ///
    /// # Errors
    ///
    /// The dialect cannot drop these columns.
    fn dropped_columns_sql(&self, table: &Identifier, columns: &[Column]) -> Result<Vec<String>> {
        let table_sql = self.quote_identifier_of(table);
        Ok(columns
            .iter()
            .map(|column| {
                format!(
                    "ALTER TABLE {table_sql} DROP COLUMN {}",
                    self.quote_identifier_of(&column.name)
                )
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Expressions and statement templates
    // ------------------------------------------------------------------------

    /// Regular expression match operator.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] when the dialect has none.
    fn regexp_expression_sql(&self) -> Result<&'static str> {
        Err(SchemaError::unsupported(self.name(), "regular expression matching"))
    }

    /// String concatenation of the given expressions.
    fn concat_expression_sql(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    /// Bitwise AND.
    fn bit_and_comparison_expression(&self, a: &str, b: &str) -> String {
        format!("({a} & {b})")
    }

    /// Bitwise OR.
    fn bit_or_comparison_expression(&self, a: &str, b: &str) -> String {
        format!("({a} | {b})")
    }

    /// Sets the isolation level of subsequent transactions.
    fn set_transaction_isolation_sql(&self, level: TransactionIsolationLevel) -> String {
        format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql())
    }

    /// `CREATE DATABASE name`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] when databases are files.
    fn create_database_sql(&self, name: &str) -> Result<String> {
        if !self.capabilities().supports_create_drop_database {
            return Err(SchemaError::unsupported(self.name(), "CREATE DATABASE"));
        }
        Ok(format!("CREATE DATABASE {}", self.quote_identifier(name)))
    }

    /// `DROP DATABASE name`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedOperation`] when databases are files.
    fn drop_database_sql(&self, name: &str) -> Result<String> {
        if !self.capabilities().supports_create_drop_database {
            return Err(SchemaError::unsupported(self.name(), "DROP DATABASE"));
        }
        Ok(format!("DROP DATABASE {}", self.quote_identifier(name)))
    }
}

// ============================================================================
// Platform selection
// ============================================================================

/// The supported dialects, used to pick a [`Platform`] from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformKind {
    /// Oracle Database.
    Oracle,
    /// PostgreSQL.
    Postgres,
    /// SQLite 3.
    Sqlite,
}

impl PlatformKind {
    /// Every dialect.
    pub const ALL: [Self; 3] = [Self::Oracle, Self::Postgres, Self::Sqlite];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Postgres => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Builds the platform.
    #[must_use]
    pub fn platform(self) -> Box<dyn Platform> {
        match self {
            Self::Oracle => Box::new(OraclePlatform::new()),
            Self::Postgres => Box::new(PostgresPlatform::new()),
            Self::Sqlite => Box::new(SqlitePlatform::new()),
        }
    }

    /// The dialect's reserved words.
    #[must_use]
    pub fn keywords(self) -> KeywordList {
        match self {
            Self::Oracle => KeywordList::oracle(),
            Self::Postgres => KeywordList::postgres(),
            Self::Sqlite => KeywordList::sqlite(),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "postgresql" | "postgres" | "pgsql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(SchemaError::UnknownPlatform(s.to_string())),
        }
    }
}

impl TryFrom<String> for PlatformKind {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PlatformKind> for String {
    fn from(value: PlatformKind) -> Self {
        value.as_str().to_string()
    }
}
