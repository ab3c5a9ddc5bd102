//! SQLite 3.
//!
//! SQLite has a narrow `ALTER TABLE`: columns can be added, dropped and
//! renamed, tables renamed, and nothing else. Foreign keys are declared
//! inline in `CREATE TABLE`.

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;
use crate::keywords::KeywordList;
use crate::schema::{Index, Table};
use crate::types::{ColumnType, TypeRegistry, TypeRule};

use super::{is_bare_with, Capabilities, IdentifierCase, Platform, TransactionIsolationLevel};

const NAME: &str = "sqlite";

const CAPABILITIES: Capabilities = Capabilities {
    supports_savepoints: true,
    supports_identity_columns: true,
    supports_comment_on_statement: false,
    supports_sequences: false,
    supports_alter_column: false,
    supports_foreign_key_alteration: false,
    supports_rename_index: false,
    supports_rename_constraint: false,
    supports_partial_indexes: true,
    supports_create_drop_database: false,
    identifier_case: IdentifierCase::Unchanged,
    max_identifier_length: 63,
};

/// Only a bare `INTEGER PRIMARY KEY` column aliases the rowid.
const IDENTITY: &str = "INTEGER PRIMARY KEY AUTOINCREMENT";

fn type_registry() -> TypeRegistry {
    let string = TypeRule::Sized {
        variable: "VARCHAR",
        fixed: "CHAR",
        length_required: false,
    };
    let integer = |storage| TypeRule::Integer {
        storage,
        identity: Some(IDENTITY),
    };
    TypeRegistry::new(NAME)
        .rule(ColumnType::SmallInt, integer("SMALLINT"))
        .rule(ColumnType::Integer, integer("INTEGER"))
        .rule(ColumnType::BigInt, integer("BIGINT"))
        .rule(ColumnType::Decimal, TypeRule::Numeric("NUMERIC"))
        .rule(ColumnType::Float, TypeRule::Keyword("DOUBLE PRECISION"))
        .rule(ColumnType::Boolean, TypeRule::Keyword("BOOLEAN"))
        .rule(ColumnType::String, string)
        .rule(ColumnType::AsciiString, string)
        .rule(ColumnType::Text, TypeRule::Keyword("CLOB"))
        .rule(ColumnType::Binary, TypeRule::Keyword("BLOB"))
        .rule(ColumnType::Blob, TypeRule::Keyword("BLOB"))
        .rule(ColumnType::Date, TypeRule::Keyword("DATE"))
        .rule(ColumnType::DateTime, TypeRule::Keyword("DATETIME"))
        .rule(ColumnType::DateTimeTz, TypeRule::Keyword("DATETIME"))
        .rule(ColumnType::Time, TypeRule::Keyword("TIME"))
        .rule(ColumnType::Guid, TypeRule::Keyword("CHAR(36)"))
        .rule(ColumnType::Json, TypeRule::Keyword("CLOB"))
        .db_type("bigint", ColumnType::BigInt)
        .db_type("blob", ColumnType::Blob)
        .db_type("boolean", ColumnType::Boolean)
        .db_type("char", ColumnType::String)
        .db_type("clob", ColumnType::Text)
        .db_type("date", ColumnType::Date)
        .db_type("datetime", ColumnType::DateTime)
        .db_type("decimal", ColumnType::Decimal)
        .db_type("double", ColumnType::Float)
        .db_type("double precision", ColumnType::Float)
        .db_type("float", ColumnType::Float)
        .db_type("int", ColumnType::Integer)
        .db_type("integer", ColumnType::Integer)
        .db_type("numeric", ColumnType::Decimal)
        .db_type("real", ColumnType::Float)
        .db_type("smallint", ColumnType::SmallInt)
        .db_type("text", ColumnType::Text)
        .db_type("time", ColumnType::Time)
        .db_type("timestamp", ColumnType::DateTime)
        .db_type("varchar", ColumnType::String)
}

/// SQLite platform.
#[derive(Debug, Clone)]
pub struct SqlitePlatform {
    capabilities: Capabilities,
    keywords: KeywordList,
    types: TypeRegistry,
}

impl Default for SqlitePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlitePlatform {
    /// Creates the platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: CAPABILITIES,
            keywords: KeywordList::sqlite(),
            types: type_registry(),
        }
    }
}

impl Platform for SqlitePlatform {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    fn is_bare_identifier(&self, part: &str) -> bool {
        is_bare_with(
            part,
            |c| c.is_ascii_alphabetic() || c == '_',
            |c| c.is_ascii_alphanumeric() || c == '_',
        )
    }

    // The autoincrement column declares the primary key itself.
    fn primary_key_clause_sql(&self, table: &Table, primary_key: &Index) -> Result<Option<String>> {
        let Some(column) = table.autoincrement_column() else {
            return Ok(Some(format!(
                "PRIMARY KEY({})",
                self.columns_list_sql(&primary_key.columns)
            )));
        };
        if primary_key.columns.len() == 1 && primary_key.has_column(&column.name) {
            return Ok(None);
        }
        Err(SchemaError::unsupported(
            NAME,
            format!(
                "autoincrement column {} outside the primary key of {}",
                column.name,
                table.name()
            ),
        ))
    }

    fn truncate_table_sql(&self, table: &str) -> String {
        format!("DELETE FROM {}", self.quote_identifier(table))
    }

    fn create_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        if index.primary {
            return Err(SchemaError::unsupported(
                NAME,
                format!("adding a primary key to {table}"),
            ));
        }
        let predicate = index
            .condition
            .as_ref()
            .map_or_else(String::new, |condition| format!(" WHERE {condition}"));
        let unique = if index.unique { "UNIQUE " } else { "" };
        Ok(format!(
            "CREATE {unique}INDEX {} ON {} ({}){predicate}",
            self.quote_identifier_of(&index.name),
            self.quote_identifier_of(table),
            self.columns_list_sql(&index.columns)
        ))
    }

    fn drop_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        if index.primary {
            return Err(SchemaError::unsupported(
                NAME,
                format!("dropping the primary key of {table}"),
            ));
        }
        Ok(format!("DROP INDEX {}", self.quote_identifier_of(&index.name)))
    }

    fn regexp_expression_sql(&self) -> Result<&'static str> {
        Ok("REGEXP")
    }

    fn set_transaction_isolation_sql(&self, level: TransactionIsolationLevel) -> String {
        let value = u8::from(level == TransactionIsolationLevel::ReadUncommitted);
        format!("PRAGMA read_uncommitted = {value}")
    }
}
