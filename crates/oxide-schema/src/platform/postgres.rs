//! PostgreSQL.

use crate::diff::{ColumnDiff, ColumnProperty};
use crate::error::Result;
use crate::identifier::Identifier;
use crate::keywords::KeywordList;
use crate::schema::{DefaultValue, Index, Sequence};
use crate::types::{ColumnType, TypeRegistry, TypeRule};

use super::{is_bare_with, Capabilities, IdentifierCase, Platform, TransactionIsolationLevel};

const NAME: &str = "postgresql";

const CAPABILITIES: Capabilities = Capabilities {
    supports_savepoints: true,
    supports_identity_columns: true,
    supports_comment_on_statement: true,
    supports_sequences: true,
    supports_alter_column: true,
    supports_foreign_key_alteration: true,
    supports_rename_index: true,
    supports_rename_constraint: true,
    supports_partial_indexes: true,
    supports_create_drop_database: true,
    identifier_case: IdentifierCase::Lower,
    max_identifier_length: 63,
};

fn type_registry() -> TypeRegistry {
    let string = TypeRule::Sized {
        variable: "VARCHAR",
        fixed: "CHAR",
        length_required: false,
    };
    TypeRegistry::new(NAME)
        .rule(
            ColumnType::SmallInt,
            TypeRule::Integer {
                storage: "SMALLINT",
                identity: Some("SMALLSERIAL"),
            },
        )
        .rule(
            ColumnType::Integer,
            TypeRule::Integer {
                storage: "INT",
                identity: Some("SERIAL"),
            },
        )
        .rule(
            ColumnType::BigInt,
            TypeRule::Integer {
                storage: "BIGINT",
                identity: Some("BIGSERIAL"),
            },
        )
        .rule(ColumnType::Decimal, TypeRule::Numeric("NUMERIC"))
        .rule(ColumnType::Float, TypeRule::Keyword("DOUBLE PRECISION"))
        .rule(ColumnType::Boolean, TypeRule::Keyword("BOOLEAN"))
        .rule(ColumnType::String, string)
        .rule(ColumnType::AsciiString, string)
        .rule(ColumnType::Text, TypeRule::Keyword("TEXT"))
        .rule(ColumnType::Binary, TypeRule::Keyword("BYTEA"))
        .rule(ColumnType::Blob, TypeRule::Keyword("BYTEA"))
        .rule(ColumnType::Date, TypeRule::Keyword("DATE"))
        .rule(ColumnType::DateTime, TypeRule::Keyword("TIMESTAMP(0) WITHOUT TIME ZONE"))
        .rule(ColumnType::DateTimeTz, TypeRule::Keyword("TIMESTAMP(0) WITH TIME ZONE"))
        .rule(ColumnType::Time, TypeRule::Keyword("TIME(0) WITHOUT TIME ZONE"))
        .rule(ColumnType::Guid, TypeRule::Keyword("UUID"))
        .rule(ColumnType::Json, TypeRule::Keyword("JSON"))
        .db_type("bigint", ColumnType::BigInt)
        .db_type("bigserial", ColumnType::BigInt)
        .db_type("bool", ColumnType::Boolean)
        .db_type("boolean", ColumnType::Boolean)
        .db_type("bpchar", ColumnType::String)
        .db_type("bytea", ColumnType::Blob)
        .db_type("char", ColumnType::String)
        .db_type("character", ColumnType::String)
        .db_type("character varying", ColumnType::String)
        .db_type("date", ColumnType::Date)
        .db_type("decimal", ColumnType::Decimal)
        .db_type("double precision", ColumnType::Float)
        .db_type("float", ColumnType::Float)
        .db_type("float4", ColumnType::Float)
        .db_type("float8", ColumnType::Float)
        .db_type("int", ColumnType::Integer)
        .db_type("int2", ColumnType::SmallInt)
        .db_type("int4", ColumnType::Integer)
        .db_type("int8", ColumnType::BigInt)
        .db_type("integer", ColumnType::Integer)
        .db_type("json", ColumnType::Json)
        .db_type("jsonb", ColumnType::Json)
        .db_type("numeric", ColumnType::Decimal)
        .db_type("real", ColumnType::Float)
        .db_type("serial", ColumnType::Integer)
        .db_type("smallint", ColumnType::SmallInt)
        .db_type("text", ColumnType::Text)
        .db_type("time", ColumnType::Time)
        .db_type("timestamp", ColumnType::DateTime)
        .db_type("timestamptz", ColumnType::DateTimeTz)
        .db_type("uuid", ColumnType::Guid)
        .db_type("varchar", ColumnType::String)
}

/// PostgreSQL platform.
#[derive(Debug, Clone)]
pub struct PostgresPlatform {
    capabilities: Capabilities,
    keywords: KeywordList,
    types: TypeRegistry,
}

impl Default for PostgresPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresPlatform {
    /// Creates the platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: CAPABILITIES,
            keywords: KeywordList::postgres(),
            types: type_registry(),
        }
    }

    /// ` CACHE n` above one. An altered sequence also spells out a
    /// disabled cache, since omitting the clause keeps the current one.
    fn cache_clause(sequence: &Sequence, altering: bool) -> String {
        match sequence.cache {
            Some(n) if n > 1 => format!(" CACHE {n}"),
            Some(_) if altering => " CACHE 1".to_string(),
            _ => String::new(),
        }
    }

    /// Statements for one changed column, in `TYPE`, `DEFAULT`, `NOT NULL`,
    /// autoincrement order.
    fn change_column_sql(&self, table: &Identifier, change: &ColumnDiff) -> Result<Vec<String>> {
        let table_sql = self.quote_identifier_of(table);
        let column = &change.new;
        let column_sql = self.quote_identifier_of(&column.name);
        let alter = format!("ALTER TABLE {table_sql} ALTER COLUMN {column_sql}");
        let mut sql = Vec::new();

        let type_changed = [
            ColumnProperty::Type,
            ColumnProperty::Length,
            ColumnProperty::Fixed,
            ColumnProperty::Precision,
            ColumnProperty::Scale,
        ]
        .into_iter()
        .any(|p| change.has_changed(p));
        if type_changed {
            // Serial pseudo types only exist in CREATE TABLE.
            let storage = column.clone().autoincrement(false);
            sql.push(format!("{alter} TYPE {}", self.type_declaration_sql(&storage)?));
        }

        if change.has_changed(ColumnProperty::Default) {
            match &column.default {
                None | Some(DefaultValue::Null) => sql.push(format!("{alter} DROP DEFAULT")),
                Some(_) => sql.push(format!(
                    "{alter}{}",
                    self.default_value_sql(column)
                        .replacen(" DEFAULT", " SET DEFAULT", 1)
                )),
            }
        }

        if change.has_changed(ColumnProperty::Nullable) {
            let action = if column.nullable { "DROP" } else { "SET" };
            sql.push(format!("{alter} {action} NOT NULL"));
        }

        if change.has_changed(ColumnProperty::Autoincrement) {
            if column.autoincrement {
                let sequence = Identifier::unquoted(format!(
                    "{}_{}_seq",
                    table.short_name(),
                    column.name.name()
                ));
                let sequence_sql = self.quote_identifier_of(&sequence);
                sql.push(format!("CREATE SEQUENCE {sequence_sql}"));
                sql.push(format!(
                    "SELECT setval({}, (SELECT MAX({column_sql}) FROM {table_sql}))",
                    self.quote_string_literal(&sequence_sql)
                ));
                sql.push(format!(
                    "{alter} SET DEFAULT nextval({})",
                    self.quote_string_literal(&sequence_sql)
                ));
            } else {
                sql.push(format!("{alter} DROP DEFAULT"));
            }
        }
        Ok(sql)
    }
}

impl Platform for PostgresPlatform {
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
            |c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'),
        )
    }

    fn convert_boolean(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    fn drop_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        if index.primary {
            let constraint = table.with_name(format!("{}_pkey", table.short_name()));
            return Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                self.quote_identifier_of(table),
                self.quote_identifier_of(&constraint)
            ));
        }
        Ok(format!("DROP INDEX {}", self.quote_identifier_of(&index.name)))
    }

    fn create_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        sequence.validate()?;
        Ok(format!(
            "CREATE SEQUENCE {} INCREMENT BY {} MINVALUE {start} START {start}{}",
            self.quote_identifier_of(&sequence.name),
            sequence.increment,
            Self::cache_clause(sequence, false),
            start = sequence.initial_value,
        ))
    }

    fn alter_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        sequence.validate()?;
        Ok(format!(
            "ALTER SEQUENCE {} INCREMENT BY {}{}",
            self.quote_identifier_of(&sequence.name),
            sequence.increment,
            Self::cache_clause(sequence, true)
        ))
    }

    fn changed_columns_sql(
        &self,
        table: &Identifier,
        changes: &[ColumnDiff],
    ) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        for change in changes {
            sql.extend(self.change_column_sql(table, change)?);
        }
        Ok(sql)
    }

    fn regexp_expression_sql(&self) -> Result<&'static str> {
        Ok("SIMILAR TO")
    }

    fn set_transaction_isolation_sql(&self, level: TransactionIsolationLevel) -> String {
        format!(
            "SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL {}",
            level.as_sql()
        )
    }
}
