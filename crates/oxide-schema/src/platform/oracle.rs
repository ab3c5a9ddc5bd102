//! Oracle Database.
//!
//! Oracle has no identity columns; autoincrement is emulated with a
//! primary key, a sequence and a `BEFORE INSERT` trigger (see
//! [`OraclePlatform::create_autoincrement_sql`]).

use crate::diff::{ColumnDiff, ColumnProperty};
use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;
use crate::keywords::KeywordList;
use crate::schema::{Column, ForeignKeyConstraint, ReferentialAction, Sequence, Table};
use crate::types::{ColumnType, TypeRegistry, TypeRule};

use super::{is_bare_with, Capabilities, IdentifierCase, Platform, TransactionIsolationLevel};

const NAME: &str = "oracle";

const CAPABILITIES: Capabilities = Capabilities {
    supports_savepoints: true,
    supports_identity_columns: false,
    supports_comment_on_statement: true,
    supports_sequences: true,
    supports_alter_column: true,
    supports_foreign_key_alteration: true,
    supports_rename_index: true,
    supports_rename_constraint: true,
    supports_partial_indexes: false,
    supports_create_drop_database: true,
    identifier_case: IdentifierCase::Upper,
    max_identifier_length: 30,
};

const AUTOINCREMENT_SUFFIX: &str = "_AI_PK";
const SEQUENCE_SUFFIX: &str = "_SEQ";

fn type_registry() -> TypeRegistry {
    let string = TypeRule::Sized {
        variable: "VARCHAR2",
        fixed: "CHAR",
        length_required: true,
    };
    TypeRegistry::new(NAME)
        .rule(ColumnType::SmallInt, TypeRule::Integer { storage: "NUMBER(5)", identity: None })
        .rule(ColumnType::Integer, TypeRule::Integer { storage: "NUMBER(10)", identity: None })
        .rule(ColumnType::BigInt, TypeRule::Integer { storage: "NUMBER(20)", identity: None })
        .rule(ColumnType::Decimal, TypeRule::Numeric("NUMBER"))
        .rule(ColumnType::Float, TypeRule::Keyword("DOUBLE PRECISION"))
        .rule(ColumnType::Boolean, TypeRule::Keyword("NUMBER(1)"))
        .rule(ColumnType::String, string)
        .rule(ColumnType::AsciiString, string)
        .rule(ColumnType::Text, TypeRule::Keyword("CLOB"))
        .rule(
            ColumnType::Binary,
            TypeRule::Sized {
                variable: "RAW",
                fixed: "RAW",
                length_required: true,
            },
        )
        .rule(ColumnType::Blob, TypeRule::Keyword("BLOB"))
        .rule(ColumnType::Date, TypeRule::Keyword("DATE"))
        .rule(ColumnType::DateTime, TypeRule::Keyword("TIMESTAMP(0)"))
        .rule(ColumnType::DateTimeTz, TypeRule::Keyword("TIMESTAMP(0) WITH TIME ZONE"))
        .rule(ColumnType::Time, TypeRule::Keyword("DATE"))
        .rule(ColumnType::Guid, TypeRule::Keyword("CHAR(36)"))
        .rule(ColumnType::Json, TypeRule::Keyword("CLOB"))
        .db_type("binary_double", ColumnType::Float)
        .db_type("binary_float", ColumnType::Float)
        .db_type("binary_integer", ColumnType::Boolean)
        .db_type("blob", ColumnType::Blob)
        .db_type("char", ColumnType::String)
        .db_type("clob", ColumnType::Text)
        .db_type("date", ColumnType::Date)
        .db_type("float", ColumnType::Float)
        .db_type("integer", ColumnType::Integer)
        .db_type("long", ColumnType::String)
        .db_type("long raw", ColumnType::Blob)
        .db_type("nchar", ColumnType::String)
        .db_type("nclob", ColumnType::Text)
        .db_type("number", ColumnType::Integer)
        .db_type("nvarchar2", ColumnType::String)
        .db_type("pls_integer", ColumnType::Boolean)
        .db_type("raw", ColumnType::Binary)
        .db_type("real", ColumnType::SmallInt)
        .db_type("rowid", ColumnType::String)
        .db_type("timestamp", ColumnType::DateTime)
        .db_type("timestamptz", ColumnType::DateTimeTz)
        .db_type("urowid", ColumnType::String)
        .db_type("varchar", ColumnType::String)
        .db_type("varchar2", ColumnType::String)
}

/// Oracle Database platform.
#[derive(Debug, Clone)]
pub struct OraclePlatform {
    capabilities: Capabilities,
    keywords: KeywordList,
    types: TypeRegistry,
}

impl Default for OraclePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl OraclePlatform {
    /// Creates the platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: CAPABILITIES,
            keywords: KeywordList::oracle(),
            types: type_registry(),
        }
    }

    /// `<table><suffix>`, with the table name shortened so the result fits
    /// the identifier limit. Quoted when the table is.
    fn suffixed_name(&self, table: &Identifier, suffix: &str) -> Identifier {
        let max = self.capabilities.max_identifier_length.saturating_sub(suffix.len());
        let stem: String = table.name().chars().take(max).collect();
        table.with_name(format!("{stem}{suffix}"))
    }

    /// The statements that emulate an autoincrement `column` on `table`,
    /// run after `CREATE TABLE`: a guarded primary key, the sequence and
    /// the insert trigger.
    ///
    /// The trigger keeps the sequence ahead of explicitly inserted values,
    /// so it never hands out a value at or below one already stored.
    #[must_use]
    pub fn create_autoincrement_sql(&self, column: &Identifier, table: &Identifier) -> Vec<String> {
        let table = self.normalize_identifier(table);
        let column = self.normalize_identifier(column);
        let table_sql = self.quote_identifier_of(&table);
        let column_sql = self.quote_identifier_of(&column);
        let constraint =
            self.quote_identifier_of(&self.suffixed_name(&table, AUTOINCREMENT_SUFFIX));
        let sequence_name = self.suffixed_name(&table, SEQUENCE_SUFFIX);
        let sequence_sql = self.quote_identifier_of(&sequence_name);
        let add_primary_key = format!(
            "ALTER TABLE {table_sql} ADD CONSTRAINT {constraint} PRIMARY KEY ({column_sql})"
        );

        let primary_key = [
            "DECLARE".to_string(),
            "  constraints_Count NUMBER;".to_string(),
            "BEGIN".to_string(),
            "  SELECT COUNT(CONSTRAINT_NAME) INTO constraints_Count".to_string(),
            "    FROM USER_CONSTRAINTS".to_string(),
            format!("   WHERE TABLE_NAME = {}", self.quote_string_literal(table.name())),
            "     AND CONSTRAINT_TYPE = 'P';".to_string(),
            "  IF constraints_Count = 0 OR constraints_Count = '' THEN".to_string(),
            format!("    EXECUTE IMMEDIATE {};", self.quote_string_literal(&add_primary_key)),
            "  END IF;".to_string(),
            "END;".to_string(),
        ]
        .join("\n");

        let trigger = [
            format!("CREATE TRIGGER {constraint}"),
            "   BEFORE INSERT".to_string(),
            format!("   ON {table_sql}"),
            "   FOR EACH ROW".to_string(),
            "DECLARE".to_string(),
            "   last_Sequence NUMBER;".to_string(),
            "   last_InsertID NUMBER;".to_string(),
            "BEGIN".to_string(),
            format!("   IF (:NEW.{column_sql} IS NULL OR :NEW.{column_sql} = 0) THEN"),
            format!("      SELECT {sequence_sql}.NEXTVAL INTO :NEW.{column_sql} FROM DUAL;"),
            "   ELSE".to_string(),
            "      SELECT NVL(Last_Number, 0) INTO last_Sequence".to_string(),
            "        FROM User_Sequences".to_string(),
            format!(
                "       WHERE Sequence_Name = {};",
                self.quote_string_literal(sequence_name.name())
            ),
            format!("      SELECT :NEW.{column_sql} INTO last_InsertID FROM DUAL;"),
            "      WHILE (last_InsertID > last_Sequence) LOOP".to_string(),
            format!("         SELECT {sequence_sql}.NEXTVAL INTO last_Sequence FROM DUAL;"),
            "      END LOOP;".to_string(),
            format!("      SELECT {sequence_sql}.NEXTVAL INTO last_Sequence FROM DUAL;"),
            "   END IF;".to_string(),
            "END;".to_string(),
        ]
        .join("\n");

        vec![
            primary_key,
            self.sequence_sql("CREATE", &Sequence::new(sequence_name), true),
            trigger,
        ]
    }

    /// `<verb> SEQUENCE` with the Oracle clause order.
    fn sequence_sql(&self, verb: &str, sequence: &Sequence, with_start: bool) -> String {
        let name = self.quote_identifier_of(&sequence.name);
        let start = if with_start {
            format!(
                " START WITH {start} MINVALUE {start}",
                start = sequence.initial_value
            )
        } else {
            String::new()
        };
        let cache = match sequence.cache {
            None => String::new(),
            Some(0 | 1) => " NOCACHE".to_string(),
            Some(n) => format!(" CACHE {n}"),
        };
        format!(
            "{verb} SEQUENCE {name}{start} INCREMENT BY {}{cache}",
            sequence.increment
        )
    }

    /// `name type DEFAULT ..[ NULL| NOT NULL]` for `MODIFY`, where the
    /// nullability clause only appears when it changed.
    fn modify_declaration_sql(&self, change: &ColumnDiff) -> Result<String> {
        let column = &change.new;
        let null = if !change.has_changed(ColumnProperty::Nullable) {
            ""
        } else if column.nullable {
            " NULL"
        } else {
            " NOT NULL"
        };
        Ok(format!(
            "{} {}{}{null}",
            self.quote_identifier_of(&column.name),
            self.type_declaration_sql(column)?,
            self.default_value_sql(column)
        ))
    }
}

impl Platform for OraclePlatform {
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
            |c| c.is_ascii_alphabetic(),
            |c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'),
        )
    }

    fn autoincrement_sql(&self, table: &Table) -> Result<Vec<String>> {
        Ok(table
            .autoincrement_column()
            .map(|column| self.create_autoincrement_sql(&column.name, table.name()))
            .unwrap_or_default())
    }

    fn drop_autoincrement_sql(&self, table: &str) -> Result<Vec<String>> {
        let table = self.normalize_identifier(&Identifier::new(table));
        let constraint =
            self.quote_identifier_of(&self.suffixed_name(&table, AUTOINCREMENT_SUFFIX));
        let sequence = self.quote_identifier_of(&self.suffixed_name(&table, SEQUENCE_SUFFIX));
        Ok(vec![
            format!("DROP TRIGGER {constraint}"),
            format!("DROP SEQUENCE {sequence}"),
            format!(
                "ALTER TABLE {} DROP CONSTRAINT {constraint}",
                self.quote_identifier_of(&table)
            ),
        ])
    }

    fn create_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        sequence.validate()?;
        Ok(self.sequence_sql("CREATE", sequence, true))
    }

    fn alter_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        sequence.validate()?;
        Ok(self.sequence_sql("ALTER", sequence, false))
    }

    fn advanced_foreign_key_options_sql(&self, fk: &ForeignKeyConstraint) -> Result<String> {
        // No ON UPDATE clause: updates always behave as NO ACTION.
        if let Some(
            action @ (ReferentialAction::Cascade
            | ReferentialAction::SetNull
            | ReferentialAction::SetDefault),
        ) = fk.on_update
        {
            return Err(SchemaError::unsupported(
                NAME,
                format!("ON UPDATE {action} on foreign key {}", fk.name),
            ));
        }
        let Some(action) = fk.on_delete else {
            return Ok(String::new());
        };
        let action = self.foreign_key_referential_action_sql(action.as_sql())?;
        if action.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" ON DELETE {action}"))
        }
    }

    fn foreign_key_referential_action_sql(&self, action: &str) -> Result<String> {
        match action.parse::<ReferentialAction>() {
            Ok(ReferentialAction::NoAction | ReferentialAction::Restrict) => Ok(String::new()),
            Ok(ReferentialAction::SetDefault) => {
                Err(SchemaError::unsupported(NAME, "referential action SET DEFAULT"))
            }
            Ok(other) => Ok(other.as_sql().to_string()),
            Err(_) => Ok(action.to_uppercase()),
        }
    }

    fn cleared_comment_sql(&self) -> &'static str {
        "''"
    }

    fn added_columns_sql(&self, table: &Identifier, columns: &[Column]) -> Result<Vec<String>> {
        let declarations = columns
            .iter()
            .map(|column| self.column_declaration_sql(column))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = vec![format!(
            "ALTER TABLE {} ADD ({})",
            self.quote_identifier_of(table),
            declarations.join(", ")
        )];
        for column in columns.iter().filter(|c| c.autoincrement) {
            sql.extend(self.create_autoincrement_sql(&column.name, table));
        }
        Ok(sql)
    }

    fn changed_columns_sql(
        &self,
        table: &Identifier,
        changes: &[ColumnDiff],
    ) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        let autoincrement_flips = || {
            changes
                .iter()
                .filter(|c| c.has_changed(ColumnProperty::Autoincrement))
        };

        if autoincrement_flips().any(|c| !c.new.autoincrement) {
            sql.extend(self.drop_autoincrement_sql(&table.to_string())?);
        }

        let modified = changes
            .iter()
            .filter(|c| c.has_definition_change())
            .map(|c| self.modify_declaration_sql(c))
            .collect::<Result<Vec<_>>>()?;
        if !modified.is_empty() {
            sql.push(format!(
                "ALTER TABLE {} MODIFY ({})",
                self.quote_identifier_of(table),
                modified.join(", ")
            ));
        }

        for change in autoincrement_flips().filter(|c| c.new.autoincrement) {
            sql.extend(self.create_autoincrement_sql(&change.new.name, table));
        }
        Ok(sql)
    }

    fn dropped_columns_sql(&self, table: &Identifier, columns: &[Column]) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        if columns.iter().any(|c| c.autoincrement) {
            sql.extend(self.drop_autoincrement_sql(&table.to_string())?);
        }
        sql.push(format!(
            "ALTER TABLE {} DROP ({})",
            self.quote_identifier_of(table),
            columns
                .iter()
                .map(|c| self.quote_identifier_of(&c.name))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(sql)
    }

    fn regexp_expression_sql(&self) -> Result<&'static str> {
        Err(SchemaError::unsupported(NAME, "regular expression matching"))
    }

    fn bit_and_comparison_expression(&self, a: &str, b: &str) -> String {
        format!("BITAND({a}, {b})")
    }

    fn bit_or_comparison_expression(&self, a: &str, b: &str) -> String {
        format!("({a}-{}+{b})", self.bit_and_comparison_expression(a, b))
    }

    fn set_transaction_isolation_sql(&self, level: TransactionIsolationLevel) -> String {
        let level = match level {
            TransactionIsolationLevel::RepeatableRead => TransactionIsolationLevel::Serializable,
            other => other,
        };
        format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql())
    }

    fn create_database_sql(&self, name: &str) -> Result<String> {
        Ok(format!("CREATE USER {}", self.quote_identifier(name)))
    }

    fn drop_database_sql(&self, name: &str) -> Result<String> {
        Ok(format!("DROP USER {} CASCADE", self.quote_identifier(name)))
    }
}
