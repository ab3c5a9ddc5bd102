//! Oracle DDL generation, including the autoincrement emulation.

mod common;

use common::{alter, assert_unsupported, diff, integer, string, table};
use oxide_schema::diff::{ColumnDiff, ColumnProperty, RenamedColumn};
use oxide_schema::prelude::*;
use pretty_assertions::assert_eq;

fn platform() -> OraclePlatform {
    OraclePlatform::new()
}

fn expected_autoincrement(
    table: &str,
    column: &str,
    literal_table: &str,
    literal_sequence: &str,
) -> Vec<String> {
    let (constraint, sequence) = match table.strip_suffix('"') {
        Some(stem) => (format!("{stem}_AI_PK\""), format!("{stem}_SEQ\"")),
        None => (format!("{table}_AI_PK"), format!("{table}_SEQ")),
    };
    vec![
        format!(
            "DECLARE
  constraints_Count NUMBER;
BEGIN
  SELECT COUNT(CONSTRAINT_NAME) INTO constraints_Count
    FROM USER_CONSTRAINTS
   WHERE TABLE_NAME = '{literal_table}'
     AND CONSTRAINT_TYPE = 'P';
  IF constraints_Count = 0 OR constraints_Count = '' THEN
    EXECUTE IMMEDIATE 'ALTER TABLE {table} ADD CONSTRAINT {constraint} PRIMARY KEY ({column})';
  END IF;
END;"
        ),
        format!("CREATE SEQUENCE {sequence} START WITH 1 MINVALUE 1 INCREMENT BY 1"),
        format!(
            "CREATE TRIGGER {constraint}
   BEFORE INSERT
   ON {table}
   FOR EACH ROW
DECLARE
   last_Sequence NUMBER;
   last_InsertID NUMBER;
BEGIN
   IF (:NEW.{column} IS NULL OR :NEW.{column} = 0) THEN
      SELECT {sequence}.NEXTVAL INTO :NEW.{column} FROM DUAL;
   ELSE
      SELECT NVL(Last_Number, 0) INTO last_Sequence
        FROM User_Sequences
       WHERE Sequence_Name = '{literal_sequence}';
      SELECT :NEW.{column} INTO last_InsertID FROM DUAL;
      WHILE (last_InsertID > last_Sequence) LOOP
         SELECT {sequence}.NEXTVAL INTO last_Sequence FROM DUAL;
      END LOOP;
      SELECT {sequence}.NEXTVAL INTO last_Sequence FROM DUAL;
   END IF;
END;"
        ),
    ]
}

// =============================================================================
// CREATE TABLE
// =============================================================================

#[test]
fn create_table_with_nullable_column() {
    let mut t = table("test", vec![integer("id"), string("test", 255).nullable()]);
    t.set_primary_key(&["id"]).unwrap();
    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec!["CREATE TABLE test (id NUMBER(10) NOT NULL, test VARCHAR2(255) DEFAULT NULL NULL, PRIMARY KEY(id))"]
    );
}

#[test]
fn create_table_with_generated_unique_index_name() {
    let mut t = table(
        "test",
        vec![string("foo", 255).nullable(), string("bar", 255).nullable()],
    );
    t.add_unique_index(&["foo", "bar"], None).unwrap();
    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec![
            "CREATE TABLE test (foo VARCHAR2(255) DEFAULT NULL NULL, bar VARCHAR2(255) DEFAULT NULL NULL)",
            "CREATE UNIQUE INDEX UNIQ_D87F7E0C8C73652176FF8CAA ON test (foo, bar)",
        ]
    );
}

#[test]
fn create_table_with_column_comment() {
    let mut t = table("test", vec![integer("id").comment("This is a comment")]);
    t.set_primary_key(&["id"]).unwrap();
    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec![
            "CREATE TABLE test (id NUMBER(10) NOT NULL, PRIMARY KEY(id))",
            "COMMENT ON COLUMN test.id IS 'This is a comment'",
        ]
    );
}

#[test]
fn create_table_emulates_autoincrement() {
    let t = table("mytable", vec![integer("id").autoincrement(true)]);
    let sql = platform().create_table_sql(&t).unwrap();

    let mut expected = vec!["CREATE TABLE mytable (id NUMBER(10) NOT NULL)".to_string()];
    expected.extend(expected_autoincrement("MYTABLE", "ID", "MYTABLE", "MYTABLE_SEQ"));
    assert_eq!(sql, expected);
}

#[test]
fn create_table_emulates_autoincrement_for_quoted_names() {
    let t = table("\"test\"", vec![integer("\"id\"").autoincrement(true)]);
    let sql = platform().create_table_sql(&t).unwrap();

    assert_eq!(sql.len(), 4);
    assert_eq!(sql[0], "CREATE TABLE \"test\" (\"id\" NUMBER(10) NOT NULL)");
    assert_eq!(sql[2], "CREATE SEQUENCE \"test_SEQ\" START WITH 1 MINVALUE 1 INCREMENT BY 1");
    assert_eq!(
        sql[1..].to_vec(),
        expected_autoincrement("\"test\"", "\"id\"", "test", "test_SEQ")
    );
}

#[test]
fn create_table_quotes_columns_in_foreign_keys() {
    let mut t = table(
        "\"quoted\"",
        vec![string("\"create\"", 255), string("foo", 255), string("\"bar\"", 255)],
    );
    let local = ["\"create\"", "foo", "\"bar\""];
    let foreign = ["\"create\"", "bar", "\"foo-bar\""];
    let fk = |table: &str, name: &str| {
        ForeignKeyConstraint::new(&local, table, &foreign).named(name)
    };
    t.add_foreign_key(fk("foreign", "FK_WITH_RESERVED_KEYWORD"))
        .unwrap()
        .add_foreign_key(fk("foo", "FK_WITH_NON_RESERVED_KEYWORD"))
        .unwrap()
        .add_foreign_key(fk("\"foo-bar\"", "FK_WITH_INTENDED_QUOTATION"))
        .unwrap();

    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec![
            "CREATE TABLE \"quoted\" (\"create\" VARCHAR2(255) NOT NULL, foo VARCHAR2(255) NOT NULL, \
             \"bar\" VARCHAR2(255) NOT NULL)",
            "ALTER TABLE \"quoted\" ADD CONSTRAINT FK_WITH_RESERVED_KEYWORD FOREIGN KEY (\"create\", foo, \"bar\") \
             REFERENCES foreign (\"create\", bar, \"foo-bar\")",
            "ALTER TABLE \"quoted\" ADD CONSTRAINT FK_WITH_NON_RESERVED_KEYWORD FOREIGN KEY (\"create\", foo, \"bar\") \
             REFERENCES foo (\"create\", bar, \"foo-bar\")",
            "ALTER TABLE \"quoted\" ADD CONSTRAINT FK_WITH_INTENDED_QUOTATION FOREIGN KEY (\"create\", foo, \"bar\") \
             REFERENCES \"foo-bar\" (\"create\", bar, \"foo-bar\")",
            "CREATE INDEX IDX_22660D028FD6E0FB8C73652176FF8CAA ON \"quoted\" (\"create\", foo, \"bar\")",
        ]
    );
}

#[test]
fn create_table_quotes_primary_key_and_index_columns() {
    let mut t = table("\"quoted\"", vec![string("\"create\"", 255)]);
    t.set_primary_key(&["\"create\""]).unwrap();
    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec!["CREATE TABLE \"quoted\" (\"create\" VARCHAR2(255) NOT NULL, PRIMARY KEY(\"create\"))"]
    );

    let mut t = table("\"quoted\"", vec![string("\"create\"", 255)]);
    t.add_index(&["\"create\""], None).unwrap();
    assert_eq!(
        platform().create_table_sql(&t).unwrap(),
        vec![
            "CREATE TABLE \"quoted\" (\"create\" VARCHAR2(255) NOT NULL)",
            "CREATE INDEX IDX_22660D028FD6E0FB ON \"quoted\" (\"create\")",
        ]
    );
}

#[test]
fn create_table_rejects_on_update_cascade() {
    let mut t = table("child", vec![integer("parent_id")]);
    t.add_foreign_key(
        ForeignKeyConstraint::new(&["parent_id"], "parent", &["id"])
            .on_update(ReferentialAction::Cascade),
    )
    .unwrap();
    assert_unsupported(&platform(), platform().create_table_sql(&t));
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn index_and_foreign_key_statements() {
    let p = platform();
    assert_eq!(
        p.create_index_sql(
            &Index::new("my_idx", &["user_name", "last_login"]),
            &Identifier::new("mytable"),
        )
        .unwrap(),
        "CREATE INDEX my_idx ON mytable (user_name, last_login)"
    );
    assert_eq!(
        p.create_index_sql(
            &Index::new("index_name", &["test", "test2"]).unique(),
            &Identifier::new("test"),
        )
        .unwrap(),
        "CREATE UNIQUE INDEX index_name ON test (test, test2)"
    );
    assert_eq!(
        p.create_foreign_key_sql(
            &ForeignKeyConstraint::new(&["fk_name_id"], "other_table", &["id"]),
            &Identifier::new("test")
        )
        .unwrap(),
        "ALTER TABLE test ADD FOREIGN KEY (fk_name_id) REFERENCES other_table (id)"
    );
}

#[test]
fn advanced_foreign_key_options() {
    let p = platform();
    let fk = || ForeignKeyConstraint::new(&["foo"], "foreign_table", &["bar"]);
    let cases = [
        (fk(), ""),
        (fk().on_delete(ReferentialAction::Cascade), " ON DELETE CASCADE"),
        (fk().on_delete(ReferentialAction::NoAction), ""),
        (fk().on_delete(ReferentialAction::Restrict), ""),
        (
            fk().on_update(ReferentialAction::NoAction).on_delete(ReferentialAction::SetNull),
            " ON DELETE SET NULL",
        ),
        (fk().on_update(ReferentialAction::Restrict), ""),
    ];
    for (fk, expected) in cases {
        assert_eq!(p.advanced_foreign_key_options_sql(&fk).unwrap(), expected);
    }
    assert_unsupported(
        &p,
        p.advanced_foreign_key_options_sql(&fk().on_update(ReferentialAction::SetNull)),
    );
}

#[test]
fn referential_action_normalization() {
    let p = platform();
    for (input, expected) in [
        ("CASCADE", "CASCADE"),
        ("SET NULL", "SET NULL"),
        ("NO ACTION", ""),
        ("RESTRICT", ""),
        ("CaScAdE", "CASCADE"),
        ("whatever", "WHATEVER"),
    ] {
        assert_eq!(p.foreign_key_referential_action_sql(input).unwrap(), expected);
    }
    assert_unsupported(&p, p.foreign_key_referential_action_sql("SET DEFAULT"));
}

#[test]
fn drop_autoincrement() {
    let p = platform();
    assert_eq!(
        p.drop_autoincrement_sql("myTable").unwrap(),
        vec![
            "DROP TRIGGER MYTABLE_AI_PK",
            "DROP SEQUENCE MYTABLE_SEQ",
            "ALTER TABLE MYTABLE DROP CONSTRAINT MYTABLE_AI_PK",
        ]
    );
    assert_eq!(
        p.drop_autoincrement_sql("\"myTable\"").unwrap(),
        vec![
            "DROP TRIGGER \"myTable_AI_PK\"",
            "DROP SEQUENCE \"myTable_SEQ\"",
            "ALTER TABLE \"myTable\" DROP CONSTRAINT \"myTable_AI_PK\"",
        ]
    );
    assert_eq!(
        p.drop_autoincrement_sql("table").unwrap(),
        vec![
            "DROP TRIGGER TABLE_AI_PK",
            "DROP SEQUENCE TABLE_SEQ",
            "ALTER TABLE \"TABLE\" DROP CONSTRAINT TABLE_AI_PK",
        ]
    );
}

#[test]
fn rename_index() {
    let p = platform();
    let rename = |old: &str, new: &str, table: &str| {
        p.rename_index_sql(
            &Identifier::new(old),
            &Index::new(new, &["id"]),
            &Identifier::new(table),
        )
        .unwrap()
    };
    assert_eq!(
        rename("idx_foo", "idx_bar", "mytable"),
        vec!["ALTER INDEX idx_foo RENAME TO idx_bar"]
    );
    assert_eq!(
        rename("\"create\"", "\"select\"", "mytable"),
        vec!["ALTER INDEX \"create\" RENAME TO \"select\""]
    );
    assert_eq!(
        rename("idx_foo", "idx_bar", "myschema.mytable"),
        vec!["ALTER INDEX myschema.idx_foo RENAME TO idx_bar"]
    );
    assert_eq!(
        rename("\"create\"", "\"select\"", "\"schema\".\"mytable\""),
        vec!["ALTER INDEX \"schema\".\"create\" RENAME TO \"select\""]
    );
    assert_eq!(
        rename("\"foo\"", "\"bar\"", "\"schema\".\"mytable\""),
        vec!["ALTER INDEX \"schema\".\"foo\" RENAME TO \"bar\""]
    );
}

#[test]
fn rename_column_keeps_quoting() {
    let p = platform();
    let table = Identifier::new("mytable");
    for (old, new, expected) in [
        ("unquoted1", "unquoted", "ALTER TABLE mytable RENAME COLUMN unquoted1 TO unquoted"),
        ("unquoted2", "where", "ALTER TABLE mytable RENAME COLUMN unquoted2 TO \"where\""),
        ("unquoted3", "\"foo\"", "ALTER TABLE mytable RENAME COLUMN unquoted3 TO \"foo\""),
        (
            "create",
            "reserved_keyword",
            "ALTER TABLE mytable RENAME COLUMN \"create\" TO reserved_keyword",
        ),
        ("table", "from", "ALTER TABLE mytable RENAME COLUMN \"table\" TO \"from\""),
        ("select", "\"bar\"", "ALTER TABLE mytable RENAME COLUMN \"select\" TO \"bar\""),
        ("\"quoted1\"", "quoted", "ALTER TABLE mytable RENAME COLUMN \"quoted1\" TO quoted"),
        ("\"quoted2\"", "and", "ALTER TABLE mytable RENAME COLUMN \"quoted2\" TO \"and\""),
    ] {
        assert_eq!(
            p.rename_column_sql(&table, &Identifier::new(old), &Identifier::new(new)).unwrap(),
            expected
        );
    }
}

#[test]
fn comment_on_column() {
    let p = platform();
    let comment = |table: &str, column: &str| {
        p.comment_on_column_sql(&Identifier::new(table), &Identifier::new(column), Some("comment"))
            .unwrap()
    };
    assert_eq!(comment("foo", "bar"), "COMMENT ON COLUMN foo.bar IS 'comment'");
    assert_eq!(comment("\"Foo\"", "\"BAR\""), "COMMENT ON COLUMN \"Foo\".\"BAR\" IS 'comment'");
    assert_eq!(comment("select", "from"), "COMMENT ON COLUMN \"select\".\"from\" IS 'comment'");
    assert_eq!(
        p.comment_on_column_sql(&Identifier::new("foo"), &Identifier::new("bar"), None).unwrap(),
        "COMMENT ON COLUMN foo.bar IS ''"
    );
}

#[test]
fn statement_templates() {
    let p = platform();
    assert_unsupported(&p, p.regexp_expression_sql());
    assert_eq!(
        p.concat_expression_sql(&["column1", "column2", "column3"]),
        "column1 || column2 || column3"
    );
    assert_eq!(p.bit_and_comparison_expression("a", "b"), "BITAND(a, b)");
    assert_eq!(p.bit_or_comparison_expression("a", "b"), "(a-BITAND(a, b)+b)");
    assert_eq!(p.create_database_sql("foobar").unwrap(), "CREATE USER foobar");
    assert_eq!(p.drop_database_sql("foobar").unwrap(), "DROP USER foobar CASCADE");
    assert_eq!(p.drop_table_sql("foobar"), "DROP TABLE foobar");
    assert_eq!(p.truncate_table_sql("select"), "TRUNCATE TABLE \"select\"");
}

#[test]
fn transaction_isolation() {
    let p = platform();
    for (level, expected) in [
        (TransactionIsolationLevel::ReadUncommitted, "READ UNCOMMITTED"),
        (TransactionIsolationLevel::ReadCommitted, "READ COMMITTED"),
        (TransactionIsolationLevel::RepeatableRead, "SERIALIZABLE"),
        (TransactionIsolationLevel::Serializable, "SERIALIZABLE"),
    ] {
        assert_eq!(
            p.set_transaction_isolation_sql(level),
            format!("SET TRANSACTION ISOLATION LEVEL {expected}")
        );
    }
}

#[test]
fn database_type_mappings() {
    let p = platform();
    let types = p.type_registry();
    assert!(types.has_db_type("long raw"));
    assert_eq!(types.abstract_type("long raw"), Some(ColumnType::Blob));
    assert_eq!(types.abstract_type("raw"), Some(ColumnType::Binary));
    assert_eq!(types.abstract_type("date"), Some(ColumnType::Date));
    assert_eq!(
        p.type_declaration_sql(&Column::new("g", ColumnType::Guid)).unwrap(),
        "CHAR(36)"
    );
}

#[test]
fn sequence_cache_clause() {
    let p = platform();
    for (cache, expected) in [(1, "NOCACHE"), (0, "NOCACHE"), (3, "CACHE 3")] {
        let sql = p.create_sequence_sql(&Sequence::new("foo").cache(cache)).unwrap();
        assert!(sql.contains(expected), "{sql} lacks {expected}");
    }
}

// =============================================================================
// ALTER TABLE
// =============================================================================

#[test]
fn alter_table_from_comparator() {
    let p = platform();
    let old = table(
        "mytable",
        vec![
            integer("id"),
            integer("foo"),
            string("baz", 255).nullable(),
            Column::new("bloo", ColumnType::Boolean).nullable(),
        ],
    );
    let new = table(
        "userlist",
        vec![
            integer("id"),
            string("baz", 255).default(DefaultValue::String("def".into())),
            Column::new("bloo", ColumnType::Boolean).default(DefaultValue::Boolean(false)),
            integer("quota").nullable(),
        ],
    );
    assert_eq!(
        alter(&p, &old, &new),
        vec![
            "ALTER TABLE mytable ADD (quota NUMBER(10) DEFAULT NULL NULL)",
            "ALTER TABLE mytable MODIFY (baz VARCHAR2(255) DEFAULT 'def' NOT NULL, bloo NUMBER(1) DEFAULT 0 NOT NULL)",
            "ALTER TABLE mytable DROP (foo)",
            "ALTER TABLE mytable RENAME TO userlist",
        ]
    );
}

#[test]
fn alter_string_to_fixed_string() {
    let p = platform();
    let old = table("mytable", vec![string("name", 2).nullable()]);
    let new = table("mytable", vec![string("name", 2).fixed(true).nullable()]);
    assert_eq!(
        alter(&p, &old, &new),
        vec!["ALTER TABLE mytable MODIFY (name CHAR(2) DEFAULT NULL)"]
    );
}

#[test]
fn alter_column_comment_with_quoted_identifiers() {
    let p = platform();
    let old = table("\"foo\"", vec![integer("\"bar\"")]);
    let new = table("\"foo\"", vec![integer("\"bar\"").comment("baz")]);
    assert_eq!(alter(&p, &old, &new), vec!["COMMENT ON COLUMN \"foo\".\"bar\" IS 'baz'"]);
}

#[test]
fn alter_quoted_table_renames_last() {
    let p = platform();
    let fk = |local: &str, foreign: &str, name: &str| {
        ForeignKeyConstraint::new(&[local], foreign, &["id"]).named(name)
    };
    let bar_old = integer("bar");
    let bar_new = integer("bar").nullable();

    let mut table_diff = TableDiff::new(Identifier::new("\"foo\""));
    table_diff.new_name = Some(Identifier::new("\"table\""));
    table_diff.added_columns = vec![integer("bloo")];
    table_diff.changed_columns = vec![ColumnDiff {
        old: bar_old,
        new: bar_new,
        changed_properties: vec![ColumnProperty::Nullable],
    }];
    table_diff.renamed_columns = vec![RenamedColumn {
        old: Identifier::new("id"),
        new: integer("war"),
    }];
    table_diff.removed_columns = vec![integer("baz")];
    table_diff.removed_foreign_keys = vec![fk("fk1", "fk_table", "fk1")];
    table_diff.changed_foreign_keys = vec![fk("fk2", "fk_table2", "fk2")];
    table_diff.added_foreign_keys = vec![fk("fk3", "fk_table", "fk_add")];

    assert_eq!(
        p.alter_table_sql(&table_diff).unwrap(),
        vec![
            "ALTER TABLE \"foo\" DROP CONSTRAINT fk1",
            "ALTER TABLE \"foo\" DROP CONSTRAINT fk2",
            "ALTER TABLE \"foo\" ADD (bloo NUMBER(10) NOT NULL)",
            "ALTER TABLE \"foo\" RENAME COLUMN id TO war",
            "ALTER TABLE \"foo\" MODIFY (bar NUMBER(10) DEFAULT NULL NULL)",
            "ALTER TABLE \"foo\" DROP (baz)",
            "ALTER TABLE \"foo\" ADD CONSTRAINT fk_add FOREIGN KEY (fk3) REFERENCES fk_table (id)",
            "ALTER TABLE \"foo\" ADD CONSTRAINT fk2 FOREIGN KEY (fk2) REFERENCES fk_table2 (id)",
            "ALTER TABLE \"foo\" RENAME TO \"table\"",
        ]
    );
}

#[test]
fn alter_adds_autoincrement_column() {
    let p = platform();
    let old = table("orders", vec![string("code", 10)]);
    let new = table("orders", vec![string("code", 10), integer("id").autoincrement(true)]);

    let mut expected = vec!["ALTER TABLE orders ADD (id NUMBER(10) NOT NULL)".to_string()];
    expected.extend(expected_autoincrement("ORDERS", "ID", "ORDERS", "ORDERS_SEQ"));
    assert_eq!(alter(&p, &old, &new), expected);
}

#[test]
fn alter_drops_autoincrement_column() {
    let p = platform();
    let old = table("orders", vec![string("code", 10), integer("id").autoincrement(true)]);
    let new = table("orders", vec![string("code", 10)]);
    assert_eq!(
        alter(&p, &old, &new),
        vec![
            "DROP TRIGGER ORDERS_AI_PK",
            "DROP SEQUENCE ORDERS_SEQ",
            "ALTER TABLE ORDERS DROP CONSTRAINT ORDERS_AI_PK",
            "ALTER TABLE orders DROP (id)",
        ]
    );
}

#[test]
fn alter_toggles_autoincrement() {
    let p = platform();
    let plain = table("orders", vec![integer("id")]);
    let auto = table("orders", vec![integer("id").autoincrement(true)]);

    let mut expected = Vec::new();
    expected.extend(expected_autoincrement("ORDERS", "ID", "ORDERS", "ORDERS_SEQ"));
    assert_eq!(alter(&p, &plain, &auto), expected);

    assert_eq!(
        alter(&p, &auto, &plain),
        vec![
            "DROP TRIGGER ORDERS_AI_PK",
            "DROP SEQUENCE ORDERS_SEQ",
            "ALTER TABLE ORDERS DROP CONSTRAINT ORDERS_AI_PK",
        ]
    );
}

#[test]
fn binary_fixed_and_variable_are_equivalent() {
    let p = platform();
    let binary = |name: &str, fixed: bool| {
        Column::new(name, ColumnType::Binary).length(32).fixed(fixed)
    };
    let old = table(
        "mytable",
        vec![binary("column_varbinary", false), binary("column_binary", true)],
    );
    let new = table(
        "mytable",
        vec![binary("column_varbinary", true), binary("column_binary", false)],
    );
    assert_eq!(Comparator::new(&p).diff_table(&old, &new).unwrap(), None);

    // The same change is real where the declarations differ.
    let sqlite = SqlitePlatform::new();
    assert_eq!(Comparator::new(&sqlite).diff_table(&old, &new).unwrap(), None);
    let postgres = PostgresPlatform::new();
    let changed = diff(
        &postgres,
        &table("t", vec![string("s", 10)]),
        &table("t", vec![string("s", 10).fixed(true)]),
    );
    assert_eq!(
        changed.changed_columns[0].changed_properties,
        vec![ColumnProperty::Fixed]
    );
}
