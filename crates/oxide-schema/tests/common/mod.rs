#![allow(dead_code)]

use oxide_schema::prelude::*;

pub fn integer(name: &str) -> Column {
    Column::new(name, ColumnType::Integer)
}

pub fn string(name: &str, length: u32) -> Column {
    Column::new(name, ColumnType::String).length(length)
}

/// Builds a table from columns, panicking on invalid input.
pub fn table(name: &str, columns: Vec<Column>) -> Table {
    let mut table = Table::new(name);
    for column in columns {
        table
            .add_column(column)
            .unwrap_or_else(|e| panic!("Failed to add column to {name}: {e}"));
    }
    table
}

/// Diffs two snapshots, panicking when they are equivalent.
pub fn diff(platform: &dyn Platform, old: &Table, new: &Table) -> TableDiff {
    Comparator::new(platform)
        .diff_table(old, new)
        .unwrap_or_else(|e| panic!("Failed to diff {}: {e}", old.name()))
        .unwrap_or_else(|| panic!("Expected a diff for {}", old.name()))
}

/// Alters `old` into `new` and returns the script.
pub fn alter(platform: &dyn Platform, old: &Table, new: &Table) -> Vec<String> {
    platform
        .alter_table_sql(&diff(platform, old, new))
        .unwrap_or_else(|e| panic!("Failed to alter {}: {e}", old.name()))
}

/// Asserts that the platform refuses with `UnsupportedOperation`.
pub fn assert_unsupported<T: std::fmt::Debug>(platform: &dyn Platform, result: Result<T>) {
    match result {
        Err(SchemaError::UnsupportedOperation { platform: name, .. }) => {
            assert_eq!(name, platform.name());
        }
        other => panic!("Expected UnsupportedOperation, got {other:?}"),
    }
}
