//! Portable database schemas for Rust.
//!
//! `oxide-schema` describes tables, columns, indexes, foreign keys and
//! sequences once, and renders them as DDL for a specific dialect:
//! - Oracle, with autoincrement emulated by a sequence and a trigger
//! - PostgreSQL
//! - SQLite
//!
//! # Architecture
//!
//! - **Schema** - The dialect independent model (`Schema`, `Table`, `Column`, ...)
//! - **Identifier** - Names with sticky, caller-chosen quoting
//! - **Keywords** - Per dialect reserved words and a schema validator
//! - **Types** - Abstract column types and their per dialect spelling
//! - **Platform** - DDL generation strategy, one struct per dialect
//! - **Diff** - Snapshot comparison and migration scripts
//!
//! Every generator returns the statements as an ordered `Vec<String>`
//! without terminators, or an error; nothing is executed.
//!
//! # Example
//!
//! ```rust
//! use oxide_schema::prelude::*;
//!
//! let mut table = Table::new("users");
//! table
//!     .add_column(Column::new("id", ColumnType::Integer).autoincrement(true))?
//!     .add_column(Column::new("email", ColumnType::String).length(255))?
//!     .set_primary_key(&["id"])?;
//!
//! let sql = PostgresPlatform::new().create_table_sql(&table)?;
//! assert_eq!(
//!     sql,
//!     vec!["CREATE TABLE users (id SERIAL NOT NULL, email VARCHAR(255) NOT NULL, PRIMARY KEY(id))"]
//! );
//!
//! // Oracle emulates the autoincrement column.
//! let sql = OraclePlatform::new().create_table_sql(&table)?;
//! assert_eq!(sql.len(), 4);
//! # Ok::<(), oxide_schema::SchemaError>(())
//! ```

pub mod diff;
pub mod error;
pub mod identifier;
pub mod keywords;
pub mod platform;
pub mod schema;
pub mod types;

pub use error::{Result, SchemaError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diff::{ColumnDiff, ColumnProperty, Comparator, SchemaDiff, TableDiff};
    pub use crate::error::{Result, SchemaError};
    pub use crate::identifier::Identifier;
    pub use crate::keywords::{KeywordList, KeywordViolation, ReservedWordsValidator};
    pub use crate::platform::{
        Capabilities, CreateFlags, IdentifierCase, OraclePlatform, Platform, PlatformKind,
        PostgresPlatform, SqlitePlatform, TransactionIsolationLevel,
    };
    pub use crate::schema::{
        Column, DefaultValue, ForeignKeyConstraint, Index, ReferentialAction, Schema, Sequence,
        Table,
    };
    pub use crate::types::{ColumnType, TypeRegistry, TypeRule};
}
