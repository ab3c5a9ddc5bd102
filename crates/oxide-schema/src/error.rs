//! Error types for schema modelling and DDL generation.

/// Errors raised while building schema objects or generating SQL.
///
/// Every variant names the offending entity so the caller can report it
/// without inspecting partial output; generation never returns a partial
/// statement list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A variable or fixed length type was declared without a length on a
    /// platform that needs one.
    #[error("Column '{column}' of type {column_type} requires a length on {platform}")]
    ColumnLengthRequired {
        /// Platform that rejected the declaration, or `"every platform"`.
        platform: &'static str,
        /// Column name.
        column: String,
        /// Abstract type of the column.
        column_type: String,
    },

    /// Decimal scale exceeds its precision.
    #[error("Column '{column}' has scale {scale} greater than precision {precision}")]
    InvalidPrecision {
        /// Column name.
        column: String,
        /// Declared precision.
        precision: u32,
        /// Declared scale.
        scale: u32,
    },

    /// An asset was given an empty name.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// Kind of asset ("Table", "Column", ...).
        kind: &'static str,
    },

    /// Two columns of one table share a name.
    #[error("Column '{column}' already exists on table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Two tables of one schema share a name.
    #[error("Table '{0}' already exists in the schema")]
    DuplicateTable(String),

    /// Two indexes of one table share a name.
    #[error("Index '{index}' already exists on table '{table}'")]
    DuplicateIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// Two sequences of one schema share a name.
    #[error("Sequence '{0}' already exists in the schema")]
    DuplicateSequence(String),

    /// An index or foreign key references a column the table does not have.
    #[error("{constraint} on table '{table}' references unknown column '{column}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Index or foreign key description.
        constraint: String,
        /// Missing column.
        column: String,
    },

    /// An index name that does not exist on the table.
    #[error("Index '{index}' does not exist on table '{table}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// An index without columns.
    #[error("Index '{index}' on table '{table}' has no columns")]
    EmptyIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// Local and referenced column lists of a foreign key do not line up.
    #[error(
        "Foreign key '{name}' on table '{table}' has {local} local column(s) but {foreign} referenced column(s)"
    )]
    ForeignKeyColumnMismatch {
        /// Table name.
        table: String,
        /// Constraint name (may be empty).
        name: String,
        /// Number of local columns.
        local: usize,
        /// Number of referenced columns.
        foreign: usize,
    },

    /// A constraint has to be addressed by name but has none.
    #[error("Foreign key on table '{table}' has no name and cannot be {action}")]
    UnnamedConstraint {
        /// Table name.
        table: String,
        /// What was attempted ("dropped", "renamed").
        action: &'static str,
    },

    /// A sequence with a non-positive increment.
    #[error("Sequence '{0}' must have a positive increment")]
    InvalidSequence(String),

    /// The platform has no way to express the request.
    #[error("{operation} is not supported by the {platform} platform")]
    UnsupportedOperation {
        /// Platform name.
        platform: &'static str,
        /// Requested operation.
        operation: String,
    },

    /// Platform name that does not match any known dialect.
    #[error("Unknown platform '{0}', expected one of: oracle, postgresql, sqlite")]
    UnknownPlatform(String),

    /// Referential action that is not one of the five standard actions.
    #[error("Unknown referential action '{0}'")]
    UnknownReferentialAction(String),
}

impl SchemaError {
    /// Shorthand for [`SchemaError::UnsupportedOperation`].
    pub(crate) fn unsupported(platform: &'static str, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            platform,
            operation: operation.into(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
