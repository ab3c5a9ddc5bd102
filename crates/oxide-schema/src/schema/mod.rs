//! Dialect independent schema model.
//!
//! A [`Schema`] owns its [`Table`]s and [`Sequence`]s. Every builder
//! validates its input, so a schema that was built (or deserialized)
//! successfully can be handed to any [`Platform`].

mod column;
mod foreign_key;
mod index;
mod sequence;
mod table;

pub use column::{Column, DefaultValue};
pub use foreign_key::{ForeignKeyConstraint, ReferentialAction};
pub use index::{Index, PRIMARY_KEY_NAME};
pub use sequence::Sequence;
pub use table::{generate_identifier_name, Table, MAX_GENERATED_NAME_LENGTH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;
use crate::platform::{CreateFlags, Platform};

/// A collection of tables and sequences keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDef", into = "SchemaDef")]
pub struct Schema {
    tables: IndexMap<String, Table>,
    sequences: IndexMap<String, Sequence>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    ///
    /// # Errors
    ///
    /// The table fails [`Table::validate`] or its name is taken.
    pub fn add_table(&mut self, table: Table) -> Result<&mut Self> {
        table.validate()?;
        let key = table.name().key();
        if self.tables.contains_key(&key) {
            return Err(SchemaError::DuplicateTable(table.name().to_string()));
        }
        self.tables.insert(key, table);
        Ok(self)
    }

    /// Looks a table up by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&Identifier::new(name).key())
    }

    /// Mutable access to a table.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&Identifier::new(name).key())
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Removes a table.
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.shift_remove(&Identifier::new(name).key())
    }

    /// Adds a sequence.
    ///
    /// # Errors
    ///
    /// The sequence fails [`Sequence::validate`] or its name is taken.
    pub fn add_sequence(&mut self, sequence: Sequence) -> Result<&mut Self> {
        sequence.validate()?;
        let key = sequence.name.key();
        if self.sequences.contains_key(&key) {
            return Err(SchemaError::DuplicateSequence(sequence.name.to_string()));
        }
        self.sequences.insert(key, sequence);
        Ok(self)
    }

    /// Looks a sequence up by name.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get(&Identifier::new(name).key())
    }

    /// Sequences in insertion order.
    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.values()
    }

    /// Removes a sequence.
    pub fn remove_sequence(&mut self, name: &str) -> Option<Sequence> {
        self.sequences.shift_remove(&Identifier::new(name).key())
    }

    /// Re-checks every table and sequence.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate(&self) -> Result<()> {
        for table in self.tables.values() {
            table.validate()?;
        }
        for sequence in self.sequences.values() {
            sequence.validate()?;
        }
        Ok(())
    }

    /// Script creating the whole schema: sequences, tables, then foreign
    /// keys, so tables may reference each other in any order. Dialects that
    /// cannot add foreign keys later get them inline instead.
    ///
    /// # Errors
    ///
    /// The first generation error.
    pub fn to_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        let inline_foreign_keys = !platform.capabilities().supports_foreign_key_alteration;
        let mut sql = Vec::new();

        for sequence in self.sequences.values() {
            sql.push(platform.create_sequence_sql(sequence)?);
        }
        let flags = CreateFlags {
            indexes: true,
            foreign_keys: inline_foreign_keys,
        };
        for table in self.tables.values() {
            sql.extend(platform.create_table_sql_with(table, flags)?);
        }
        if !inline_foreign_keys {
            for table in self.tables.values() {
                for fk in table.foreign_keys() {
                    sql.push(platform.create_foreign_key_sql(fk, table.name())?);
                }
            }
        }

        debug!(
            platform = platform.name(),
            tables = self.tables.len(),
            statements = sql.len(),
            "generated create schema script"
        );
        Ok(sql)
    }

    /// Script dropping the whole schema: foreign keys first where the
    /// dialect can drop them, then tables, then sequences.
    ///
    /// # Errors
    ///
    /// The first generation error.
    pub fn to_drop_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        if platform.capabilities().supports_foreign_key_alteration {
            for table in self.tables.values() {
                for fk in table.foreign_keys() {
                    sql.push(platform.drop_foreign_key_sql(fk, table.name())?);
                }
            }
        }
        for table in self.tables.values().rev() {
            sql.push(platform.drop_table_sql(&table.name().to_string()));
        }
        for sequence in self.sequences.values() {
            sql.push(platform.drop_sequence_sql(sequence)?);
        }
        debug!(
            platform = platform.name(),
            statements = sql.len(),
            "generated drop schema script"
        );
        Ok(sql)
    }
}

/// Serialized shape of a [`Schema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDef {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sequences: Vec<Sequence>,
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDef) -> Result<Self> {
        let mut schema = Self::new();
        for table in def.tables {
            schema.add_table(table)?;
        }
        for sequence in def.sequences {
            schema.add_sequence(sequence)?;
        }
        Ok(schema)
    }
}

impl From<Schema> for SchemaDef {
    fn from(schema: Schema) -> Self {
        Self {
            tables: schema.tables.into_values().collect(),
            sequences: schema.sequences.into_values().collect(),
        }
    }
}
