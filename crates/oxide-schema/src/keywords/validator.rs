//! Schema-wide reserved word check.

use std::fmt;

use crate::identifier::Identifier;
use crate::schema::Schema;

use super::KeywordList;

/// A bare name that collides with a reserved word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordViolation {
    /// Where the name appears, e.g. `Table posts column order`.
    pub location: String,
    /// The offending word as written.
    pub word: String,
    /// Platforms that reserve the word.
    pub platforms: Vec<&'static str>,
}

impl fmt::Display for KeywordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} keyword violations: {}",
            self.location,
            self.platforms.join(", ")
        )?;
        write!(f, " (word '{}')", self.word)
    }
}

/// Reports unquoted names that are reserved on any of its keyword lists.
///
/// Quoted names are skipped: the caller already took care of them.
#[derive(Debug, Clone)]
pub struct ReservedWordsValidator {
    lists: Vec<KeywordList>,
}

impl ReservedWordsValidator {
    /// Creates a validator over the given lists.
    #[must_use]
    pub const fn new(lists: Vec<KeywordList>) -> Self {
        Self { lists }
    }

    /// Checks every table, column, index, foreign key and sequence name.
    #[must_use]
    pub fn validate(&self, schema: &Schema) -> Vec<KeywordViolation> {
        let mut violations = Vec::new();

        for table in schema.tables() {
            let table_name = table.name().to_string();
            self.check(&mut violations, table.name(), || format!("Table {table_name}"));

            for column in table.columns() {
                self.check(&mut violations, &column.name, || {
                    format!("Table {table_name} column {}", column.name)
                });
            }
            for index in table.indexes() {
                self.check(&mut violations, &index.name, || {
                    format!("Table {table_name} index {}", index.name)
                });
            }
            for fk in table.foreign_keys() {
                self.check(&mut violations, &fk.name, || {
                    format!("Table {table_name} foreign key {}", fk.name)
                });
            }
        }
        for sequence in schema.sequences() {
            self.check(&mut violations, &sequence.name, || {
                format!("Sequence {}", sequence.name)
            });
        }

        violations
    }

    fn check(
        &self,
        violations: &mut Vec<KeywordViolation>,
        identifier: &Identifier,
        location: impl Fn() -> String,
    ) {
        if identifier.is_quoted() {
            return;
        }
        for part in identifier.parts() {
            let platforms: Vec<&'static str> = self
                .lists
                .iter()
                .filter(|list| list.is_keyword(part))
                .map(KeywordList::name)
                .collect();
            if !platforms.is_empty() {
                violations.push(KeywordViolation {
                    location: location(),
                    word: part.to_string(),
                    platforms,
                });
            }
        }
    }
}
