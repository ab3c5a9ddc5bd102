//! Reserved word registries.
//!
//! Each platform owns one [`KeywordList`], built once when the platform is
//! constructed and never mutated afterwards. The quoting service consults
//! it to decide whether a bare name must be quoted; tooling can use it
//! through [`ReservedWordsValidator`] to warn about risky names up front.

mod oracle;
mod postgres;
mod sqlite;
mod validator;

use std::collections::HashSet;

pub use validator::{KeywordViolation, ReservedWordsValidator};

/// An immutable, case-insensitive set of reserved words.
#[derive(Debug, Clone)]
pub struct KeywordList {
    name: &'static str,
    words: HashSet<&'static str>,
}

impl KeywordList {
    /// Builds a list from upper-case words.
    #[must_use]
    pub fn new(name: &'static str, words: &[&'static str]) -> Self {
        Self {
            name,
            words: words.iter().copied().collect(),
        }
    }

    /// Oracle reserved words.
    #[must_use]
    pub fn oracle() -> Self {
        Self::new("oracle", oracle::KEYWORDS)
    }

    /// PostgreSQL reserved words.
    #[must_use]
    pub fn postgres() -> Self {
        Self::new("postgresql", postgres::KEYWORDS)
    }

    /// SQLite keywords.
    #[must_use]
    pub fn sqlite() -> Self {
        Self::new("sqlite", sqlite::KEYWORDS)
    }

    /// Name of the platform the list belongs to.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.words.contains(word.to_ascii_uppercase().as_str())
    }

    /// Number of words in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
