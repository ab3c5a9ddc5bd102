//! Names of schema assets.
//!
//! An [`Identifier`] remembers whether the caller wrote the name in quotes.
//! Quoting is sticky: a quoted identifier is rendered quoted by every
//! platform, in every statement. Unquoted identifiers are quoted only when
//! the platform needs it (reserved word, characters outside the bare
//! identifier charset). Rendering lives on
//! [`Platform::quote_identifier_of`](crate::platform::Platform::quote_identifier_of).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quote character shared by every supported dialect.
pub const QUOTE: char = '"';

/// A possibly namespaced, possibly quoted asset name.
///
/// `Identifier::new("\"Users\"")` yields the name `Users` with the quoted
/// flag set; `Identifier::new("app.users")` keeps the dotted name and
/// exposes `app` as its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier {
    name: String,
    quoted: bool,
}

impl Identifier {
    /// Parses a name as written by the caller.
    ///
    /// A leading `"` marks the whole identifier as quoted; quote
    /// characters are stripped and doubled quotes collapse to one.
    #[must_use]
    pub fn new(input: &str) -> Self {
        if !input.starts_with(QUOTE) {
            return Self {
                name: input.to_string(),
                quoted: false,
            };
        }

        let mut name = String::with_capacity(input.len());
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            if c == QUOTE {
                if in_quotes && chars.peek() == Some(&QUOTE) {
                    chars.next();
                    name.push(QUOTE);
                } else {
                    in_quotes = !in_quotes;
                }
            } else {
                name.push(c);
            }
        }
        Self { name, quoted: true }
    }

    /// Creates an identifier that is always rendered quoted.
    #[must_use]
    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }

    /// Creates an identifier that is never marked as quoted, without
    /// interpreting quote characters.
    #[must_use]
    pub fn unquoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    /// The name without quote characters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller asked for this name to be quoted.
    #[must_use]
    pub const fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Whether the name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Dot separated parts of the name.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Everything before the last dot, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// The last dot separated part.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(&self.name, |(_, short)| short)
    }

    /// Lower-cased name used to match assets across snapshots.
    #[must_use]
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// Returns a copy with a new name and the same quoting.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: self.quoted,
        }
    }
}

impl fmt::Display for Identifier {
    /// Writes the name as the caller would have written it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.quoted {
            return f.write_str(&self.name);
        }
        for (i, part) in self.parts().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{QUOTE}{}{QUOTE}", part.replace(QUOTE, "\"\""))?;
        }
        Ok(())
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name() {
        let id = Identifier::new("users");
        assert_eq!(id.name(), "users");
        assert!(!id.is_quoted());
        assert_eq!(id.to_string(), "users");
    }

    #[test]
    fn test_quoted_name_is_unwrapped() {
        let id = Identifier::new("\"test\"");
        assert_eq!(id.name(), "test");
        assert!(id.is_quoted());
        assert_eq!(id.to_string(), "\"test\"");
    }

    #[test]
    fn test_doubled_quotes_collapse() {
        let id = Identifier::new("\"say \"\"hi\"\"\"");
        assert_eq!(id.name(), "say \"hi\"");
        assert_eq!(id.to_string(), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_namespaced_name() {
        let id = Identifier::new("\"schema\".\"create\"");
        assert_eq!(id.name(), "schema.create");
        assert_eq!(id.namespace(), Some("schema"));
        assert_eq!(id.short_name(), "create");
        assert_eq!(id.parts().collect::<Vec<_>>(), vec!["schema", "create"]);
        assert_eq!(id.to_string(), "\"schema\".\"create\"");

        let bare = Identifier::new("myschema.mytable");
        assert_eq!(bare.namespace(), Some("myschema"));
        assert_eq!(Identifier::new("mytable").namespace(), None);
    }

    #[test]
    fn test_matching_ignores_case() {
        assert!(Identifier::new("Users").matches(&Identifier::new("USERS")));
        assert!(!Identifier::new("users").matches(&Identifier::new("user")));
        assert_eq!(Identifier::new("MyTable").key(), "mytable");
    }

    #[test]
    fn test_serde_keeps_quoting() {
        let id: Identifier = serde_json::from_str("\"\\\"select\\\"\"").unwrap();
        assert!(id.is_quoted());
        assert_eq!(id.name(), "select");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"\\\"select\\\"\"");
    }
}
