//! Sequences.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::identifier::Identifier;

const fn one() -> i64 {
    1
}

const fn one_u32() -> u32 {
    1
}

/// A sequence generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: Identifier,
    /// First value, also used as the minimum.
    #[serde(default = "one")]
    pub initial_value: i64,
    /// Step between values. Must be positive.
    #[serde(default = "one_u32")]
    pub increment: u32,
    /// Number of values the engine pre-allocates. `Some(0)` and `Some(1)`
    /// disable caching; `None` leaves the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<u32>,
}

impl Sequence {
    /// Creates a sequence starting at 1 with increment 1.
    #[must_use]
    pub fn new(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            initial_value: 1,
            increment: 1,
            cache: None,
        }
    }

    /// Sets the first value.
    #[must_use]
    pub fn start_with(mut self, initial_value: i64) -> Self {
        self.initial_value = initial_value;
        self
    }

    /// Sets the increment.
    #[must_use]
    pub fn increment_by(mut self, increment: u32) -> Self {
        self.increment = increment;
        self
    }

    /// Sets the cache size.
    #[must_use]
    pub fn cache(mut self, cache: u32) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Whether the engine should keep no cache.
    #[must_use]
    pub fn is_uncached(&self) -> bool {
        matches!(self.cache, Some(0 | 1))
    }

    /// Checks the name and the increment.
    ///
    /// # Errors
    ///
    /// [`SchemaError::EmptyName`] or [`SchemaError::InvalidSequence`].
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "Sequence" });
        }
        if self.increment == 0 {
            return Err(SchemaError::InvalidSequence(self.name.to_string()));
        }
        Ok(())
    }

    /// Whether an `ALTER SEQUENCE` is needed to turn `self` into `other`.
    /// Only the increment and the cache can be altered in place.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.increment != other.increment || self.cache != other.cache
    }
}
