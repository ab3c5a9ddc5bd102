//! Command implementations, kept free of argument parsing so they can be
//! tested directly.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use oxide_schema::prelude::*;

/// Reads and validates a JSON schema file.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    let schema: Schema = serde_json::from_str(&text)
        .with_context(|| format!("Invalid schema in {}", path.display()))?;
    debug!(
        path = %path.display(),
        tables = schema.tables().count(),
        sequences = schema.sequences().count(),
        "loaded schema"
    );
    Ok(schema)
}

/// Script creating the schema stored at `path`.
pub fn create(platform: &dyn Platform, path: &Path) -> anyhow::Result<Vec<String>> {
    let schema = load_schema(path)?;
    schema
        .to_sql(platform)
        .with_context(|| format!("Cannot create {} on {}", path.display(), platform.name()))
}

/// Migration script turning the schema at `from` into the one at `to`.
pub fn diff(
    platform: &dyn Platform,
    from: &Path,
    to: &Path,
    detect_renamed_columns: bool,
) -> anyhow::Result<Vec<String>> {
    let old = load_schema(from)?;
    let new = load_schema(to)?;
    let diff = Comparator::new(platform)
        .detect_renamed_columns(detect_renamed_columns)
        .compare_schemas(&old, &new)?;
    diff.to_sql(platform).with_context(|| {
        format!(
            "Cannot migrate {} to {} on {}",
            from.display(),
            to.display(),
            platform.name()
        )
    })
}

/// Reserved word violations of the schema at `path` for the given
/// platforms, or for every platform when none are given.
pub fn reserved_words(
    path: &Path,
    kinds: &[PlatformKind],
) -> anyhow::Result<Vec<KeywordViolation>> {
    let schema = load_schema(path)?;
    let kinds: &[PlatformKind] = if kinds.is_empty() {
        &PlatformKind::ALL
    } else {
        kinds
    };
    let lists = kinds.iter().map(|kind| kind.keywords()).collect();
    Ok(ReservedWordsValidator::new(lists).validate(&schema))
}

/// Writes statements one per line, each terminated by `;`.
pub fn write_statements(out: &mut impl Write, statements: &[String]) -> io::Result<()> {
    for statement in statements {
        writeln!(out, "{statement};")?;
    }
    out.flush()
}
