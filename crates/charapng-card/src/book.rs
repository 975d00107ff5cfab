//! World book export and human-facing JSON output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::naming::safe_file_stem;
use crate::persist::write_atomic;
use crate::record::CharacterRecord;
use crate::{Error, Result};

/// Book name used when a book has none.
pub const DEFAULT_BOOK_NAME: &str = "WorldBook";

/// Character name used when a record has none.
pub const UNKNOWN_CHARACTER: &str = "UnknownChar";

/// Serialize `value` as JSON indented with four spaces.
///
/// Non-ASCII characters are written as-is.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;

    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write `value` to `path` as pretty JSON.
pub fn write_pretty_json<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    write_atomic(path.as_ref(), to_pretty_json(value)?.as_bytes())
}

/// The file name a record's world book is exported under.
pub fn book_file_name(record: &CharacterRecord) -> Result<String> {
    let book = record.character_book().ok_or(Error::NoBook)?;

    let character = record
        .data
        .as_ref()
        .and_then(|d| d.name.as_deref())
        .or(record.name.as_deref())
        .unwrap_or(UNKNOWN_CHARACTER);
    let book_name = book.name.as_deref().unwrap_or(DEFAULT_BOOK_NAME);

    Ok(format!(
        "{}-{}.json",
        safe_file_stem(character, UNKNOWN_CHARACTER),
        safe_file_stem(book_name, DEFAULT_BOOK_NAME)
    ))
}

/// Write the record's world book into `dir`, returning the file path.
///
/// An existing file with the same name is overwritten.
pub fn export_book<P: AsRef<Path>>(record: &CharacterRecord, dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let book = record.character_book().ok_or(Error::NoBook)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(book_file_name(record)?);
    write_pretty_json(&path, book)?;

    info!(path = %path.display(), entries = book.entries.len(), "exported world book");
    Ok(path)
}
