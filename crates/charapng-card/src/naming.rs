//! File name helpers for exported cards and books.

use std::path::{Path, PathBuf};

/// Turn a display name into a file stem.
///
/// Keeps alphanumerics, spaces, `-` and `_`, then trims. Returns `fallback`
/// if nothing is left.
pub fn safe_file_stem(name: &str, fallback: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = stem.trim();

    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}

/// Find a free path `dir/stem.ext`, appending `_1`, `_2`, ... on conflict.
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    (1u32..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
