//! Batch decoding and export of many card files.
//!
//! Decoding runs on rayon's thread pool when the `parallel` feature is
//! enabled. Results always come back in input order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::decode::{decode_file, DecodeOutcome};
use crate::naming::{safe_file_stem, unique_path};
use crate::Result;

/// File name stem for cards without a usable name.
const FALLBACK_STEM: &str = "Unnamed";

/// One decoded file of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEntry {
    pub path: PathBuf,
    pub outcome: DecodeOutcome,
}

impl CardEntry {
    /// The character name, or a placeholder describing why there is none.
    pub fn display_name(&self) -> &str {
        match &self.outcome {
            DecodeOutcome::Card(card) => card.record.display_name(),
            other => other.label(),
        }
    }

    /// Whether a card was decoded from this file.
    pub fn is_card(&self) -> bool {
        matches!(self.outcome, DecodeOutcome::Card(_))
    }
}

/// Statistics from a batch export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Number of cards copied.
    pub exported: usize,
    /// Number of files that were skipped or failed to copy.
    pub errors: usize,
    /// Total number of files attempted.
    pub total: usize,
}

impl ExportStats {
    /// Check if every file was exported.
    pub fn is_complete(&self) -> bool {
        self.errors == 0 && self.exported == self.total
    }
}

/// Every `.png` file under `dir`, sorted by path.
///
/// The extension match is case-insensitive. Unreadable directory entries are
/// skipped.
pub fn collect_pngs<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_png_extension(path))
        .collect();

    paths.sort();
    paths
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Decode every file in `paths`.
///
/// The progress callback receives (completed, total) counts. Failed files
/// become placeholder entries; the batch never aborts.
#[cfg(feature = "parallel")]
pub fn scan_cards<F>(paths: &[PathBuf], mut progress: F) -> Vec<CardEntry>
where
    F: FnMut(usize, usize) + Send,
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use rayon::prelude::*;

    let total = paths.len();
    let done = AtomicUsize::new(0);
    let progress = Mutex::new(&mut progress);

    let entries: Vec<CardEntry> = paths
        .par_iter()
        .map(|path| {
            let entry = scan_one(path);

            // The final count is reported once, after the pool drains
            let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
            if completed < total {
                if let Some(mut p) = progress.try_lock() {
                    (*p)(completed, total);
                }
            }

            entry
        })
        .collect();

    progress.lock()(total, total);
    log_scan_summary(&entries);
    entries
}

/// Decode every file in `paths`.
///
/// The progress callback receives (completed, total) counts. Failed files
/// become placeholder entries; the batch never aborts.
#[cfg(not(feature = "parallel"))]
pub fn scan_cards<F>(paths: &[PathBuf], mut progress: F) -> Vec<CardEntry>
where
    F: FnMut(usize, usize) + Send,
{
    let total = paths.len();

    let entries: Vec<CardEntry> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let entry = scan_one(path);
            progress(i + 1, total);
            entry
        })
        .collect();

    if total == 0 {
        progress(0, 0);
    }
    log_scan_summary(&entries);
    entries
}

fn scan_one(path: &Path) -> CardEntry {
    CardEntry {
        path: path.to_path_buf(),
        outcome: decode_file(path),
    }
}

fn log_scan_summary(entries: &[CardEntry]) {
    let cards = entries.iter().filter(|e| e.is_card()).count();
    info!(files = entries.len(), cards, "scan complete");
}

/// Copy each card in `paths` into `dir`, named after its character.
///
/// Files are copied unmodified. Name conflicts get `_1`, `_2`, ... suffixes.
/// Files without a card, or that fail to copy, count as errors.
pub fn export_cards<P: AsRef<Path>>(paths: &[PathBuf], dir: P) -> Result<ExportStats> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let entries = scan_cards(paths, |_, _| {});
    let mut stats = ExportStats {
        total: entries.len(),
        ..Default::default()
    };

    // Sequential so that conflict suffixes are assigned deterministically.
    for entry in &entries {
        let DecodeOutcome::Card(card) = &entry.outcome else {
            warn!(path = %entry.path.display(), reason = entry.outcome.label(), "skipping file");
            stats.errors += 1;
            continue;
        };

        let stem = safe_file_stem(card.record.display_name(), FALLBACK_STEM);
        let dest = unique_path(dir, &stem, "png");

        match fs::copy(&entry.path, &dest) {
            Ok(_) => {
                debug!(from = %entry.path.display(), to = %dest.display(), "exported card");
                stats.exported += 1;
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "failed to export card");
                stats.errors += 1;
            }
        }
    }

    info!(
        exported = stats.exported,
        errors = stats.errors,
        dir = %dir.display(),
        "export complete"
    );
    Ok(stats)
}
