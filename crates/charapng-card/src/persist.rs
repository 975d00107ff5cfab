//! Replace-by-rename file writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::Result;

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// The target is only replaced by the final rename, so a failed write leaves
/// any existing file untouched. An existing file keeps its permissions.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(file.path(), metadata.permissions())?;
    }

    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(entries(dir.path()), vec!["card.png"]);
    }

    #[test]
    fn test_original_inode_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        let snapshot = dir.path().join("snapshot.png");
        fs::write(&path, b"original").unwrap();
        fs::hard_link(&path, &snapshot).unwrap();

        write_atomic(&path, b"replacement").unwrap();

        // the old file was swapped out whole, not truncated and rewritten
        assert_eq!(fs::read(&snapshot).unwrap(), b"original");
        assert_eq!(fs::read(&path).unwrap(), b"replacement");
    }

    #[test]
    fn test_failed_rename_keeps_target_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), b"keep").unwrap();

        assert!(write_atomic(&target, b"new bytes").is_err());

        assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"keep");
        assert_eq!(entries(dir.path()), vec!["occupied"]);
    }
}
