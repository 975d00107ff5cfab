//! The on-disk card workspace.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::encode::encode_bytes;
use crate::naming::{safe_file_stem, unique_path};
use crate::persist::write_atomic;
use crate::record::{CardData, CharacterRecord};
use crate::Result;

/// Directory holding character cards, relative to the workspace root.
pub const CARDS_DIR: &str = "Character_Cards";

/// Directory holding exported world books, relative to the workspace root.
pub const BOOKS_DIR: &str = "World_Books";

/// A workspace with a card directory and a world book directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardWorkspace {
    root: PathBuf,
}

impl CardWorkspace {
    /// Create a workspace rooted at `root`. Nothing is created on disk.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where cards are stored.
    pub fn cards_dir(&self) -> PathBuf {
        self.root.join(CARDS_DIR)
    }

    /// Where world books are exported.
    pub fn books_dir(&self) -> PathBuf {
        self.root.join(BOOKS_DIR)
    }

    /// Create the card and book directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.cards_dir())?;
        fs::create_dir_all(self.books_dir())?;
        Ok(())
    }

    /// Create a new V2 card from `data` using `image` as the picture.
    ///
    /// The card is stored in the card directory under a unique name derived
    /// from the character name. Nothing is written if `image` is not a
    /// complete PNG.
    pub fn create_card<P: AsRef<Path>>(&self, image: P, data: CardData) -> Result<PathBuf> {
        let image = image.as_ref();
        let record = CharacterRecord::new_v2(data);

        let png = fs::read(image)?;
        let rewritten = encode_bytes(&png, &record)?;

        self.ensure_dirs()?;
        let stem = safe_file_stem(record.display_name(), "Unnamed");
        let dest = unique_path(&self.cards_dir(), &stem, "png");
        write_atomic(&dest, &rewritten.bytes)?;

        info!(
            path = %dest.display(),
            image = %image.display(),
            name = record.display_name(),
            "created card"
        );
        Ok(dest)
    }
}
