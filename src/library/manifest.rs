//! JSON manifest backed photo library
//!
//! A manifest is a snapshot of a library's index:
//!
//! ```json
//! {
//!   "version": 1,
//!   "items": [
//!     {
//!       "id": "7F1C...",
//!       "captured_at": "2025-04-30T18:05:19",
//!       "favorite": true,
//!       "live": true,
//!       "selfie": false,
//!       "edited": false,
//!       "original_filename": "IMG_0001.HEIC",
//!       "path": "originals/IMG_0001.HEIC",
//!       "original_path": null,
//!       "live_video_path": "originals/IMG_0001.MOV"
//!     }
//!   ]
//! }
//! ```
//!
//! Relative asset paths are resolved against the manifest's directory.

use super::{LibraryItem, LibraryProvider};
use crate::config::FileOperation;
use crate::error::{Error, Result};
use crate::fsops::transfer_file;
use crate::range::DateRange;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk manifest record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub captured_at: NaiveDateTime,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub selfie: bool,
    #[serde(default)]
    pub edited: bool,
    pub original_filename: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub original_path: Option<PathBuf>,
    #[serde(default)]
    pub live_video_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    items: Vec<ManifestEntry>,
}

/// Library read from a manifest file
#[derive(Debug, Clone)]
pub struct ManifestLibrary {
    root: PathBuf,
    items: Vec<LibraryItem>,
    operation: FileOperation,
}

impl ManifestLibrary {
    /// Supported manifest format version
    pub const VERSION: u32 = 1;

    /// Open a manifest file
    ///
    /// Any failure here means the library cannot be used at all.
    pub fn open(path: &Path) -> Result<Self> {
        let open_error = |message: String| Error::LibraryOpen {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| open_error(format!("cannot read manifest: {}", e)))?;
        let manifest: Manifest = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| open_error(format!("cannot parse manifest: {}", e)))?;

        if manifest.version != Self::VERSION {
            return Err(open_error(format!(
                "unsupported manifest version {} (expected {})",
                manifest.version,
                Self::VERSION
            )));
        }

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!(
            manifest = %path.display(),
            items = manifest.items.len(),
            "Opened photo library"
        );

        Ok(Self::from_entries(root, manifest.items))
    }

    /// Build a library from entries, resolving relative paths against `root`
    pub fn from_entries(root: PathBuf, entries: Vec<ManifestEntry>) -> Self {
        let items = entries
            .into_iter()
            .map(|entry| LibraryItem {
                id: entry.id,
                captured_at: entry.captured_at,
                is_favorite: entry.favorite,
                is_live: entry.live,
                is_selfie: entry.selfie,
                is_edited: entry.edited,
                original_filename: entry.original_filename,
                still_path: entry.path.map(|p| root.join(p)),
                original_path: entry.original_path.map(|p| root.join(p)),
                motion_path: entry.live_video_path.map(|p| root.join(p)),
            })
            .collect();

        Self {
            root,
            items,
            operation: FileOperation::Copy,
        }
    }

    /// Use `operation` when materializing stills
    pub fn with_operation(mut self, operation: FileOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LibraryProvider for ManifestLibrary {
    fn items_in_range(&self, range: &DateRange) -> Result<Vec<LibraryItem>> {
        let items: Vec<LibraryItem> = self
            .items
            .iter()
            .filter(|item| range.contains(&item.captured_at))
            .cloned()
            .collect();
        debug!(count = items.len(), "Library items in range");
        Ok(items)
    }

    fn export_still(&self, item: &LibraryItem, dest: &Path) -> Result<()> {
        let source = item.best_still_path().ok_or_else(|| Error::MissingAsset {
            item: item.original_filename.clone(),
            component: "still",
        })?;
        transfer_file(source, dest, self.operation)
    }
}
