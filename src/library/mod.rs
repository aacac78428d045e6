//! Photo library access and favorite selection
//!
//! The library itself is an external collaborator. The exporter only relies
//! on the narrow [`LibraryProvider`] interface and the read-only
//! [`LibraryItem`] records it hands out.

pub mod manifest;

use crate::config::FileOperation;
use crate::error::{Error, Result};
use crate::fsops::transfer_file;
use crate::range::DateRange;
use crate::status::RunContext;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use manifest::ManifestLibrary;

/// One photo or video as described by the library
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryItem {
    /// Library identifier, used only for logging
    pub id: String,
    /// Capture timestamp (local time)
    pub captured_at: NaiveDateTime,
    pub is_favorite: bool,
    pub is_live: bool,
    pub is_selfie: bool,
    pub is_edited: bool,
    /// Filename the asset was imported with, e.g. `IMG_0001.HEIC`
    pub original_filename: String,
    /// Canonical still asset (the edited rendition when edited)
    pub still_path: Option<PathBuf>,
    /// Pre-edit still asset, present for edited items
    pub original_path: Option<PathBuf>,
    /// Paired motion clip of a live photo
    pub motion_path: Option<PathBuf>,
}

impl LibraryItem {
    /// Best available still: the canonical asset, else the original
    pub fn best_still_path(&self) -> Option<&Path> {
        self.still_path
            .as_deref()
            .or(self.original_path.as_deref())
    }
}

/// Read-only view of a photo library
pub trait LibraryProvider {
    /// Items captured inside `range`, in the library's natural order
    fn items_in_range(&self, range: &DateRange) -> Result<Vec<LibraryItem>>;

    /// Materialize the best available still of `item` at `dest`
    fn export_still(&self, item: &LibraryItem, dest: &Path) -> Result<()> {
        let source = item.best_still_path().ok_or_else(|| Error::MissingAsset {
            item: item.original_filename.clone(),
            component: "still",
        })?;
        transfer_file(source, dest, FileOperation::Copy)
    }

    /// Resolve the on-disk motion clip of a live item, if any
    fn motion_path(&self, item: &LibraryItem) -> Option<PathBuf> {
        item.motion_path.as_ref().filter(|p| p.is_file()).cloned()
    }
}

/// Favorited items captured inside `range`, oldest first
///
/// Items sharing a timestamp keep the provider's enumeration order. A provider
/// failure is returned as-is; callers treat it as fatal.
pub fn select_favorites(
    ctx: &mut RunContext,
    provider: &dyn LibraryProvider,
    range: &DateRange,
) -> Result<Vec<LibraryItem>> {
    ctx.begin_status("Searching photos");
    let queried = provider.items_in_range(range);
    ctx.end_status();

    let mut favorites: Vec<LibraryItem> = queried?
        .into_iter()
        .filter(|item| item.is_favorite && range.contains(&item.captured_at))
        .collect();

    // sort_by_key is stable
    favorites.sort_by_key(|item| item.captured_at);

    debug!(count = favorites.len(), "Selected favorites");
    info!(
        count = favorites.len(),
        range = %range,
        "Found favorited items in the specified date range"
    );

    Ok(favorites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::resolve_month;
    use chrono::NaiveDate;

    struct FixedLibrary(Vec<LibraryItem>);

    impl LibraryProvider for FixedLibrary {
        fn items_in_range(&self, _range: &DateRange) -> Result<Vec<LibraryItem>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenLibrary;

    impl LibraryProvider for BrokenLibrary {
        fn items_in_range(&self, _range: &DateRange) -> Result<Vec<LibraryItem>> {
            Err(Error::LibraryOpen {
                path: PathBuf::from("Photos.photoslibrary"),
                message: "incompatible library version".into(),
            })
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn item(id: &str, captured_at: NaiveDateTime, favorite: bool) -> LibraryItem {
        LibraryItem {
            id: id.into(),
            captured_at,
            is_favorite: favorite,
            original_filename: format!("{}.JPG", id),
            ..LibraryItem::default()
        }
    }

    #[test]
    fn test_selects_favorites_in_range_ascending() {
        let library = FixedLibrary(vec![
            item("c", at(20, 9), true),
            item("a", at(2, 9), true),
            item("skip", at(3, 9), false),
            item("b", at(10, 9), true),
            item("march", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(), true),
        ]);
        let range = resolve_month("february-2024").unwrap();

        let selected = select_favorites(&mut RunContext::quiet(), &library, &range).unwrap();
        let ids: Vec<_> = selected.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let library = FixedLibrary(vec![
            item("first", at(5, 12), true),
            item("second", at(5, 12), true),
            item("earlier", at(5, 8), true),
        ]);
        let range = resolve_month("february-2024").unwrap();

        let selected = select_favorites(&mut RunContext::quiet(), &library, &range).unwrap();
        let ids: Vec<_> = selected.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["earlier", "first", "second"]);
    }

    #[test]
    fn test_provider_failure_propagates() {
        let range = resolve_month("february-2024").unwrap();
        let result = select_favorites(&mut RunContext::quiet(), &BrokenLibrary, &range);
        assert!(matches!(result, Err(Error::LibraryOpen { .. })));
    }

    #[test]
    fn test_best_still_prefers_canonical() {
        let mut item = item("x", at(1, 1), true);
        assert_eq!(item.best_still_path(), None);

        item.original_path = Some(PathBuf::from("orig.heic"));
        assert_eq!(item.best_still_path(), Some(Path::new("orig.heic")));

        item.still_path = Some(PathBuf::from("edited.jpg"));
        assert_eq!(item.best_still_path(), Some(Path::new("edited.jpg")));
    }

    #[test]
    fn test_default_export_still_without_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let library = FixedLibrary(vec![]);
        let result = library.export_still(&item("x", at(1, 1), true), &dir.path().join("001.JPG"));
        assert!(matches!(result, Err(Error::MissingAsset { component: "still", .. })));
    }
}
