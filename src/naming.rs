//! Output filename derivation
//!
//! Filenames are a pure function of an item's position in the ordered
//! selection and of the date range:
//!
//! - still:  `<index><date suffix><extension>`, e.g. `001_042025-052025.HEIC`
//! - motion: `<index><date suffix>_live.mov`, e.g. `001_042025-052025_live.mov`
//!
//! The index is zero-padded to at least three digits. Past 999 it simply
//! widens (`1000_...`), so names stay unique.

use crate::library::LibraryItem;
use crate::media::MOTION_EXTENSION;
use crate::range::DateRange;

/// Marker appended to the stem of a live photo's motion clip
pub const MOTION_MARKER: &str = "_live";

/// Minimum width of the zero-padded sequence number
const INDEX_WIDTH: usize = 3;

/// Derived output names for one selected item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    /// 1-based position in the ordered selection
    pub index: usize,
    /// Output filename of the still component
    pub still_name: String,
    /// Output filename of the motion component (live items only)
    pub motion_name: Option<String>,
    /// Whether the still is left out (live item with stills excluded)
    pub skip_still: bool,
}

impl ExportPlan {
    /// Derive the plan for `item` at `index`
    pub fn for_item(
        index: usize,
        range: &DateRange,
        item: &LibraryItem,
        exclude_live_stills: bool,
    ) -> Self {
        let extension = original_extension(&item.original_filename);
        let stem = output_stem(index, range);

        Self {
            index,
            still_name: still_filename(&stem, extension),
            motion_name: item.is_live.then(|| motion_filename(&stem)),
            skip_still: exclude_live_stills && item.is_live,
        }
    }
}

/// Compact `_MMYYYY-MMYYYY` token for the range
pub fn date_suffix(range: &DateRange) -> String {
    format!(
        "_{}-{}",
        range.start().format("%m%Y"),
        range.end().format("%m%Y")
    )
}

/// Stem shared by the still and motion files of one item
pub fn output_stem(index: usize, range: &DateRange) -> String {
    format!("{:0width$}{}", index, date_suffix(range), width = INDEX_WIDTH)
}

/// Extension of the original filename including the dot, as written
pub fn original_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => "",
        Some(pos) => &filename[pos..],
    }
}

fn still_filename(stem: &str, extension: &str) -> String {
    format!("{}{}", stem, extension)
}

fn motion_filename(stem: &str) -> String {
    format!("{}{}.{}", stem, MOTION_MARKER, MOTION_EXTENSION)
}
