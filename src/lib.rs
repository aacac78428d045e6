//! Favorite Exporter - export favorited photos from a photo library
//!
//! This library provides:
//! - Date range resolution from explicit dates or a month token
//! - Favorite selection in capture order
//! - Deterministic, index-based output filenames
//! - Live photo still and motion export
//! - Optional selfie mirroring with detection of already mirrored edits

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fsops;
pub mod library;
pub mod media;
pub mod mirror;
pub mod naming;
pub mod prompt;
pub mod range;
pub mod status;

pub use cli::Cli;
pub use config::{ClassificationRule, Config, ConfigError, FileOperation, MonthFormat};
pub use error::{Error, Result};
pub use export::{ExportOutcome, ExportReport, ExportResult, ExportStats, Exporter};
pub use library::{LibraryItem, LibraryProvider, ManifestLibrary, select_favorites};
pub use mirror::{FfmpegTranscoder, MirrorDetector, MirrorProcessor, VideoTranscoder};
pub use naming::ExportPlan;
pub use range::DateRange;
pub use status::RunContext;
