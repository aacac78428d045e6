//! CLI argument parsing with clap

use crate::config::{ClassificationRule, Config, FileOperation, MonthFormat};
use crate::error::Result;
use crate::range::{DateRange, resolve_explicit, resolve_month};
use clap::Parser;
use std::path::PathBuf;

/// Favorite Exporter - Export favorited photos from a date range
///
/// Copies favorited photos and live photo videos captured within a date
/// range into one folder, named by capture order. Selfies can optionally
/// be mirrored after export.
#[derive(Parser, Debug)]
#[command(name = "favorite-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Library manifest (JSON) to export from
    #[arg(short = 'L', long)]
    pub library: Option<PathBuf>,

    /// Destination folder (default: "<start> to <end>" on the desktop)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// First day of the range (mm-dd-yyyy)
    #[arg(short, long, conflicts_with = "month")]
    pub start: Option<String>,

    /// Last day of the range (mm-dd-yyyy, default: today)
    #[arg(short, long, conflicts_with = "month")]
    pub end: Option<String>,

    /// Whole month instead of start/end, e.g. "february-2024" or "02-2024"
    #[arg(short, long)]
    pub month: Option<String>,

    /// Subdirectory layout by capture date
    #[arg(long, value_enum)]
    pub classify: Option<ClassificationRule>,

    /// Month format for year-month layout
    #[arg(long, value_enum)]
    pub month_format: Option<MonthFormat>,

    /// File operation mode
    #[arg(long, value_enum)]
    pub operation: Option<FileOperation>,

    /// Export only the video of live photos, not their still
    #[arg(long)]
    pub exclude_live_stills: bool,

    /// Mirror selfies horizontally after export
    #[arg(long)]
    pub mirror_selfies: bool,

    /// Leave live photo videos of selfies unmirrored
    #[arg(long)]
    pub no_mirror_video: bool,

    /// Mean pixel difference below which an edit counts as already mirrored
    #[arg(long)]
    pub mirror_threshold: Option<f64>,

    /// FFmpeg executable used for video mirroring
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Dry run mode - show what would be exported without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Print a commented sample configuration file and exit
    #[arg(long)]
    pub sample_config: bool,

    /// Save the effective configuration to this TOML file and exit
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Whether the command line names a range at all
    pub fn has_range(&self) -> bool {
        self.month.is_some() || self.start.is_some() || self.end.is_some()
    }

    /// Date range from `--month` or `--start`/`--end`
    ///
    /// `None` when no range argument was given.
    pub fn resolve_range(&self) -> Result<Option<DateRange>> {
        if let Some(ref month) = self.month {
            return resolve_month(month).map(Some);
        }
        if !self.has_range() {
            return Ok(None);
        }
        resolve_explicit(self.start.as_deref(), self.end.as_deref()).map(Some)
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref library) = self.library {
            config.library = library.clone();
        }
        if let Some(ref output) = self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(classify) = self.classify {
            config.classification = classify;
        }
        if let Some(month_format) = self.month_format {
            config.month_format = month_format;
        }
        if let Some(operation) = self.operation {
            config.operation = operation;
        }
        if self.exclude_live_stills {
            config.exclude_live_stills = true;
        }
        if self.mirror_selfies {
            config.mirror_selfies = true;
        }
        if self.no_mirror_video {
            config.mirror_live_video = false;
        }
        if let Some(threshold) = self.mirror_threshold {
            config.mirror_threshold = threshold;
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            config.ffmpeg_path = ffmpeg.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
