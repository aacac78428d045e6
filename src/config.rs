//! Configuration types for the favorite exporter

use crate::range::DateRange;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory layout inside the destination folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationRule {
    /// All files go to the destination root
    #[default]
    None,
    /// destination/YYYY/
    Year,
    /// destination/YYYY/MM/ (see [`MonthFormat`])
    YearMonth,
}

/// Month format for year-month classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MonthFormat {
    /// Nested format: YYYY/MM/
    #[default]
    Nested,
    /// Combined format: YYYY-MM/
    Combined,
}

/// How asset bytes are placed in the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to destination
    #[default]
    Copy,
    /// Create hard links (library and destination must share a volume)
    Hardlink,
}

/// Configuration for an export run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library manifest to read items from
    pub library: PathBuf,

    /// Destination folder; derived from the date range when unset
    pub output_dir: Option<PathBuf>,

    /// Subdirectory layout by capture date
    pub classification: ClassificationRule,

    /// Month format for year-month classification
    pub month_format: MonthFormat,

    /// Copy or hard-link assets
    pub operation: FileOperation,

    /// Leave out the still image of live photos (motion clip only)
    pub exclude_live_stills: bool,

    /// Mirror selfies after export
    pub mirror_selfies: bool,

    /// Also mirror the motion clip of live selfies
    pub mirror_live_video: bool,

    /// Mean absolute pixel difference (0-255) below which an edited still
    /// counts as a mirror of its original
    pub mirror_threshold: f64,

    /// Side of the square both images are downsampled to before comparing
    pub mirror_sample_size: u32,

    /// FFmpeg executable used to flip videos
    pub ffmpeg_path: PathBuf,

    /// Derive and log filenames without writing anything
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: PathBuf::from("library.json"),
            output_dir: None,
            classification: ClassificationRule::default(),
            month_format: MonthFormat::default(),
            operation: FileOperation::default(),
            exclude_live_stills: false,
            mirror_selfies: false,
            mirror_live_video: true,
            mirror_threshold: 10.0,
            mirror_sample_size: 200,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Destination folder for `range`
    ///
    /// Uses the configured folder, or `<Desktop>/<start> to <end>`.
    pub fn resolve_output_dir(&self, range: &DateRange) -> PathBuf {
        match &self.output_dir {
            Some(dir) => expand_tilde(dir),
            None => {
                let base = dirs::desktop_dir()
                    .or_else(dirs::home_dir)
                    .unwrap_or_else(|| PathBuf::from("."));
                base.join(range.to_string())
            }
        }
    }

    /// Directory (relative to the destination) for an item captured at `date`
    pub fn subdirectory_for(&self, date: &impl Datelike) -> PathBuf {
        let mut dir = PathBuf::new();
        match self.classification {
            ClassificationRule::None => {}
            ClassificationRule::Year => {
                dir.push(format!("{}", date.year()));
            }
            ClassificationRule::YearMonth => match self.month_format {
                MonthFormat::Nested => {
                    dir.push(format!("{}", date.year()));
                    dir.push(format!("{:02}", date.month()));
                }
                MonthFormat::Combined => {
                    dir.push(format!("{}-{:02}", date.year(), date.month()));
                }
            },
        }
        dir
    }

    /// Library manifest path with `~` expanded
    pub fn library_path(&self) -> PathBuf {
        expand_tilde(&self.library)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), String> {
        if !self.mirror_threshold.is_finite() || self.mirror_threshold < 0.0 {
            return Err(format!(
                "mirror_threshold must be a non-negative number, got {}",
                self.mirror_threshold
            ));
        }
        if self.mirror_sample_size == 0 {
            return Err("mirror_sample_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Favorite Exporter Configuration File
# This file uses TOML format (https://toml.io)

# Library manifest (JSON index of the photo library)
library = "~/Pictures/library.json"

# Destination folder. When omitted, a folder named after the date range
# ("04-01-2025 to 04-30-2025") is created on the Desktop.
output_dir = "~/Desktop/Favorites"

# Subdirectory layout: "none", "year", or "year-month"
classification = "none"

# Month format for year-month: "nested" (YYYY/MM/) or "combined" (YYYY-MM/)
month_format = "nested"

# File operation: "copy" or "hardlink"
operation = "copy"

# Export only the motion clip of live photos
exclude_live_stills = false

# Mirror selfies horizontally after export
mirror_selfies = true

# Also mirror the motion clip of live selfies (requires ffmpeg)
mirror_live_video = true

# An edited selfie whose mean pixel difference (0-255) to its flipped
# original is below this value is treated as already mirrored
mirror_threshold = 10.0

# Images are downsampled to this square size before comparing
mirror_sample_size = 200

# FFmpeg executable used to flip videos
ffmpeg_path = "ffmpeg"

# Dry run mode - show what would be exported without writing anything
dry_run = false

# Verbose output
verbose = false
"#
        .to_string()
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::resolve_month;
    use chrono::NaiveDate;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert!(config.mirror_selfies);
        assert!(config.mirror_live_video);
        assert_eq!(config.mirror_sample_size, 200);
        assert_eq!(config.operation, FileOperation::Copy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("mirror_selfies = true\n").unwrap();
        assert!(config.mirror_selfies);
        assert_eq!(config.mirror_threshold, 10.0);
        assert_eq!(config.classification, ClassificationRule::None);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config/favorites.toml");

        let config = Config {
            exclude_live_stills: true,
            mirror_threshold: 6.5,
            classification: ClassificationRule::YearMonth,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert!(loaded.exclude_live_stills);
        assert_eq!(loaded.mirror_threshold, 6.5);
        assert_eq!(loaded.classification, ClassificationRule::YearMonth);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_default_output_dir_named_after_range() {
        let config = Config::default();
        let range = resolve_month("april-2025").unwrap();
        let dir = config.resolve_output_dir(&range);
        assert!(dir.ends_with("04-01-2025 to 04-30-2025"));

        let explicit = Config {
            output_dir: Some(PathBuf::from("/tmp/favs")),
            ..Config::default()
        };
        assert_eq!(explicit.resolve_output_dir(&range), PathBuf::from("/tmp/favs"));
    }

    #[test]
    fn test_subdirectory_for() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        let mut config = Config::default();
        assert_eq!(config.subdirectory_for(&date), PathBuf::new());

        config.classification = ClassificationRule::Year;
        assert_eq!(config.subdirectory_for(&date), PathBuf::from("2025"));

        config.classification = ClassificationRule::YearMonth;
        assert_eq!(config.subdirectory_for(&date), PathBuf::from("2025/04"));

        config.month_format = MonthFormat::Combined;
        assert_eq!(config.subdirectory_for(&date), PathBuf::from("2025-04"));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = Config {
            mirror_threshold: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            mirror_sample_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
