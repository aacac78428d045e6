//! Error types for the favorite exporter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for favorite exporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the favorite exporter
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date '{input}': dates must be in mm-dd-yyyy format (e.g., 04-30-2025)")]
    InvalidDate { input: String },

    #[error("Invalid month '{input}': expected a month and year such as 'february-2024' or '02-2024'")]
    InvalidMonth { input: String },

    #[error("Start date is required")]
    MissingStartDate,

    #[error("Start date {start} must be before or equal to end date {end}")]
    StartAfterEnd { start: String, end: String },

    #[error("Failed to open photo library {path}: {message}")]
    LibraryOpen { path: PathBuf, message: String },

    #[error("No exportable {component} asset for '{item}'")]
    MissingAsset { item: String, component: &'static str },

    #[error("Image processing failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Video transcode failed for {path}: {message}")]
    Transcode { path: PathBuf, message: String },

    #[error("FFmpeg not found. Please install FFmpeg and ensure ffmpeg is in PATH")]
    FfmpegNotFound,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}
