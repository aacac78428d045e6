//! Media kind classification
//!
//! Every place that needs to know whether an asset is a still image or a
//! video asks [`MediaKind::classify`].

use std::path::Path;

/// Extensions decoded and re-encoded as still images
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

/// Still formats the image codecs cannot round-trip (HEIF containers, raw)
const OPAQUE_IMAGE_EXTENSIONS: &[&str] = &["heic", "heif", "avif", "dng"];

/// Extensions handled by the video transcoder
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "mkv", "3gp"];

/// Container extension used for exported live photo motion clips
pub const MOTION_EXTENSION: &str = "mov";

/// Kind of a media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Still image that can be decoded, flipped and re-encoded
    Image,
    /// Still image exported as-is but never rewritten
    OpaqueImage,
    Video,
    Unknown,
}

impl MediaKind {
    /// Classify an extension (without the leading dot, any case)
    pub fn classify(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if OPAQUE_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::OpaqueImage
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unknown
        }
    }

    /// Classify a path by its extension
    pub fn of_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::classify)
            .unwrap_or(MediaKind::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(MediaKind::classify("JPG"), MediaKind::Image);
        assert_eq!(MediaKind::classify(".jpg"), MediaKind::Image);
        assert_eq!(MediaKind::classify("HEIC"), MediaKind::OpaqueImage);
        assert_eq!(MediaKind::classify("dng"), MediaKind::OpaqueImage);
        assert_eq!(MediaKind::classify("MOV"), MediaKind::Video);
        assert_eq!(MediaKind::classify("mp4"), MediaKind::Video);
        assert_eq!(MediaKind::classify("aae"), MediaKind::Unknown);
        assert_eq!(MediaKind::classify(""), MediaKind::Unknown);
    }

    #[test]
    fn test_of_path() {
        assert_eq!(MediaKind::of_path(Path::new("/a/IMG_0001.PNG")), MediaKind::Image);
        assert_eq!(MediaKind::of_path(Path::new("clip.mov")), MediaKind::Video);
        assert_eq!(MediaKind::of_path(Path::new("README")), MediaKind::Unknown);
    }

    #[test]
    fn test_rewritable_images_have_a_codec_format() {
        for ext in IMAGE_EXTENSIONS {
            let path = format!("still.{}", ext);
            assert!(
                image::ImageFormat::from_path(&path).is_ok(),
                "{} classified as rewritable but has no codec",
                ext
            );
        }
    }
}
