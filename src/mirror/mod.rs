//! Selfie mirroring post-processor
//!
//! Front camera captures are stored the way the sensor saw them. For items
//! the library flags as selfies, the exported files are flipped left-right
//! unless detection shows an edit already did it.
//!
//! - stills: skipped when the edited rendition is a mirror of the original,
//!   otherwise decoded, flipped and re-encoded in the same format
//! - motion clips and selfie videos: always re-encoded through the
//!   [`VideoTranscoder`] (there is no detector for video), unless motion
//!   mirroring is disabled
//!
//! Every step runs at most once per export. Failures are reported in the
//! [`MirrorReport`] and never leave a half-written file in place.

pub mod detect;
pub mod video;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fsops::temp_sibling;
use crate::library::LibraryItem;
use crate::media::MediaKind;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

pub use detect::MirrorDetector;
pub use video::{FfmpegTranscoder, VideoTranscoder, mirror_video_in_place};

/// JPEG quality used when re-encoding flipped stills
const JPEG_QUALITY: u8 = 95;

/// What happened to one exported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetMirror {
    /// Nothing was exported for this component
    Absent,
    /// Edited rendition is already a mirror of the original
    AlreadyMirrored,
    /// File was flipped in place
    Mirrored,
    /// Motion mirroring turned off
    Disabled,
    /// Not an image or video we know how to flip
    Unsupported,
    /// Flip failed; the exported file is unchanged
    Failed(String),
}

/// Mirroring result for one selfie item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    /// The primary exported asset (still, or the video of a selfie video)
    pub primary: AssetMirror,
    /// The live photo motion clip
    pub motion: AssetMirror,
}

/// Applies selfie mirroring to exported files
pub struct MirrorProcessor {
    detector: MirrorDetector,
    transcoder: Box<dyn VideoTranscoder>,
    mirror_live_video: bool,
}

impl MirrorProcessor {
    pub fn new(config: &Config, transcoder: Box<dyn VideoTranscoder>) -> Self {
        Self {
            detector: MirrorDetector::from_config(config),
            transcoder,
            mirror_live_video: config.mirror_live_video,
        }
    }

    /// Mirror the exported files of `item`
    ///
    /// Returns `None` for items that are not selfies.
    pub fn process(
        &self,
        item: &LibraryItem,
        primary: Option<&Path>,
        motion: Option<&Path>,
    ) -> Option<MirrorReport> {
        if !item.is_selfie {
            return None;
        }

        let primary = match primary {
            Some(path) => self.mirror_primary(item, path),
            None => AssetMirror::Absent,
        };

        let motion = match motion {
            None => AssetMirror::Absent,
            Some(_) if !self.mirror_live_video => AssetMirror::Disabled,
            Some(path) => self.mirror_video(path),
        };

        Some(MirrorReport { primary, motion })
    }

    fn mirror_primary(&self, item: &LibraryItem, path: &Path) -> AssetMirror {
        match MediaKind::of_path(path) {
            MediaKind::Image => {
                if self.edit_already_mirrored(item, path) {
                    info!(path = %path.display(), "Selfie edit is already mirrored, keeping still");
                    return AssetMirror::AlreadyMirrored;
                }
                match flip_image_in_place(path) {
                    Ok(()) => {
                        info!(path = %path.display(), "Mirrored selfie still");
                        AssetMirror::Mirrored
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to mirror selfie still");
                        AssetMirror::Failed(e.to_string())
                    }
                }
            }
            MediaKind::Video => self.mirror_video(path),
            MediaKind::OpaqueImage => {
                warn!(path = %path.display(), "Still format cannot be re-encoded, not mirroring");
                AssetMirror::Unsupported
            }
            MediaKind::Unknown => {
                warn!(path = %path.display(), "Unsupported media kind, not mirroring");
                AssetMirror::Unsupported
            }
        }
    }

    fn edit_already_mirrored(&self, item: &LibraryItem, exported: &Path) -> bool {
        if !item.is_edited {
            return false;
        }
        match item.original_path.as_deref() {
            Some(original) => self.detector.is_mirrored(exported, original),
            None => {
                debug!(item = %item.id, "Edited selfie has no original asset to compare");
                false
            }
        }
    }

    fn mirror_video(&self, path: &Path) -> AssetMirror {
        match mirror_video_in_place(self.transcoder.as_ref(), path) {
            Ok(()) => {
                info!(path = %path.display(), "Mirrored selfie video");
                AssetMirror::Mirrored
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to mirror selfie video, original kept");
                AssetMirror::Failed(e.to_string())
            }
        }
    }
}

/// Flip the still at `path` left-right, keeping its format
///
/// The EXIF orientation is applied to the pixels first so the flip happens
/// on the image as displayed. For JPEG and PNG the EXIF block is written
/// back with its orientation reset; other formats lose their metadata.
pub fn flip_image_in_place(path: &Path) -> Result<()> {
    let image_error = |source| Error::Image {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .or_else(|| ImageFormat::from_path(path).ok())
        .ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let mut decoder = reader.into_decoder().map_err(image_error)?;
    let mut exif = decoder.exif_metadata().unwrap_or_else(|e| {
        debug!(path = %path.display(), error = %e, "Unreadable EXIF block, dropping it");
        None
    });
    let orientation = exif
        .as_deref_mut()
        .and_then(Orientation::remove_from_exif_chunk)
        .unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder).map_err(image_error)?;
    img.apply_orientation(orientation);
    let flipped = img.fliph();
    debug!(path = %path.display(), ?orientation, "Flipping still");

    let temp = temp_sibling(path, "mirror-tmp");
    let written = write_image(&flipped, format, exif, &temp).and_then(|()| {
        fs::rename(&temp, path)?;
        Ok(())
    });

    if written.is_err() && temp.exists() {
        let _ = fs::remove_file(&temp);
    }
    written
}

fn write_image(
    img: &DynamicImage,
    format: ImageFormat,
    exif: Option<Vec<u8>>,
    dest: &Path,
) -> Result<()> {
    let image_error = |source| Error::Image {
        path: dest.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(dest)?);
    match format {
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            attach_exif(&mut encoder, exif, dest);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(image_error)?;
        }
        ImageFormat::Png => {
            let mut encoder = PngEncoder::new(&mut writer);
            attach_exif(&mut encoder, exif, dest);
            img.write_with_encoder(encoder).map_err(image_error)?;
        }
        _ => {
            if exif.is_some() {
                debug!(path = %dest.display(), ?format, "EXIF not carried over for this format");
            }
            img.write_to(&mut writer, format).map_err(image_error)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn attach_exif(encoder: &mut impl ImageEncoder, exif: Option<Vec<u8>>, dest: &Path) {
    if let Some(exif) = exif
        && let Err(e) = encoder.set_exif_metadata(exif)
    {
        debug!(path = %dest.display(), error = %e, "Encoder rejected EXIF block");
    }
}

#[cfg(test)]
mod tests {
    use super::detect::mean_abs_diff;
    use super::detect::tests::{pattern, write_oriented_jpeg, write_png};
    use super::video::tests::{FailingTranscoder, FakeTranscoder};
    use super::*;
    use image::imageops;
    use std::path::PathBuf;

    fn processor(transcoder: Box<dyn VideoTranscoder>) -> MirrorProcessor {
        MirrorProcessor::new(&Config::default(), transcoder)
    }

    fn selfie(edited: bool, original: Option<PathBuf>) -> LibraryItem {
        LibraryItem {
            id: "selfie".into(),
            is_favorite: true,
            is_selfie: true,
            is_edited: edited,
            original_filename: "IMG_0100.PNG".into(),
            original_path: original,
            ..LibraryItem::default()
        }
    }

    #[test]
    fn test_non_selfie_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let still = write_png(dir.path(), "001.png", &pattern(32, 24));
        let before = fs::read(&still).unwrap();

        let item = LibraryItem {
            is_selfie: false,
            ..selfie(false, None)
        };
        assert_eq!(processor(Box::new(FakeTranscoder)).process(&item, Some(still.as_path()), None), None);
        assert_eq!(fs::read(&still).unwrap(), before);
    }

    #[test]
    fn test_unedited_selfie_still_is_flipped() {
        let dir = tempfile::tempdir().unwrap();
        let original = pattern(32, 24);
        let still = write_png(dir.path(), "001.png", &original);

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(false, None), Some(still.as_path()), None)
            .unwrap();

        assert_eq!(report.primary, AssetMirror::Mirrored);
        assert_eq!(report.motion, AssetMirror::Absent);
        let flipped = image::open(&still).unwrap().to_rgb8();
        assert_eq!(flipped, imageops::flip_horizontal(&original));
        assert!(!temp_sibling(&still, "mirror-tmp").exists());
    }

    #[test]
    fn test_pre_flipped_edit_is_not_flipped_again() {
        let dir = tempfile::tempdir().unwrap();
        let original = pattern(32, 24);
        let original_path = write_png(dir.path(), "original.png", &original);
        let still = write_png(
            dir.path(),
            "001.png",
            &imageops::flip_horizontal(&original),
        );
        let before = fs::read(&still).unwrap();

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(true, Some(original_path)), Some(still.as_path()), None)
            .unwrap();

        assert_eq!(report.primary, AssetMirror::AlreadyMirrored);
        assert_eq!(fs::read(&still).unwrap(), before);
    }

    #[test]
    fn test_edit_without_flip_gets_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        let original = pattern(32, 24);
        let original_path = write_png(dir.path(), "original.png", &original);
        let still = write_png(dir.path(), "001.png", &original);

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(true, Some(original_path)), Some(still.as_path()), None)
            .unwrap();
        assert_eq!(report.primary, AssetMirror::Mirrored);
    }

    #[test]
    fn test_live_motion_mirrored_even_when_still_already_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        let original = pattern(32, 24);
        let original_path = write_png(dir.path(), "original.png", &original);
        let still = write_png(
            dir.path(),
            "001.png",
            &imageops::flip_horizontal(&original),
        );
        let motion = dir.path().join("001_live.mov");
        fs::write(&motion, b"xyz").unwrap();

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(true, Some(original_path)), Some(still.as_path()), Some(motion.as_path()))
            .unwrap();

        assert_eq!(report.primary, AssetMirror::AlreadyMirrored);
        assert_eq!(report.motion, AssetMirror::Mirrored);
        assert_eq!(fs::read(&motion).unwrap(), b"zyx");
    }

    #[test]
    fn test_transcoder_failure_keeps_motion_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let still = write_png(dir.path(), "001.png", &pattern(16, 16));
        let motion = dir.path().join("001_live.mov");
        fs::write(&motion, b"untouched motion").unwrap();

        let report = processor(Box::new(FailingTranscoder))
            .process(&selfie(false, None), Some(still.as_path()), Some(motion.as_path()))
            .unwrap();

        assert_eq!(report.primary, AssetMirror::Mirrored);
        assert!(matches!(report.motion, AssetMirror::Failed(_)));
        assert_eq!(fs::read(&motion).unwrap(), b"untouched motion");
        assert!(!temp_sibling(&motion, "mirror-tmp").exists());
    }

    #[test]
    fn test_motion_mirroring_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let motion = dir.path().join("001_live.mov");
        fs::write(&motion, b"motion").unwrap();

        let config = Config {
            mirror_live_video: false,
            ..Config::default()
        };
        let report = MirrorProcessor::new(&config, Box::new(FakeTranscoder))
            .process(&selfie(false, None), None, Some(motion.as_path()))
            .unwrap();

        assert_eq!(report.primary, AssetMirror::Absent);
        assert_eq!(report.motion, AssetMirror::Disabled);
        assert_eq!(fs::read(&motion).unwrap(), b"motion");
    }

    #[test]
    fn test_selfie_video_goes_through_transcoder() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("002.mov");
        fs::write(&video, b"12").unwrap();

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(false, None), Some(video.as_path()), None)
            .unwrap();
        assert_eq!(report.primary, AssetMirror::Mirrored);
        assert_eq!(fs::read(&video).unwrap(), b"21");
    }

    #[test]
    fn test_corrupt_still_reports_failure_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let still = dir.path().join("001.jpg");
        fs::write(&still, b"not really a jpeg").unwrap();

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(false, None), Some(still.as_path()), None)
            .unwrap();
        assert!(matches!(report.primary, AssetMirror::Failed(_)));
        assert_eq!(fs::read(&still).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_jpeg_flip_keeps_format() {
        let dir = tempfile::tempdir().unwrap();
        let still = dir.path().join("001.jpg");
        DynamicImage::ImageRgb8(pattern(32, 24))
            .save_with_format(&still, ImageFormat::Jpeg)
            .unwrap();

        flip_image_in_place(&still).unwrap();

        let reader = ImageReader::open(&still).unwrap().with_guessed_format().unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
        assert_eq!(reader.decode().unwrap().width(), 32);
    }

    #[test]
    fn test_oriented_jpeg_flipped_as_displayed() {
        let dir = tempfile::tempdir().unwrap();
        // portrait shot stored landscape with Orientation=6
        let raw = pattern(40, 20);
        let still = write_oriented_jpeg(dir.path(), "001.jpg", &raw, 6);

        flip_image_in_place(&still).unwrap();

        let mut decoder = ImageReader::open(&still)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .into_decoder()
            .unwrap();
        assert!(decoder.exif_metadata().unwrap().is_some());
        assert_eq!(decoder.orientation().unwrap(), Orientation::NoTransforms);

        let written = DynamicImage::from_decoder(decoder).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (20, 40));

        let displayed = imageops::rotate90(&raw);
        let mirrored = imageops::flip_horizontal(&displayed);
        let upside_down = imageops::flip_vertical(&displayed);
        assert!(mean_abs_diff(&written, &mirrored) < 6.0);
        assert!(mean_abs_diff(&written, &upside_down) > 20.0);
    }

    #[test]
    fn test_heic_selfie_is_unsupported_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let still = dir.path().join("001_042025-042025.HEIC");
        fs::write(&still, b"ftypheic container").unwrap();
        let motion = dir.path().join("001_042025-042025_live.mov");
        fs::write(&motion, b"ab").unwrap();

        let report = processor(Box::new(FakeTranscoder))
            .process(&selfie(false, None), Some(still.as_path()), Some(motion.as_path()))
            .unwrap();

        assert_eq!(report.primary, AssetMirror::Unsupported);
        assert_eq!(fs::read(&still).unwrap(), b"ftypheic container");
        assert_eq!(report.motion, AssetMirror::Mirrored);
        assert_eq!(fs::read(&motion).unwrap(), b"ba");
    }
}
