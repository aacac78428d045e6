//! Mirror detection heuristic
//!
//! Decides whether a candidate still is a horizontal flip of a reference
//! still by downsampling both, flipping the reference and measuring the mean
//! absolute per-channel difference. Below the threshold counts as mirrored.
//!
//! This is a heuristic. Both false positives and false negatives happen, and
//! the threshold is a fixed tunable rather than something derived per image.

use crate::config::Config;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, RgbImage};
use std::path::Path;
use tracing::{debug, warn};

/// Compares stills for a horizontal mirror relationship
#[derive(Debug, Clone, Copy)]
pub struct MirrorDetector {
    threshold: f64,
    sample_size: u32,
}

impl MirrorDetector {
    pub fn new(threshold: f64, sample_size: u32) -> Self {
        Self {
            threshold,
            sample_size: sample_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.mirror_threshold, config.mirror_sample_size)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `candidate` is mirrored relative to `reference`
    ///
    /// Undecodable files and mismatched dimensions report `false`.
    pub fn is_mirrored(&self, candidate: &Path, reference: &Path) -> bool {
        match self.mirror_distance(candidate, reference) {
            Some(distance) => {
                let mirrored = distance < self.threshold;
                debug!(
                    candidate = %candidate.display(),
                    reference = %reference.display(),
                    distance,
                    threshold = self.threshold,
                    mirrored,
                    "Compared still against flipped original"
                );
                mirrored
            }
            None => false,
        }
    }

    /// Mean absolute difference between `candidate` and the flipped
    /// `reference`, or `None` when the two cannot be compared
    pub fn mirror_distance(&self, candidate: &Path, reference: &Path) -> Option<f64> {
        let candidate_img = decode(candidate)?;
        let reference_img = decode(reference)?;

        if candidate_img.dimensions() != reference_img.dimensions() {
            debug!(
                candidate = ?candidate_img.dimensions(),
                reference = ?reference_img.dimensions(),
                "Dimensions differ, not comparable"
            );
            return None;
        }

        let candidate_small = self.sample(&candidate_img);
        let reference_flipped = imageops::flip_horizontal(&self.sample(&reference_img));

        Some(mean_abs_diff(&candidate_small, &reference_flipped))
    }

    fn sample(&self, img: &DynamicImage) -> RgbImage {
        img.resize_exact(self.sample_size, self.sample_size, FilterType::Triangle)
            .to_rgb8()
    }
}

/// Decode `path` as displayed, with its EXIF orientation applied
fn decode(path: &Path) -> Option<DynamicImage> {
    let decoded = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.into_decoder())
        .and_then(|mut decoder| {
            let orientation = decoder.orientation()?;
            let mut img = DynamicImage::from_decoder(decoder)?;
            img.apply_orientation(orientation);
            Ok(img)
        });

    match decoded {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot decode image for mirror detection");
            None
        }
    }
}

pub(crate) fn mean_abs_diff(a: &RgbImage, b: &RgbImage) -> f64 {
    let a = a.as_raw();
    let b = b.as_raw();
    if a.is_empty() {
        return 0.0;
    }
    let total: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.len() as f64
}
