//! Fuzzy image comparison.
//!
//! Two metrics are computed in one pass over the pixels:
//!
//! - **absolute difference**: number of pixels whose color distance exceeds
//!   the fuzz window. Zero means the images match exactly (up to fuzz).
//! - **normalized difference**: mean squared error over all channels, in
//!   percent, rounded to two decimals. Pixels inside the fuzz window
//!   contribute nothing.
//!
//! Classification is `Identical` when the absolute difference is zero,
//! `WithinTolerance` when the normalized difference is below the allowed
//! maximum, and `Failing` otherwise.

use crate::config::{DEFAULT_FUZZ_PERCENT, DEFAULT_MAX_DIFFERENCE};
use crate::result::{MiradaError, MiradaResult};
use image::{DynamicImage, GenericImageView, ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome class of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// No pixel differs beyond the fuzz window
    Identical,
    /// Pixels differ but the normalized difference is below the maximum
    WithinTolerance,
    /// Normalized difference reaches the maximum
    Failing,
}

impl Classification {
    /// Whether the check passes
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Identical | Self::WithinTolerance)
    }

    /// Ordering from best to worst
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Identical => 0,
            Self::WithinTolerance => 1,
            Self::Failing => 2,
        }
    }
}

/// Result of comparing a candidate against a reference
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    /// Number of pixels differing beyond the fuzz window
    pub absolute_difference: f64,
    /// Mean squared error in percent (0-100), two decimals
    pub normalized_difference: f64,
    /// Classification under the comparator's maximum
    pub classification: Classification,
    /// Rendered difference, present whenever any pixel differs
    pub diff_image: Option<RgbaImage>,
    /// Compared canvas width
    pub width: u32,
    /// Compared canvas height
    pub height: u32,
}

impl ComparisonResult {
    /// Check if images are identical (no differences)
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.classification == Classification::Identical
    }

    /// PNG encoding of the diff image
    pub fn diff_png(&self) -> MiradaResult<Option<Vec<u8>>> {
        self.diff_image.as_ref().map(encode_png).transpose()
    }
}

/// Compares images under a fuzz window and a maximum difference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageComparator {
    fuzz_percent: f64,
    max_difference: f64,
}

impl Default for ImageComparator {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZ_PERCENT, DEFAULT_MAX_DIFFERENCE)
    }
}

impl ImageComparator {
    /// Create a comparator; both values are percentages
    #[must_use]
    pub const fn new(fuzz_percent: f64, max_difference: f64) -> Self {
        Self {
            fuzz_percent,
            max_difference,
        }
    }

    /// Fuzz window in percent
    #[must_use]
    pub const fn fuzz_percent(&self) -> f64 {
        self.fuzz_percent
    }

    /// Maximum allowed normalized difference in percent
    #[must_use]
    pub const fn max_difference(&self) -> f64 {
        self.max_difference
    }

    /// Compare two encoded images
    pub fn compare_bytes(&self, candidate: &[u8], reference: &[u8]) -> MiradaResult<ComparisonResult> {
        let candidate = decode_image(candidate, "candidate")?;
        let reference = decode_image(reference, "reference")?;
        Ok(self.compare(&candidate, &reference))
    }

    /// Compare two image files
    pub fn compare_files(
        &self,
        candidate: impl AsRef<Path>,
        reference: impl AsRef<Path>,
    ) -> MiradaResult<ComparisonResult> {
        let candidate = load_image(candidate)?;
        let reference = load_image(reference)?;
        Ok(self.compare(&candidate, &reference))
    }

    /// Compare two decoded images.
    ///
    /// Images of different sizes are compared on the union of both canvases;
    /// pixels that exist in only one image count as fully different.
    #[must_use]
    pub fn compare(&self, candidate: &DynamicImage, reference: &DynamicImage) -> ComparisonResult {
        let (cand_w, cand_h) = candidate.dimensions();
        let (ref_w, ref_h) = reference.dimensions();
        let width = cand_w.max(ref_w);
        let height = cand_h.max(ref_h);

        let candidate = candidate.to_rgba8();
        let reference = reference.to_rgba8();

        let fuzz = self.fuzz_percent / 100.0;
        let fuzz_squared = fuzz * fuzz;

        let mut diff_img = RgbaImage::new(width, height);
        let mut differing = 0u64;
        let mut squared_error = 0.0f64;

        for y in 0..height {
            for x in 0..width {
                let actual = pixel_at(&candidate, x, y);
                let expected = pixel_at(&reference, x, y);

                let error = match (actual, expected) {
                    (Some(a), Some(e)) => squared_distance(a, e),
                    _ => 1.0,
                };

                if error > fuzz_squared {
                    differing += 1;
                    squared_error += error;
                    // Highlight difference in red on diff image
                    diff_img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                } else {
                    // Copy original pixel with reduced opacity
                    let Rgba([r, g, b, _]) = actual.or(expected).unwrap_or(Rgba([0, 0, 0, 0]));
                    diff_img.put_pixel(x, y, Rgba([r / 2, g / 2, b / 2, 128]));
                }
            }
        }

        let total_pixels = u64::from(width) * u64::from(height);
        let normalized_difference = if total_pixels > 0 {
            round2(squared_error / total_pixels as f64 * 100.0)
        } else {
            0.0
        };
        let absolute_difference = differing as f64;

        let classification = self.classify(absolute_difference, normalized_difference);

        ComparisonResult {
            absolute_difference,
            normalized_difference,
            classification,
            diff_image: (differing > 0).then_some(diff_img),
            width,
            height,
        }
    }

    /// Apply the classification policy to precomputed metrics
    #[must_use]
    pub fn classify(&self, absolute_difference: f64, normalized_difference: f64) -> Classification {
        if absolute_difference == 0.0 {
            Classification::Identical
        } else if normalized_difference < self.max_difference {
            Classification::WithinTolerance
        } else {
            Classification::Failing
        }
    }
}

fn pixel_at(image: &RgbaImage, x: u32, y: u32) -> Option<Rgba<u8>> {
    (x < image.width() && y < image.height()).then(|| *image.get_pixel(x, y))
}

/// Mean of squared channel differences, each channel scaled to 0.0-1.0
fn squared_distance(a: Rgba<u8>, b: Rgba<u8>) -> f64 {
    let sum: f64 = a
        .0
        .iter()
        .zip(b.0.iter())
        .map(|(&ca, &cb)| {
            let d = (f64::from(ca) - f64::from(cb)) / 255.0;
            d * d
        })
        .sum();
    sum / 4.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Decode encoded image bytes; `source_name` labels errors
pub fn decode_image(bytes: &[u8], source_name: &str) -> MiradaResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| MiradaError::ImageDecode {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Read and decode an image file
pub fn load_image(path: impl AsRef<Path>) -> MiradaResult<DynamicImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| MiradaError::ImageDecode {
        source_name: path.display().to_string(),
        message: e.to_string(),
    })?;
    decode_image(&bytes, &path.display().to_string())
}

/// Encode an RGBA image as PNG
pub fn encode_png(image: &RgbaImage) -> MiradaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| MiradaError::ImageEncode {
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Decode any supported format and re-encode as a metadata-free RGBA PNG
pub fn normalize_png(bytes: &[u8], source_name: &str) -> MiradaResult<(Vec<u8>, DynamicImage)> {
    let decoded = decode_image(bytes, source_name)?;
    let rgba = decoded.to_rgba8();
    let png = encode_png(&rgba)?;
    Ok((png, DynamicImage::ImageRgba8(rgba)))
}
