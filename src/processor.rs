//! Colorize Pipeline
//!
//! Turns a decoded image into its color-assist version:
//! 1. Saturation enhancement (see [`crate::enhance`])
//! 2. RGB -> HSV over the whole image
//! 3. Hue remapping of the red and green bands (see [`crate::remap`])
//! 4. HSV -> RGB, rounded and clamped to 8 bits
//!
//! Decoding and PNG encoding live here as well so callers can go from
//! upload bytes to result bytes without touching the filesystem.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use crate::enhance::{self, SaturationMode};
use crate::error::{LensError, Result};
use crate::hsv;
use crate::remap::{self, HueRemapRules};

// ============================================================================
// SETTINGS
// ============================================================================

/// Encoded results smaller than this are treated as corrupt
pub const MIN_ENCODED_BYTES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Saturation multiplier applied before remapping (default: 1.2)
    pub saturation_factor: f32,
    /// How saturation is scaled (default: luma)
    pub saturation_mode: SaturationMode,
    /// Hue bands to remap
    pub hue_rules: HueRemapRules,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            saturation_factor: 1.2,
            saturation_mode: SaturationMode::Luma,
            hue_rules: HueRemapRules::default(),
        }
    }
}

// ============================================================================
// DECODE / ENCODE
// ============================================================================

/// Decode raw upload bytes into an RGB image, dropping any alpha channel
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes).map_err(LensError::Decode)?;
    Ok(img.to_rgb8())
}

/// Load an image from disk into memory
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// Encode image as PNG bytes, failing if the result is implausibly small
pub fn encode_png(img: &RgbImage, min_bytes: usize) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    let bytes = buffer.into_inner();

    if bytes.len() < min_bytes {
        return Err(LensError::EncodeIntegrity {
            size: bytes.len(),
            minimum: min_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// MAIN ENTRY POINTS
// ============================================================================

/// Enhance saturation, remap hues and return the transformed image
///
/// The output always has the same dimensions as the input.
pub fn colorize(img: &RgbImage, settings: &TransformSettings) -> Result<RgbImage> {
    let started = Instant::now();
    let dimensions = img.dimensions();

    let mut working = img.clone();
    enhance::enhance(&mut working, settings.saturation_factor, settings.saturation_mode)?;

    let mut planes = hsv::to_hsv(&working)?;
    remap::remap_image(&mut planes, &settings.hue_rules);
    let out = hsv::to_rgb(&planes)?;

    if out.dimensions() != dimensions {
        return Err(LensError::Processing(format!(
            "Colorized image is {:?}, expected {:?}",
            out.dimensions(),
            dimensions
        )));
    }

    tracing::debug!(
        width = dimensions.0,
        height = dimensions.1,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "colorized image"
    );
    Ok(out)
}

/// Colorize and encode in one step
pub fn colorize_to_png(img: &RgbImage, settings: &TransformSettings, min_bytes: usize) -> Result<Vec<u8>> {
    let out = colorize(img, settings)?;
    encode_png(&out, min_bytes)
}

// ============================================================================
// TESTS
// ============================================================================
