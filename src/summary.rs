//! Dominant color summaries
//!
//! Clusters an image (see [`crate::quantizer`]) and names every centroid
//! (see [`crate::labeler`]). Entries keep the cluster order; nothing is
//! sorted by frequency, hue or brightness.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use crate::error::{LensError, Result};
use crate::labeler::LabeledColor;
use crate::quantizer::{self, QuantizerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Number of colors to report (default: 5)
    pub k: usize,
    /// Fail instead of returning a short list when the image has fewer than `k` colors
    pub require_full_palette: bool,
    pub clustering: QuantizerSettings,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            k: 5,
            require_full_palette: false,
            clustering: QuantizerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSummary {
    pub colors: Vec<LabeledColor>,
    /// Set when fewer distinct colors than requested were available
    pub degenerate: bool,
}

/// Summarize the dominant colors of an image
pub fn summarize(img: &RgbImage, settings: &SummarySettings) -> Result<ColorSummary> {
    let started = Instant::now();
    let quantization = quantizer::cluster(img, settings.k, &settings.clustering)?;

    if quantization.is_degenerate() && settings.require_full_palette {
        return Err(LensError::DegenerateClusterInput {
            unique: quantization.unique_colors,
            requested: quantization.requested,
        });
    }

    let colors: Vec<LabeledColor> = quantization
        .clusters
        .iter()
        .map(|cluster| LabeledColor::from_raw(cluster.centroid))
        .collect();

    tracing::debug!(
        colors = colors.len(),
        degenerate = quantization.is_degenerate(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "summarized colors"
    );

    Ok(ColorSummary {
        colors,
        degenerate: quantization.is_degenerate(),
    })
}

/// Summarize with default clustering and `k` colors
pub fn summarize_colors(img: &RgbImage, k: usize) -> Result<Vec<LabeledColor>> {
    let settings = SummarySettings {
        k,
        ..SummarySettings::default()
    };
    Ok(summarize(img, &settings)?.colors)
}

/// Draw one square chip per color, left to right
pub fn render_swatches(colors: &[LabeledColor], chip_size: u32) -> Result<RgbImage> {
    if chip_size == 0 {
        return Err(LensError::InvalidParameter("chip size must be positive".to_string()));
    }

    // Every chip offset must fit the i32 coordinates imageproc draws with
    let width = u32::try_from(colors.len())
        .ok()
        .and_then(|n| n.checked_mul(chip_size))
        .filter(|&w| i32::try_from(w).is_ok())
        .ok_or_else(|| {
            LensError::InvalidParameter(format!(
                "{} chips of {} pixels do not fit in one image",
                colors.len(),
                chip_size
            ))
        })?;

    let mut canvas = RgbImage::new(width, chip_size);
    for (i, color) in colors.iter().enumerate() {
        let x = i as i32 * chip_size as i32;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(x, 0).of_size(chip_size, chip_size),
            Rgb(color.rgb),
        );
    }
    Ok(canvas)
}
