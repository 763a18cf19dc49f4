//! Saturation enhancement
//!
//! Two ways of making colors more vivid:
//! - `Luma`: push every pixel away from its own gray level
//!   (`out = gray + factor * (pixel - gray)`), the classic "color balance"
//!   enhancement used by most imaging libraries. Blended channels are
//!   truncated, not rounded, as an 8-bit image blend does.
//! - `Hsv`: scale the HSV saturation channel, clamped at 1.

use image::RgbImage;
use ndarray::Zip;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::{LensError, Result};
use crate::hsv::{self, HsvImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationMode {
    #[default]
    Luma,
    Hsv,
}

/// Integer ITU-R 601 luma, as used for 8-bit grayscale conversion
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn check_factor(factor: f32) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(LensError::InvalidParameter(format!(
            "saturation factor must be positive, got {}",
            factor
        )))
    }
}

/// Blend each pixel away from its gray level by `factor`
fn enhance_luma(img: &mut RgbImage, factor: f32) {
    let buffer: &mut [u8] = img;
    buffer.par_chunks_exact_mut(3).for_each(|px| {
        let gray = luma(px[0], px[1], px[2]) as f32;
        for c in px.iter_mut() {
            *c = blend(gray, *c, factor);
        }
    });
}

/// `gray + factor * (c - gray)`, truncated toward zero and clamped
fn blend(gray: f32, c: u8, factor: f32) -> u8 {
    (gray + factor * (c as f32 - gray)).clamp(0.0, 255.0) as u8
}

/// Scale the saturation plane of an HSV image in place
pub fn scale_saturation(hsv: &mut HsvImage, factor: f32) {
    Zip::from(hsv.saturation_mut()).par_for_each(|s| {
        *s = (*s * factor).min(1.0);
    });
}

/// Enhance saturation of an RGB image in place
pub fn enhance(img: &mut RgbImage, factor: f32, mode: SaturationMode) -> Result<()> {
    check_factor(factor)?;

    match mode {
        SaturationMode::Luma => enhance_luma(img, factor),
        SaturationMode::Hsv => {
            let mut planes = hsv::to_hsv(img)?;
            scale_saturation(&mut planes, factor);
            *img = hsv::to_rgb(&planes)?;
        }
    }
    Ok(())
}
