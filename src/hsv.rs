//! RGB <-> HSV conversion over whole images
//!
//! Images are split into three `f32` planes (hue, saturation, value) shaped
//! `(height, width)`. Conversion is elementwise, so both directions run as a
//! parallel `ndarray::Zip` over the pixel grid.
//!
//! Hue is normalized to `[0, 1)`. The channel spread is offset by
//! [`DELTA_EPSILON`] before it is used as a divisor, which gives achromatic
//! pixels a stable (but meaningless) hue instead of a division by zero.

use image::RgbImage;
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};
use crate::error::{LensError, Result};

/// Offset added to `max - min` before dividing by it
pub const DELTA_EPSILON: f32 = 1e-6;

/// A single HSV triple, every component in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Hsv {
    pub fn hue_degrees(&self) -> f32 {
        self.hue * 360.0
    }
}

// ============================================================================
// PER-PIXEL CONVERSION
// ============================================================================

/// Convert an 8-bit RGB pixel to HSV
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let delta = maxc - minc + DELTA_EPSILON;

    // Ties resolve toward the later sector: blue over green over red
    let sector = if maxc == b {
        (r - g) / delta + 4.0
    } else if maxc == g {
        (b - r) / delta + 2.0
    } else {
        ((g - b) / delta).rem_euclid(6.0)
    };

    let saturation = if maxc == 0.0 {
        0.0
    } else {
        (delta / maxc).min(1.0)
    };

    Hsv {
        hue: (sector / 6.0) % 1.0,
        saturation,
        value: maxc,
    }
}

/// Convert HSV back to an 8-bit RGB pixel, rounding and clamping each channel
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let c = hsv.value * hsv.saturation;
    let h6 = (hsv.hue * 6.0).rem_euclid(6.0);
    let x = c * (1.0 - (h6 % 2.0 - 1.0).abs());
    let m = hsv.value - c;

    let (r, g, b) = match h6 as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [to_channel(r + m), to_channel(g + m), to_channel(b + m)]
}

fn to_channel(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// WHOLE-IMAGE CONVERSION
// ============================================================================

/// An image in HSV form, one plane per component
#[derive(Debug, Clone)]
pub struct HsvImage {
    hue: Array2<f32>,
    saturation: Array2<f32>,
    value: Array2<f32>,
}

impl HsvImage {
    /// (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        let (rows, cols) = self.hue.dim();
        (cols as u32, rows as u32)
    }

    pub fn hue(&self) -> &Array2<f32> {
        &self.hue
    }

    pub fn saturation(&self) -> &Array2<f32> {
        &self.saturation
    }

    pub fn value(&self) -> &Array2<f32> {
        &self.value
    }

    pub fn hue_mut(&mut self) -> &mut Array2<f32> {
        &mut self.hue
    }

    pub fn saturation_mut(&mut self) -> &mut Array2<f32> {
        &mut self.saturation
    }
}

fn rgb_view(img: &RgbImage) -> Result<ArrayView3<'_, u8>> {
    let (width, height) = img.dimensions();
    let shape = (height as usize, width as usize, 3);
    let len = shape.0 * shape.1 * 3;
    ArrayView3::from_shape(shape, &img.as_raw()[..len])
        .map_err(|e| LensError::Processing(format!("Pixel buffer has unexpected shape: {}", e)))
}

/// Convert a whole RGB image to HSV planes
pub fn to_hsv(img: &RgbImage) -> Result<HsvImage> {
    let pixels = rgb_view(img)?;
    let shape = (pixels.dim().0, pixels.dim().1);

    let mut hue = Array2::<f32>::zeros(shape);
    let mut saturation = Array2::<f32>::zeros(shape);
    let mut value = Array2::<f32>::zeros(shape);

    Zip::from(&mut hue)
        .and(&mut saturation)
        .and(&mut value)
        .and(pixels.lanes(Axis(2)))
        .par_for_each(|h, s, v, px| {
            let hsv = rgb_to_hsv(px[0], px[1], px[2]);
            *h = hsv.hue;
            *s = hsv.saturation;
            *v = hsv.value;
        });

    Ok(HsvImage { hue, saturation, value })
}

/// Convert HSV planes back to an 8-bit RGB image
pub fn to_rgb(hsv: &HsvImage) -> Result<RgbImage> {
    let (width, height) = hsv.dimensions();
    let mut out = Array3::<u8>::zeros((height as usize, width as usize, 3));

    Zip::from(out.lanes_mut(Axis(2)))
        .and(hsv.hue())
        .and(hsv.saturation())
        .and(hsv.value())
        .par_for_each(|mut px, &hue, &saturation, &value| {
            let [r, g, b] = hsv_to_rgb(Hsv { hue, saturation, value });
            px[0] = r;
            px[1] = g;
            px[2] = b;
        });

    let (raw, _) = out.into_raw_vec_and_offset();
    RgbImage::from_raw(width, height, raw)
        .ok_or_else(|| LensError::Processing("RGB buffer too small for image dimensions".to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use palette::{FromColor, Srgb};

    fn channel_diff(a: [u8; 3], b: [u8; 3]) -> i16 {
        (0..3)
            .map(|i| (a[i] as i16 - b[i] as i16).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_primary_hues() {
        assert!(rgb_to_hsv(255, 0, 0).hue_degrees().abs() < 0.01);
        assert!((rgb_to_hsv(0, 255, 0).hue_degrees() - 120.0).abs() < 0.01);
        assert!((rgb_to_hsv(0, 0, 255).hue_degrees() - 240.0).abs() < 0.01);
        assert!((rgb_to_hsv(255, 255, 0).hue_degrees() - 60.0).abs() < 0.01);
        assert!((rgb_to_hsv(255, 0, 255).hue_degrees() - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_black_has_zero_saturation() {
        let hsv = rgb_to_hsv(0, 0, 0);
        assert_eq!(hsv.saturation, 0.0);
        assert_eq!(hsv.value, 0.0);
    }

    #[test]
    fn test_gray_is_stable_and_nearly_unsaturated() {
        let a = rgb_to_hsv(128, 128, 128);
        let b = rgb_to_hsv(128, 128, 128);
        assert_eq!(a, b);
        assert!(a.saturation < 1e-5);
        assert!((a.hue_degrees() - 240.0).abs() < 0.01);
    }

    #[test]
    fn test_saturation_never_exceeds_one() {
        for v in 1..=255u8 {
            assert!(rgb_to_hsv(v, 0, 0).saturation <= 1.0);
        }
    }

    #[test]
    fn test_matches_reference_hsv() {
        let samples = [
            (200u8, 40u8, 90u8),
            (30, 180, 60),
            (20, 70, 220),
            (250, 200, 10),
            (120, 10, 200),
            (10, 200, 190),
        ];

        for (r, g, b) in samples {
            let ours = rgb_to_hsv(r, g, b);
            let reference = palette::Hsv::from_color(Srgb::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
            ));

            let ref_deg = reference.hue.into_positive_degrees();
            let diff = (ours.hue_degrees() - ref_deg).abs();
            assert!(diff.min(360.0 - diff) < 0.1, "hue mismatch for ({}, {}, {})", r, g, b);
            assert!((ours.saturation - reference.saturation).abs() < 1e-3);
            assert!((ours.value - reference.value).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pixel_roundtrip_within_one() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let back = hsv_to_rgb(rgb_to_hsv(r, g, b));
                    assert!(
                        channel_diff([r, g, b], back) <= 1,
                        "({}, {}, {}) came back as {:?}",
                        r, g, b, back
                    );
                }
            }
        }
    }

    #[test]
    fn test_adversarial_hsv_is_clamped() {
        let cases = [
            Hsv { hue: 0.999_999, saturation: 1.0, value: 1.0 },
            Hsv { hue: 1.0, saturation: 1.0, value: 1.0 },
            Hsv { hue: -0.25, saturation: 1.0, value: 1.0 },
            Hsv { hue: 0.5, saturation: 1.5, value: 1.2 },
            Hsv { hue: 0.3, saturation: -0.5, value: 1.1 },
        ];
        for hsv in cases {
            // u8 output is in range by type; make sure nothing panics and extremes saturate
            let rgb = hsv_to_rgb(hsv);
            assert!(rgb.iter().any(|&c| c == 255), "{:?} -> {:?}", hsv, rgb);
        }
    }

    #[test]
    fn test_hue_one_wraps_to_red() {
        assert_eq!(hsv_to_rgb(Hsv { hue: 1.0, saturation: 1.0, value: 1.0 }), [255, 0, 0]);
    }

    #[test]
    fn test_image_roundtrip_preserves_shape_and_pixels() {
        let img = RgbImage::from_fn(7, 5, |x, y| {
            Rgb([(x * 36) as u8, (y * 50) as u8, ((x + y) * 20) as u8])
        });

        let hsv = to_hsv(&img).unwrap();
        assert_eq!(hsv.dimensions(), (7, 5));

        let back = to_rgb(&hsv).unwrap();
        assert_eq!(back.dimensions(), img.dimensions());
        for (x, y, px) in img.enumerate_pixels() {
            assert!(channel_diff(px.0, back.get_pixel(x, y).0) <= 1);
        }
    }

    #[test]
    fn test_image_planes_match_pixel_conversion() {
        let img = RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, 200, (y * 90) as u8]));
        let hsv = to_hsv(&img).unwrap();
        for (x, y, px) in img.enumerate_pixels() {
            let idx = [y as usize, x as usize];
            let expected = rgb_to_hsv(px[0], px[1], px[2]);
            assert_eq!(hsv.hue()[idx], expected.hue);
            assert_eq!(hsv.saturation()[idx], expected.saturation);
            assert_eq!(hsv.value()[idx], expected.value);
        }
    }
}
