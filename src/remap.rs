//! Hue remapping
//!
//! A fixed heuristic that pushes the two bands hardest to tell apart for
//! red/green deficient viewers into more distinguishable ones:
//! reds (`< 20°` or `> 340°`) become purple (280°) and greens
//! (`90° < h < 150°`) become cyan (190°). All bounds are exclusive.
//! Saturation and value are never touched.

use ndarray::Zip;
use serde::{Deserialize, Serialize};
use crate::hsv::{Hsv, HsvImage};

// ============================================================================
// SETTINGS
// ============================================================================

/// Hue bands and their targets, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueRemapRules {
    /// Hues strictly below this are treated as red (default: 20)
    pub red_below: f32,
    /// Hues strictly above this are treated as red (default: 340)
    pub red_above: f32,
    /// Replacement hue for the red band (default: 280, purple)
    pub red_target: f32,
    /// Green band lower bound, exclusive (default: 90)
    pub green_above: f32,
    /// Green band upper bound, exclusive (default: 150)
    pub green_below: f32,
    /// Replacement hue for the green band (default: 190, cyan)
    pub green_target: f32,
}

impl Default for HueRemapRules {
    fn default() -> Self {
        Self {
            red_below: 20.0,
            red_above: 340.0,
            red_target: 280.0,
            green_above: 90.0,
            green_below: 150.0,
            green_target: 190.0,
        }
    }
}

impl HueRemapRules {
    /// Remap a single hue given in degrees
    pub fn remap_degrees(&self, degrees: f32) -> f32 {
        if degrees < self.red_below || degrees > self.red_above {
            self.red_target
        } else if degrees > self.green_above && degrees < self.green_below {
            self.green_target
        } else {
            degrees
        }
    }

    /// Remap a normalized hue in `[0, 1)`
    pub fn remap_hue(&self, hue: f32) -> f32 {
        self.remap_degrees(hue * 360.0) / 360.0
    }

    /// Remap one HSV triple; only the hue may change
    pub fn remap(&self, hsv: Hsv) -> Hsv {
        Hsv {
            hue: self.remap_hue(hsv.hue),
            ..hsv
        }
    }
}

/// Apply the remap rules to the hue plane of a whole image in place
pub fn remap_image(hsv: &mut HsvImage, rules: &HueRemapRules) {
    Zip::from(hsv.hue_mut()).par_for_each(|h| {
        *h = rules.remap_hue(*h);
    });
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hsv::to_hsv;
    use image::{Rgb, RgbImage};

    fn in_red_band(deg: f32) -> bool {
        deg < 20.0 || deg > 340.0
    }

    fn in_green_band(deg: f32) -> bool {
        deg > 90.0 && deg < 150.0
    }

    #[test]
    fn test_band_coverage() {
        let rules = HueRemapRules::default();
        let mut deg = 0.0f32;
        while deg < 360.0 {
            let out = rules.remap_degrees(deg);
            if in_red_band(deg) {
                assert_eq!(out, 280.0, "red band at {}", deg);
            } else if in_green_band(deg) {
                assert_eq!(out, 190.0, "green band at {}", deg);
            } else {
                assert_eq!(out, deg, "identity at {}", deg);
            }
            deg += 0.25;
        }
    }

    #[test]
    fn test_exact_boundaries_are_exclusive() {
        let rules = HueRemapRules::default();
        assert_eq!(rules.remap_degrees(20.0), 20.0);
        assert_eq!(rules.remap_degrees(340.0), 340.0);
        assert_eq!(rules.remap_degrees(90.0), 90.0);
        assert_eq!(rules.remap_degrees(150.0), 150.0);

        assert_eq!(rules.remap_degrees(19.999), 280.0);
        assert_eq!(rules.remap_degrees(340.001), 280.0);
        assert_eq!(rules.remap_degrees(90.001), 190.0);
        assert_eq!(rules.remap_degrees(149.999), 190.0);
    }

    #[test]
    fn test_normalized_hue_remap() {
        let rules = HueRemapRules::default();
        assert!((rules.remap_hue(0.0) - 280.0 / 360.0).abs() < 1e-6);
        assert!((rules.remap_hue(120.0 / 360.0) - 190.0 / 360.0).abs() < 1e-6);
        assert!((rules.remap_hue(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_remap_keeps_saturation_and_value() {
        let rules = HueRemapRules::default();
        let input = Hsv { hue: 0.01, saturation: 0.37, value: 0.81 };
        let out = rules.remap(input);
        assert_eq!(out.saturation, input.saturation);
        assert_eq!(out.value, input.value);
        assert_ne!(out.hue, input.hue);
    }

    #[test]
    fn test_image_remap_touches_only_hue() {
        let img = RgbImage::from_fn(6, 4, |x, y| {
            Rgb([(x * 40) as u8 + 20, (y * 60) as u8, 255 - (x * 30) as u8])
        });
        let original = to_hsv(&img).unwrap();
        let mut remapped = original.clone();
        remap_image(&mut remapped, &HueRemapRules::default());

        assert_eq!(remapped.saturation(), original.saturation());
        assert_eq!(remapped.value(), original.value());

        let rules = HueRemapRules::default();
        for (a, b) in original.hue().iter().zip(remapped.hue().iter()) {
            assert_eq!(*b, rules.remap_hue(*a));
        }
    }

    #[test]
    fn test_custom_rules() {
        let rules = HueRemapRules {
            red_below: 10.0,
            red_target: 300.0,
            ..HueRemapRules::default()
        };
        assert_eq!(rules.remap_degrees(15.0), 15.0);
        assert_eq!(rules.remap_degrees(5.0), 300.0);
    }
}
