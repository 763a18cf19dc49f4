//! Human-readable names and hex codes for RGB colors
//!
//! Naming is a small decision table evaluated top to bottom; the first rule
//! whose channel bounds all hold wins, anything else is a "Custom Shade".

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of names a color can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCategory {
    #[serde(rename = "Crimson Red")]
    CrimsonRed,
    #[serde(rename = "Deep Blue")]
    DeepBlue,
    #[serde(rename = "Teal")]
    Teal,
    #[serde(rename = "Off White")]
    OffWhite,
    #[serde(rename = "Near Black")]
    NearBlack,
    #[serde(rename = "Custom Shade")]
    CustomShade,
}

impl ColorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorCategory::CrimsonRed => "Crimson Red",
            ColorCategory::DeepBlue => "Deep Blue",
            ColorCategory::Teal => "Teal",
            ColorCategory::OffWhite => "Off White",
            ColorCategory::NearBlack => "Near Black",
            ColorCategory::CustomShade => "Custom Shade",
        }
    }
}

impl fmt::Display for ColorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict bound on one channel
#[derive(Debug, Clone, Copy)]
enum Bound {
    Above(u8),
    Below(u8),
}

impl Bound {
    fn holds(self, v: u8) -> bool {
        match self {
            Bound::Above(t) => v > t,
            Bound::Below(t) => v < t,
        }
    }
}

struct LabelRule {
    category: ColorCategory,
    red: Bound,
    green: Bound,
    blue: Bound,
}

impl LabelRule {
    fn matches(&self, [r, g, b]: [u8; 3]) -> bool {
        self.red.holds(r) && self.green.holds(g) && self.blue.holds(b)
    }
}

const LABEL_RULES: [LabelRule; 5] = [
    LabelRule {
        category: ColorCategory::CrimsonRed,
        red: Bound::Above(200),
        green: Bound::Below(80),
        blue: Bound::Below(80),
    },
    LabelRule {
        category: ColorCategory::DeepBlue,
        red: Bound::Below(80),
        green: Bound::Below(80),
        blue: Bound::Above(150),
    },
    LabelRule {
        category: ColorCategory::Teal,
        red: Bound::Below(100),
        green: Bound::Above(150),
        blue: Bound::Above(150),
    },
    LabelRule {
        category: ColorCategory::OffWhite,
        red: Bound::Above(200),
        green: Bound::Above(200),
        blue: Bound::Above(200),
    },
    LabelRule {
        category: ColorCategory::NearBlack,
        red: Bound::Below(60),
        green: Bound::Below(60),
        blue: Bound::Below(60),
    },
];

/// Name an RGB color
pub fn label(rgb: [u8; 3]) -> ColorCategory {
    LABEL_RULES
        .iter()
        .find(|rule| rule.matches(rgb))
        .map(|rule| rule.category)
        .unwrap_or(ColorCategory::CustomShade)
}

/// Format as `#RRGGBB` with uppercase digits
pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Clamp raw channel values into `[0, 255]`, warning when any was out of range
pub fn clamp_rgb(raw: [i32; 3]) -> [u8; 3] {
    let clamped = raw.map(|c| c.clamp(0, 255) as u8);
    if raw.iter().any(|&c| !(0..=255).contains(&c)) {
        tracing::warn!(?raw, ?clamped, "color channel out of range, clamped");
    }
    clamped
}

/// One entry of a color summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledColor {
    pub name: ColorCategory,
    pub rgb: [u8; 3],
    pub hex: String,
}

impl LabeledColor {
    pub fn new(rgb: [u8; 3]) -> Self {
        Self {
            name: label(rgb),
            rgb,
            hex: to_hex(rgb),
        }
    }

    /// Build from unchecked channel values, clamping into range
    pub fn from_raw(raw: [i32; 3]) -> Self {
        Self::new(clamp_rgb(raw))
    }
}
