//! Style records for nodes and edges.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Some(Self::rgb(
                byte(digits.get(0..2)?)?,
                byte(digits.get(2..4)?)?,
                byte(digits.get(4..6)?)?,
            )),
            8 => Some(Self::new(
                byte(digits.get(0..2)?)?,
                byte(digits.get(2..4)?)?,
                byte(digits.get(4..6)?)?,
                byte(digits.get(6..8)?)?,
            )),
            _ => None,
        }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke dash style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern in world units for a given stroke width.
    pub fn dash_pattern(self, width: f64) -> Vec<f64> {
        match self {
            StrokeStyle::Solid => Vec::new(),
            StrokeStyle::Dashed => vec![width * 4.0, width * 3.0],
            StrokeStyle::Dotted => vec![width, width * 2.0],
        }
    }
}

/// Visual style of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStyle {
    pub fill: SerializableColor,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    pub text_color: SerializableColor,
    pub font_size: f64,
    pub bold: bool,
    pub opacity: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: SerializableColor::white(),
            stroke: SerializableColor::rgb(0x72, 0x2e, 0xd1),
            stroke_width: 2.0,
            text_color: SerializableColor::new(0, 0, 0, 230),
            font_size: 12.0,
            bold: false,
            opacity: 1.0,
        }
    }
}

/// Visual style of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeStyle {
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub selected_stroke: SerializableColor,
    pub label_color: SerializableColor,
    pub label_background: SerializableColor,
    pub font_size: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke: SerializableColor::rgb(0x8c, 0x8c, 0x8c),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            selected_stroke: SerializableColor::rgb(0x18, 0x90, 0xff),
            label_color: SerializableColor::new(0, 0, 0, 166),
            label_background: SerializableColor::white(),
            font_size: 12.0,
        }
    }
}
