use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

/// Linear RGBA colour, components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(pub [f32; 4]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized colour: {:?}", self.0)
    }
}

impl std::error::Error for ColorParseError {}

impl Color {
    pub const BLACK: Color = Color([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Color([
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            a.clamp(0.0, 1.0),
        ])
    }

    pub fn alpha(&self) -> f32 {
        self.0[3]
    }

    /// Parses a CSS colour: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`,
    /// `rgba(..)`, `black` or `white`.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(s.to_string());
        let t = s.trim();

        if let Some(hex) = t.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }

        let lower = t.to_ascii_lowercase();
        match lower.as_str() {
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            _ => {}
        }

        let (body, with_alpha) = if let Some(b) = lower.strip_prefix("rgba(") {
            (b, true)
        } else if let Some(b) = lower.strip_prefix("rgb(") {
            (b, false)
        } else {
            return Err(err());
        };
        let body = body.strip_suffix(')').ok_or_else(err)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if with_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(err());
        }

        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().map_err(|_| err())?;
        }
        let a = if with_alpha {
            parts[3].parse::<f32>().map_err(|_| err())?
        } else {
            1.0
        };
        Ok(Color::rgba(rgb[0], rgb[1], rgb[2], a))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgba(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            1.0,
        )),
        6 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(Color::rgba(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            f32::from(byte(6)?) / 255.0,
        )),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

/// Stroke colour of a style: one colour for everything, or a colour chosen
/// per arc from a usage count table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Color")]
pub enum StrokeStyle {
    Constant(Color),
    /// Arcs with `counts[i] > 0` get `used`, every other arc gets `unused`.
    PerArc {
        counts: Rc<[u8]>,
        used: Color,
        unused: Color,
    },
}

impl StrokeStyle {
    pub fn per_arc(counts: Vec<u8>, used: Color, unused: Color) -> Self {
        StrokeStyle::PerArc {
            counts: counts.into(),
            used,
            unused,
        }
    }

    /// Colour for arc `index`. Constant strokes ignore the index.
    pub fn color(&self, index: usize) -> Color {
        match self {
            StrokeStyle::Constant(c) => *c,
            StrokeStyle::PerArc {
                counts,
                used,
                unused,
            } => {
                if counts.get(index).is_some_and(|n| *n > 0) {
                    *used
                } else {
                    *unused
                }
            }
        }
    }
}

impl From<Color> for StrokeStyle {
    fn from(c: Color) -> Self {
        StrokeStyle::Constant(c)
    }
}

/// Visual parameters for drawing one render group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Style {
    pub stroke_color: Option<StrokeStyle>,
    pub stroke_width: Option<f32>,
    pub fill_color: Option<Color>,
    pub dot_color: Option<Color>,
    pub dot_size: Option<f32>,
}

impl Style {
    pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;
    pub const DEFAULT_DOT_SIZE: f32 = 3.0;

    pub fn stroke_width_or_default(&self) -> f32 {
        self.stroke_width.unwrap_or(Self::DEFAULT_STROKE_WIDTH)
    }

    pub fn dot_size_or_default(&self) -> f32 {
        self.dot_size.unwrap_or(Self::DEFAULT_DOT_SIZE)
    }
}
