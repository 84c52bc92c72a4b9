//! RGBA normalization
//!
//! Turns any accepted [`ColorSpec`] plus an opacity into an [`Rgba`]
//! descriptor. Pure: the same inputs always produce the same descriptor.
//!
//! # Example
//!
//! ```
//! use lumen_theme::to_rgba;
//!
//! let highlight = to_rgba("#ffffff", 0.7).unwrap();
//! assert_eq!(highlight.to_string(), "rgba(255, 255, 255, 0.7)");
//! ```

use crate::error::{ColorError, Result};
use crate::parse::parse_color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB channels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from wide channels, `None` if any is outside `0..=255`
    pub fn from_channels<T>(channels: [T; 3]) -> Option<Self>
    where
        T: TryInto<u8>,
    {
        let [r, g, b] = channels;
        Some(Self::new(
            r.try_into().ok()?,
            g.try_into().ok()?,
            b.try_into().ok()?,
        ))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// A color as supplied by a theme: CSS text or a numeric triple
///
/// Numeric triples are wider than `u8` so that out-of-range input reaches
/// validation instead of wrapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Rgb([i32; 3]),
    Css(String),
}

impl ColorSpec {
    /// Resolve to RGB channels
    pub fn resolve(&self) -> Result<Rgb> {
        match self {
            ColorSpec::Css(text) => parse_color(text),
            ColorSpec::Rgb(channels) => Rgb::from_channels(*channels).ok_or_else(|| {
                ColorError::invalid(format!("{channels:?}"), "channel out of range")
            }),
        }
    }
}

impl From<&str> for ColorSpec {
    fn from(value: &str) -> Self {
        ColorSpec::Css(value.to_string())
    }
}

impl From<String> for ColorSpec {
    fn from(value: String) -> Self {
        ColorSpec::Css(value)
    }
}

impl From<[i32; 3]> for ColorSpec {
    fn from(value: [i32; 3]) -> Self {
        ColorSpec::Rgb(value)
    }
}

impl From<Rgb> for ColorSpec {
    fn from(rgb: Rgb) -> Self {
        ColorSpec::Rgb([rgb.r as i32, rgb.g as i32, rgb.b as i32])
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpec::Css(text) => f.write_str(text),
            ColorSpec::Rgb([r, g, b]) => write!(f, "rgb({r}, {g}, {b})"),
        }
    }
}

/// Normalized color: 8-bit channels plus alpha in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    /// Attach an alpha to RGB channels, validating the alpha
    pub fn new(rgb: Rgb, alpha: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ColorError::OpacityOutOfRange(alpha));
        }
        Ok(Self {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
            a: alpha,
        })
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    /// CSS functional notation, e.g. `rgba(255, 255, 255, 0.7)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Convert a color spec to RGBA at the given opacity
///
/// Opacity is checked first, so an out-of-range opacity is reported even
/// when the color is also invalid.
pub fn to_rgba(color: impl Into<ColorSpec>, opacity: f32) -> Result<Rgba> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(ColorError::OpacityOutOfRange(opacity));
    }
    let color = color.into();
    let rgb = color.resolve().map_err(|err| {
        tracing::debug!("to_rgba: {}", err);
        err
    })?;
    Rgba::new(rgb, opacity)
}
