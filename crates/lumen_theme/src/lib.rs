//! Lumen Theme Colors
//!
//! Resolves theme colors without a rendering engine:
//!
//! - **Parsing**: hex, `rgb()`/`rgba()` and the CSS named-color table
//! - **RGBA normalization**: any color plus an opacity, as a CSS `rgba()` value
//! - **Selection colors**: the inverted highlight pair derived from a theme
//!
//! # Example
//!
//! ```rust
//! use lumen_theme::{SelectionColors, SelectionConfig, ThemeColors};
//!
//! let theme = ThemeColors::new("black", "#ffffff");
//! let selection = SelectionColors::derive(&theme, &SelectionConfig::default()).unwrap();
//!
//! assert_eq!(selection.background.to_string(), "rgba(0, 0, 0, 0.7)");
//! assert_eq!(selection.foreground.to_string(), "rgba(255, 255, 255, 1)");
//! ```

pub mod error;
pub mod named;
pub mod parse;
pub mod rgba;
pub mod selection;

pub use error::{ColorError, Result};
pub use parse::parse_color;
pub use rgba::{to_rgba, ColorSpec, Rgb, Rgba};
pub use selection::{
    SelectionColors, SelectionConfig, SharedTheme, ThemeColors, ThemeSubscription,
};
