//! Lumen configuration file handling
//!
//! A single `lumen.toml` tunes the reveal section, the theme pair the
//! selection colors are derived from, and the simulated page geometry:
//!
//! ```toml
//! [reveal.visibility]
//! threshold = 0.5
//! fire_once = false
//!
//! [reveal.stagger]
//! stagger_ms = 100.0
//! duration_ms = 1500.0
//! easing = "elastic-out(1, 0.3)"
//!
//! [theme]
//! primary = "#ffffff"
//! background = "#1e90ff"
//! ```

use anyhow::{Context, Result};
use lumen_core::Rect;
use lumen_layout::RevealConfig;
use lumen_theme::ThemeColors;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root of `lumen.toml`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default = "default_theme")]
    pub theme: ThemeColors,
    #[serde(default)]
    pub page: PageConfig,
}

fn default_theme() -> ThemeColors {
    ThemeColors::new("#ffffff", "#1e90ff")
}

/// Simulated page geometry in logical pixels
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageConfig {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
    /// Distance from the top of the page to the section
    #[serde(default = "default_section_top")]
    pub section_top: f32,
    #[serde(default = "default_section_height")]
    pub section_height: f32,
}

fn default_viewport_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    720.0
}

fn default_section_top() -> f32 {
    1440.0
}

fn default_section_height() -> f32 {
    720.0
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            section_top: default_section_top(),
            section_height: default_section_height(),
        }
    }
}

impl PageConfig {
    /// Viewport at the top of the page
    pub fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport_width, self.viewport_height)
    }

    pub fn section(&self) -> Rect {
        Rect::new(0.0, self.section_top, self.viewport_width, self.section_height)
    }
}

impl Default for LumenConfig {
    fn default() -> Self {
        Self {
            reveal: RevealConfig::default(),
            theme: default_theme(),
            page: PageConfig::default(),
        }
    }
}

impl LumenConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self> {
        let config: LumenConfig = toml::from_str(content).context("Failed to parse config")?;
        config.reveal.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_animation::Easing;
    use lumen_theme::ColorSpec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LumenConfig::parse("").unwrap();
        assert_eq!(config, LumenConfig::default());
        assert_eq!(config.reveal.visibility.threshold, 0.5);
        assert_eq!(config.reveal.stagger.duration_ms, 1500.0);
    }

    #[test]
    fn test_partial_config() {
        let config = LumenConfig::parse(
            r##"
            [reveal.visibility]
            fire_once = true

            [reveal.stagger]
            easing = "elastic.out(1.2, 0.4)"

            [theme]
            primary = [255, 200, 0]
            background = "navy"

            [page]
            section_top = 2000.0
            "##,
        )
        .unwrap();

        assert!(config.reveal.visibility.fire_once);
        assert_eq!(config.reveal.stagger.easing, Easing::elastic_out(1.2, 0.4));
        assert_eq!(config.theme.primary, ColorSpec::Rgb([255, 200, 0]));
        assert_eq!(config.theme.background, ColorSpec::from("navy"));
        assert_eq!(config.page.section().y(), 2000.0);
        assert_eq!(config.page.viewport_height, 720.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LumenConfig::parse("[reveal.visibility]\nthreshold = 2.0\n").is_err());
        assert!(LumenConfig::parse("[reveal.stagger]\nstagger_ms = -5.0\n").is_err());
        assert!(LumenConfig::parse("[reveal.stagger]\neasing = \"bounce\"\n").is_err());
    }

    #[test]
    fn test_default_config_round_trips() {
        let text = LumenConfig::default().to_toml().unwrap();
        assert_eq!(LumenConfig::parse(&text).unwrap(), LumenConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = LumenConfig::load(Path::new("/nonexistent/lumen.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
