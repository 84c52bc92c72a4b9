//! Easing functions
//!
//! Maps normalized progress (0.0 to 1.0) to eased progress. Most curves stay
//! within `[0, 1]`; [`Easing::ElasticOut`] overshoots before settling on 1.0.

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Amplitude used when an elastic curve is named without parameters
pub const DEFAULT_ELASTIC_AMPLITUDE: f32 = 1.0;
/// Period used when an elastic curve is named without parameters
pub const DEFAULT_ELASTIC_PERIOD: f32 = 0.3;

/// Easing curve applied to animation progress
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    /// Cubic ease-in
    EaseIn,
    /// Cubic ease-out
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    /// Overshoot-and-settle curve
    ///
    /// `amplitude` scales the overshoot (values below 1 are treated as 1 and
    /// shorten the period instead), `period` is the oscillation period in
    /// normalized progress units.
    ElasticOut { amplitude: f32, period: f32 },
}

impl Easing {
    /// Elastic-out with the given amplitude and period
    pub const fn elastic_out(amplitude: f32, period: f32) -> Self {
        Easing::ElasticOut { amplitude, period }
    }

    /// Apply the curve to progress `t`, clamped to `[0, 1]` first
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::ElasticOut { amplitude, period } => elastic_out(t, amplitude, period),
        }
    }

    /// Reject parameters the curve cannot be evaluated with
    pub fn validate(&self) -> Result<(), AnimationError> {
        if let Easing::ElasticOut { amplitude, period } = *self {
            if !(amplitude.is_finite() && amplitude > 0.0) {
                return Err(AnimationError::InvalidStaggerConfig(format!(
                    "elastic amplitude must be a positive number, got {amplitude}"
                )));
            }
            if !(period.is_finite() && period > 0.0) {
                return Err(AnimationError::InvalidStaggerConfig(format!(
                    "elastic period must be a positive number, got {period}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::elastic_out(DEFAULT_ELASTIC_AMPLITUDE, DEFAULT_ELASTIC_PERIOD)
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    let overshoot = amplitude.max(1.0);
    let wavelength = period / amplitude.min(1.0);
    // Phase shift that puts the curve at exactly 0 for t = 0
    let shift = wavelength / TAU * (1.0 / overshoot).asin();
    overshoot * 2f32.powf(-10.0 * t) * ((t - shift) * TAU / wavelength).sin() + 1.0
}

// ============================================================================
// Names
// ============================================================================

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("linear"),
            Easing::EaseIn => f.write_str("ease-in"),
            Easing::EaseOut => f.write_str("ease-out"),
            Easing::EaseInOut => f.write_str("ease-in-out"),
            Easing::EaseInQuad => f.write_str("ease-in-quad"),
            Easing::EaseOutQuad => f.write_str("ease-out-quad"),
            Easing::ElasticOut { amplitude, period } => {
                write!(f, "elastic-out({amplitude}, {period})")
            }
        }
    }
}

impl FromStr for Easing {
    type Err = AnimationError;

    /// Parse names like `linear`, `ease-out`, `elastic-out` or
    /// `elastic.out(1, 0.3)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || AnimationError::UnknownEasing(s.to_string());
        let name = s.trim().to_ascii_lowercase();

        let (base, args) = match name.split_once('(') {
            Some((base, rest)) => {
                let args = rest.strip_suffix(')').ok_or_else(unknown)?;
                (base.trim().replace('.', "-"), Some(args.to_string()))
            }
            None => (name.replace('.', "-"), None),
        };

        let easing = match base.as_str() {
            "linear" | "none" => Easing::Linear,
            "ease-in" | "cubic-in" => Easing::EaseIn,
            "ease-out" | "cubic-out" => Easing::EaseOut,
            "ease-in-out" | "cubic-in-out" => Easing::EaseInOut,
            "ease-in-quad" | "quad-in" => Easing::EaseInQuad,
            "ease-out-quad" | "quad-out" => Easing::EaseOutQuad,
            "elastic-out" | "elastic" => {
                let (amplitude, period) = match args.as_deref() {
                    None => (DEFAULT_ELASTIC_AMPLITUDE, DEFAULT_ELASTIC_PERIOD),
                    Some(args) => parse_elastic_args(args).ok_or_else(unknown)?,
                };
                let easing = Easing::elastic_out(amplitude, period);
                easing.validate()?;
                return Ok(easing);
            }
            _ => return Err(unknown()),
        };

        if args.is_some() {
            return Err(unknown());
        }
        Ok(easing)
    }
}

/// `"a"` or `"a, p"`; a missing period falls back to the default
fn parse_elastic_args(args: &str) -> Option<(f32, f32)> {
    let mut parts = args.split(',').map(str::trim);
    let amplitude = match parts.next() {
        Some("") | None => DEFAULT_ELASTIC_AMPLITUDE,
        Some(a) => a.parse().ok()?,
    };
    let period = match parts.next() {
        None => DEFAULT_ELASTIC_PERIOD,
        Some(p) => p.parse().ok()?,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((amplitude, period))
}

impl TryFrom<String> for Easing {
    type Error = AnimationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}
