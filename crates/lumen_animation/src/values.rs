//! Animatable value types
//!
//! Provides the interpolation trait and the visual state each reveal target
//! moves through.

use serde::{Deserialize, Serialize};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t
    ///
    /// `t` is not clamped: overshooting curves extrapolate past `other`.
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// f32 Implementation
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Visual State
// ============================================================================

/// Opacity and vertical offset of a single target
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub opacity: f32,
    /// Vertical offset in logical pixels, positive is downward
    pub offset_y: f32,
}

impl VisualState {
    /// Transparent and pushed 50 units down
    pub const HIDDEN: VisualState = VisualState::new(0.0, 50.0);
    /// Fully opaque at rest
    pub const SHOWN: VisualState = VisualState::new(1.0, 0.0);

    pub const fn new(opacity: f32, offset_y: f32) -> Self {
        Self { opacity, offset_y }
    }

    /// Opacity clamped to what a renderer can display
    ///
    /// Elastic curves push the raw channel past 1.0 mid-flight.
    pub fn render_opacity(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0)
    }
}

impl Interpolate for VisualState {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        VisualState {
            opacity: self.opacity.lerp(&other.opacity, t),
            offset_y: self.offset_y.lerp(&other.offset_y, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.opacity.approx_eq(&other.opacity, epsilon)
            && self.offset_y.approx_eq(&other.offset_y, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_visual_state_channels_share_progress() {
        let mid = VisualState::HIDDEN.lerp(&VisualState::SHOWN, 0.5);
        assert!(mid.approx_eq(&VisualState::new(0.5, 25.0), 1e-6));
    }

    #[test]
    fn test_overshoot_extrapolates() {
        let past = VisualState::HIDDEN.lerp(&VisualState::SHOWN, 1.2);
        assert!((past.opacity - 1.2).abs() < 1e-5);
        assert!((past.offset_y + 10.0).abs() < 1e-4);
        assert_eq!(past.render_opacity(), 1.0);
    }
}
