//! Error types for lumen_layout

use lumen_animation::AnimationError;
use lumen_theme::ColorError;
use thiserror::Error;

/// Errors raised when registering a region for visibility tracking
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisibilityError {
    /// Threshold outside `[0, 1]`
    #[error("visibility threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}

/// Errors raised while mounting or configuring a reveal section
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RevealError {
    #[error(transparent)]
    Visibility(#[from] VisibilityError),

    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error(transparent)]
    Color(#[from] ColorError),
}

/// Result type for lumen_layout operations
pub type Result<T, E = RevealError> = std::result::Result<T, E>;
