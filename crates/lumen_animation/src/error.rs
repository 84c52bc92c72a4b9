//! Error types for lumen_animation

use thiserror::Error;

/// Errors raised while configuring animations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Stagger interval, duration or easing parameters outside their valid range
    #[error("invalid stagger config: {0}")]
    InvalidStaggerConfig(String),

    /// Easing name that does not match any known curve
    #[error("unknown easing '{0}'")]
    UnknownEasing(String),
}

/// Result type for lumen_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
