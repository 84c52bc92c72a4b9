//! Error types for lumen_theme

use thiserror::Error;

/// Errors raised while resolving colors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    /// Input that does not resolve to an RGB triple
    #[error("invalid color spec '{input}': {reason}")]
    InvalidColorSpec { input: String, reason: &'static str },

    /// Requested opacity outside `[0, 1]`
    #[error("opacity {0} is outside [0, 1]")]
    OpacityOutOfRange(f32),
}

impl ColorError {
    pub(crate) fn invalid(input: impl Into<String>, reason: &'static str) -> Self {
        ColorError::InvalidColorSpec {
            input: input.into(),
            reason,
        }
    }
}

/// Result type for lumen_theme operations
pub type Result<T> = std::result::Result<T, ColorError>;
