//! Lumen Core
//!
//! Foundational geometry shared by the Lumen crates:
//!
//! - **Point / Size / Rect**: viewport-space geometry in logical pixels
//! - **Intersection area**: the measurement visibility tracking is built on
//!
//! # Example
//!
//! ```rust
//! use lumen_core::Rect;
//!
//! let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
//! let section = Rect::new(0.0, 300.0, 800.0, 600.0);
//!
//! let visible = section.intersection(&viewport).map(|r| r.area()).unwrap_or(0.0);
//! assert_eq!(visible / section.area(), 0.5);
//! ```

pub mod geometry;

pub use geometry::{Point, Rect, Size};
