//! Lumen Layout
//!
//! Viewport-driven behavior for page sections:
//!
//! - **Visibility Trigger**: threshold-crossing signals for observed regions
//! - **Observation Guard**: scoped registration that unobserves on drop
//! - **Reveal Section**: letters animated in with a stagger when a section
//!   scrolls into view, plus its inverted selection colors
//!
//! # Example
//!
//! ```rust
//! use lumen_core::Rect;
//! use lumen_layout::{ObserveOptions, VisibilityTrigger};
//!
//! let trigger = VisibilityTrigger::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let region = trigger
//!     .observe(Rect::new(0.0, 800.0, 800.0, 400.0), ObserveOptions::default())
//!     .unwrap();
//!
//! assert_eq!(trigger.update_ratio(region, 0.6).len(), 1);
//! assert!(trigger.unobserve(region));
//! assert!(!trigger.unobserve(region));
//! ```

pub mod error;
pub mod reveal;
pub mod visibility;

pub use error::{Result, RevealError, VisibilityError};
pub use reveal::{Letter, RevealConfig, RevealSection};
pub use visibility::{
    visible_ratio, BecameVisible, ObservationGuard, ObserveOptions, RegionId, Signals,
    SubscriberId, VisibilityTrigger,
};
