//! Lumen Animation System
//!
//! Easing curves and staggered, tick-driven reveal sequencing.
//!
//! # Features
//!
//! - **Easing**: polynomial curves plus a parameterized elastic-out
//! - **Stagger Animator**: drives an ordered set of targets with per-index delays
//! - **Last-Writer-Wins**: a new run supersedes pending transitions per target
//! - **Frame Clock**: wall-clock frame deltas for hosts without their own timer

pub mod clock;
pub mod easing;
pub mod error;
pub mod stagger;
pub mod values;

pub use clock::FrameClock;
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use stagger::{
    AnimationRun, RunId, StaggerAnimator, StaggerConfig, TargetId, TargetPhase, TargetUpdate,
    TickUpdates,
};
pub use values::{Interpolate, VisualState};
