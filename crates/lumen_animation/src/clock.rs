//! Wall-clock frame timing
//!
//! [`StaggerAnimator`](crate::StaggerAnimator) never reads the clock itself.
//! Hosts with their own frame callbacks pass deltas straight to `tick`; hosts
//! without one measure real elapsed time with a [`FrameClock`].

use std::time::{Duration, Instant};

/// Measures the time between successive frames
#[derive(Clone, Debug)]
pub struct FrameClock {
    last_frame: Instant,
    target_fps: u32,
}

impl FrameClock {
    /// Create a clock targeting 120fps
    pub fn new() -> Self {
        Self::with_target_fps(120)
    }

    pub fn with_target_fps(fps: u32) -> Self {
        Self {
            last_frame: Instant::now(),
            target_fps: fps.max(1),
        }
    }

    /// Nominal duration of one frame at the target rate
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps as u64)
    }

    /// Milliseconds since the previous call (or since creation/reset)
    pub fn advance(&mut self) -> f32 {
        let now = Instant::now();
        let dt_ms = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        dt_ms
    }

    /// Time left in the current frame, for hosts that sleep between ticks
    pub fn remaining_in_frame(&self) -> Duration {
        self.frame_duration().saturating_sub(self.last_frame.elapsed())
    }

    /// Restart measurement from now
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(
            FrameClock::with_target_fps(100).frame_duration(),
            Duration::from_millis(10)
        );
        // Zero fps is bumped to one frame per second
        assert_eq!(
            FrameClock::with_target_fps(0).frame_duration(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(2));
        let dt = clock.advance();
        assert!(dt >= 1.9);
        assert!(clock.advance() >= 0.0);
    }
}
