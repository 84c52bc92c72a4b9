//! Staggered reveal animator
//!
//! Drives an ordered set of targets from a start [`VisualState`] to an end
//! state. Target `i` starts `i * stagger_ms` after the run begins and every
//! target in a run shares the same duration and easing.
//!
//! Time only advances through [`StaggerAnimator::tick`], so all scheduled
//! targets are live at once and the host decides what a frame is.
//!
//! # Example
//!
//! ```
//! use lumen_animation::{StaggerAnimator, StaggerConfig, TargetPhase};
//!
//! let mut animator = StaggerAnimator::new(StaggerConfig::default()).unwrap();
//! let letters = animator.register_targets(3);
//!
//! let run = animator.run();
//! assert_eq!(run.completion_time_ms(), 1700.0);
//!
//! animator.tick(1700.0);
//! assert_eq!(animator.phase(letters[2]), Some(TargetPhase::Settled));
//! ```

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::values::{Interpolate, VisualState};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a target registered with a [`StaggerAnimator`]
    pub struct TargetId;
}

/// Identifier of one [`AnimationRun`], unique per animator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Lifecycle of a single target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetPhase {
    /// Never animated
    #[default]
    Idle,
    /// Part of a run, waiting for its stagger delay
    Scheduled,
    /// Delay elapsed, eased interpolation in progress
    Animating,
    /// End state applied
    Settled,
}

impl TargetPhase {
    /// Scheduled or animating
    pub fn is_in_flight(self) -> bool {
        matches!(self, TargetPhase::Scheduled | TargetPhase::Animating)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Timing, easing and endpoints shared by every target in a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    /// Delay between successive target starts (ms)
    pub stagger_ms: f32,
    /// Per-target transition duration (ms)
    pub duration_ms: f32,
    pub easing: Easing,
    /// State applied to idle or settled targets when a run starts
    pub from: VisualState,
    pub to: VisualState,
}

impl StaggerConfig {
    /// Create a config with the given interval and duration, elastic-out easing
    pub fn new(stagger_ms: f32, duration_ms: f32) -> Self {
        Self {
            stagger_ms,
            duration_ms,
            ..Self::default()
        }
    }

    /// Set the easing curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the start and end states
    pub fn states(mut self, from: VisualState, to: VisualState) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Calculate the start delay for a target index
    pub fn delay_for_index(&self, index: usize) -> f32 {
        self.stagger_ms * index as f32
    }

    /// Check timing and easing parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.stagger_ms.is_finite() && self.stagger_ms >= 0.0) {
            return Err(AnimationError::InvalidStaggerConfig(format!(
                "stagger interval must be a non-negative number of ms, got {}",
                self.stagger_ms
            )));
        }
        if !(self.duration_ms.is_finite() && self.duration_ms >= 0.0) {
            return Err(AnimationError::InvalidStaggerConfig(format!(
                "duration must be a non-negative number of ms, got {}",
                self.duration_ms
            )));
        }
        self.easing.validate()
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            stagger_ms: 100.0,
            duration_ms: 1500.0,
            easing: Easing::default(),
            from: VisualState::HIDDEN,
            to: VisualState::SHOWN,
        }
    }
}

// ============================================================================
// Runs
// ============================================================================

/// One execution of the stagger sequence
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRun {
    pub id: RunId,
    /// Animator time when the run started (ms)
    pub started_at_ms: f64,
    pub target_count: usize,
    pub stagger_ms: f32,
    pub duration_ms: f32,
    pub easing: Easing,
}

impl AnimationRun {
    /// Start delay of the target at `index`
    pub fn delay_for_index(&self, index: usize) -> f32 {
        self.stagger_ms * index as f32
    }

    /// Time from run start until the last target settles
    pub fn completion_time_ms(&self) -> f32 {
        match self.target_count {
            0 => 0.0,
            n => self.delay_for_index(n - 1) + self.duration_ms,
        }
    }

    /// Animator time at which the last target settles
    pub fn completes_at_ms(&self) -> f64 {
        self.started_at_ms + self.completion_time_ms() as f64
    }
}

/// A target's pending or in-progress transition
///
/// Time is tracked per transition so progress stays exact however long the
/// animator has been running.
#[derive(Clone, Copy, Debug)]
struct Transition {
    run: RunId,
    /// Time since the target's start; negative while the delay runs
    elapsed_ms: f32,
    duration_ms: f32,
    easing: Easing,
    from: VisualState,
    to: VisualState,
}

struct TargetSlot {
    index: usize,
    phase: TargetPhase,
    state: VisualState,
    transition: Option<Transition>,
}

/// State change reported by [`StaggerAnimator::tick`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetUpdate {
    pub target: TargetId,
    pub index: usize,
    pub state: VisualState,
    pub phase: TargetPhase,
}

/// Updates produced by one tick, in target order
pub type TickUpdates = SmallVec<[TargetUpdate; 16]>;

// ============================================================================
// Animator
// ============================================================================

/// Tick-driven stagger animator owning an ordered list of targets
pub struct StaggerAnimator {
    config: StaggerConfig,
    targets: SlotMap<TargetId, TargetSlot>,
    order: Vec<TargetId>,
    active_runs: Vec<AnimationRun>,
    next_run: u64,
    finished_runs: u64,
    now_ms: f64,
}

impl StaggerAnimator {
    /// Create an animator, rejecting invalid configuration up front
    pub fn new(config: StaggerConfig) -> Result<Self> {
        if let Err(err) = config.validate() {
            tracing::warn!("StaggerAnimator: rejected config: {}", err);
            return Err(err);
        }
        Ok(Self {
            config,
            targets: SlotMap::with_key(),
            order: Vec::new(),
            active_runs: Vec::new(),
            next_run: 0,
            finished_runs: 0,
            now_ms: 0.0,
        })
    }

    pub fn config(&self) -> &StaggerConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent [`run`](Self::run) calls
    pub fn set_config(&mut self, config: StaggerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Register the next target in stagger order
    ///
    /// The target starts idle in the config's `from` state.
    pub fn register_target(&mut self) -> TargetId {
        let index = self.order.len();
        let id = self.targets.insert(TargetSlot {
            index,
            phase: TargetPhase::Idle,
            state: self.config.from,
            transition: None,
        });
        self.order.push(id);
        id
    }

    /// Register `count` targets, returned in stagger order
    pub fn register_targets(&mut self, count: usize) -> Vec<TargetId> {
        (0..count).map(|_| self.register_target()).collect()
    }

    /// Registered targets in stagger order
    pub fn targets(&self) -> &[TargetId] {
        &self.order
    }

    pub fn target_count(&self) -> usize {
        self.order.len()
    }

    /// Current animator time (ms since creation)
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn phase(&self, target: TargetId) -> Option<TargetPhase> {
        self.targets.get(target).map(|slot| slot.phase)
    }

    pub fn state(&self, target: TargetId) -> Option<VisualState> {
        self.targets.get(target).map(|slot| slot.state)
    }

    pub fn index_of(&self, target: TargetId) -> Option<usize> {
        self.targets.get(target).map(|slot| slot.index)
    }

    /// Current states in stagger order
    pub fn states(&self) -> impl Iterator<Item = VisualState> + '_ {
        self.order.iter().map(move |id| self.targets[*id].state)
    }

    /// Runs with at least one target still scheduled or animating
    pub fn active_runs(&self) -> &[AnimationRun] {
        &self.active_runs
    }

    /// Runs that have completed or been fully superseded
    pub fn finished_runs(&self) -> u64 {
        self.finished_runs
    }

    /// Check if any target is scheduled or animating
    pub fn is_animating(&self) -> bool {
        self.targets.values().any(|slot| slot.phase.is_in_flight())
    }

    /// Start a run with the animator's configuration
    pub fn run(&mut self) -> AnimationRun {
        let config = self.config.clone();
        self.start_run(&config)
    }

    /// Start a run with one-off options, validated before anything changes
    pub fn run_with(&mut self, config: &StaggerConfig) -> Result<AnimationRun> {
        config.validate()?;
        Ok(self.start_run(config))
    }

    fn start_run(&mut self, config: &StaggerConfig) -> AnimationRun {
        let run = AnimationRun {
            id: RunId(self.next_run),
            started_at_ms: self.now_ms,
            target_count: self.order.len(),
            stagger_ms: config.stagger_ms,
            duration_ms: config.duration_ms,
            easing: config.easing,
        };
        self.next_run += 1;

        if self.order.is_empty() {
            self.finished_runs += 1;
            tracing::debug!("StaggerAnimator: run {} has no targets", run.id.get());
            return run;
        }

        let mut superseded = 0usize;
        for &id in &self.order {
            let slot = &mut self.targets[id];
            // In-flight targets continue from wherever they are; idle and
            // settled targets snap back to the start state
            let from = if slot.phase.is_in_flight() {
                superseded += 1;
                slot.state
            } else {
                config.from
            };
            slot.state = from;
            slot.phase = TargetPhase::Scheduled;
            slot.transition = Some(Transition {
                run: run.id,
                elapsed_ms: -run.delay_for_index(slot.index),
                duration_ms: config.duration_ms,
                easing: config.easing,
                from,
                to: config.to,
            });
        }

        tracing::debug!(
            "StaggerAnimator: run {} started for {} targets (superseded {}, completes in {}ms)",
            run.id.get(),
            run.target_count,
            superseded,
            run.completion_time_ms()
        );

        self.active_runs.push(run.clone());
        self.retire_runs();
        run
    }

    /// Advance time by `dt_ms` and recompute every in-flight target
    ///
    /// Returns the targets whose state or phase changed, in stagger order.
    pub fn tick(&mut self, dt_ms: f32) -> TickUpdates {
        let mut updates = TickUpdates::new();
        if !(dt_ms.is_finite() && dt_ms >= 0.0) {
            tracing::warn!("StaggerAnimator: ignoring tick of {}ms", dt_ms);
            return updates;
        }
        self.now_ms += dt_ms as f64;

        for &id in &self.order {
            let slot = &mut self.targets[id];
            let Some(transition) = slot.transition.as_mut() else {
                continue;
            };
            transition.elapsed_ms += dt_ms;
            let transition = *transition;

            let elapsed = transition.elapsed_ms;
            let (phase, state) = if elapsed < 0.0 {
                (TargetPhase::Scheduled, slot.state)
            } else if elapsed >= transition.duration_ms {
                slot.transition = None;
                (TargetPhase::Settled, transition.to)
            } else {
                let progress = elapsed / transition.duration_ms;
                let eased = transition.easing.apply(progress);
                (
                    TargetPhase::Animating,
                    transition.from.lerp(&transition.to, eased),
                )
            };

            if phase != slot.phase || state != slot.state {
                slot.phase = phase;
                slot.state = state;
                updates.push(TargetUpdate {
                    target: id,
                    index: slot.index,
                    state,
                    phase,
                });
            }
        }

        tracing::trace!(
            "StaggerAnimator: tick {}ms -> {} updates at {}ms",
            dt_ms,
            updates.len(),
            self.now_ms
        );

        self.retire_runs();
        updates
    }

    /// Drop runs that no longer own any target's transition
    fn retire_runs(&mut self) {
        let targets = &self.targets;
        let before = self.active_runs.len();
        self.active_runs.retain(|run| {
            let live = targets
                .values()
                .any(|slot| slot.transition.is_some_and(|t| t.run == run.id));
            if !live {
                tracing::debug!("StaggerAnimator: run {} finished", run.id.get());
            }
            live
        });
        self.finished_runs += (before - self.active_runs.len()) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_config() -> StaggerConfig {
        StaggerConfig::new(100.0, 1000.0).easing(Easing::Linear)
    }

    #[test]
    fn test_default_config() {
        let config = StaggerConfig::default();
        assert_eq!(config.stagger_ms, 100.0);
        assert_eq!(config.duration_ms, 1500.0);
        assert_eq!(config.easing, Easing::elastic_out(1.0, 0.3));
        assert_eq!(config.from, VisualState::new(0.0, 50.0));
        assert_eq!(config.to, VisualState::new(1.0, 0.0));
    }

    #[test]
    fn test_invalid_config_rejected_at_creation() {
        let err = StaggerAnimator::new(StaggerConfig::new(-1.0, 1500.0)).err();
        assert!(matches!(err, Some(AnimationError::InvalidStaggerConfig(_))));

        let err = StaggerAnimator::new(StaggerConfig::new(100.0, f32::INFINITY)).err();
        assert!(matches!(err, Some(AnimationError::InvalidStaggerConfig(_))));

        let config = StaggerConfig::default().easing(Easing::elastic_out(1.0, 0.0));
        assert!(StaggerAnimator::new(config).is_err());
    }

    #[test]
    fn test_invalid_run_options_leave_targets_untouched() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        let ids = animator.register_targets(2);

        assert!(animator.run_with(&StaggerConfig::new(100.0, -5.0)).is_err());
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Idle));
        assert!(animator.active_runs().is_empty());
    }

    #[test]
    fn test_delay_for_index() {
        let config = StaggerConfig::new(50.0, 300.0);

        assert_eq!(config.delay_for_index(0), 0.0);
        assert_eq!(config.delay_for_index(1), 50.0);
        assert_eq!(config.delay_for_index(4), 200.0);
    }

    #[test]
    fn test_targets_start_in_order() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        let ids = animator.register_targets(3);
        animator.run();

        // All scheduled, nothing moved yet
        assert!(ids
            .iter()
            .all(|id| animator.phase(*id) == Some(TargetPhase::Scheduled)));

        let updates = animator.tick(150.0);
        let indices: Vec<usize> = updates.iter().map(|u| u.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Animating));
        assert_eq!(animator.phase(ids[1]), Some(TargetPhase::Animating));
        assert_eq!(animator.phase(ids[2]), Some(TargetPhase::Scheduled));

        let first = animator.state(ids[0]).unwrap();
        assert!(first.approx_eq(&VisualState::new(0.15, 42.5), 1e-4));
        let second = animator.state(ids[1]).unwrap();
        assert!(second.approx_eq(&VisualState::new(0.05, 47.5), 1e-4));
    }

    #[test]
    fn test_completion_time_closed_form() {
        for (count, stagger, duration) in [(1, 100.0, 1500.0), (9, 100.0, 1500.0), (4, 250.0, 0.0)]
        {
            let config = StaggerConfig::new(stagger, duration);
            let mut animator = StaggerAnimator::new(config).unwrap();
            let ids = animator.register_targets(count);
            let run = animator.run();

            let expected = (count - 1) as f32 * stagger + duration;
            assert_eq!(run.completion_time_ms(), expected);

            if expected > 0.0 {
                animator.tick(expected - 1.0);
                assert_ne!(animator.phase(ids[count - 1]), Some(TargetPhase::Settled));
                animator.tick(1.0);
            } else {
                animator.tick(0.0);
            }

            assert_eq!(animator.phase(ids[count - 1]), Some(TargetPhase::Settled));
            assert_eq!(animator.state(ids[count - 1]), Some(VisualState::SHOWN));
            assert!(!animator.is_animating());
            assert_eq!(animator.finished_runs(), 1);
        }
    }

    #[test]
    fn test_settled_state_is_exact() {
        let mut animator = StaggerAnimator::new(StaggerConfig::default()).unwrap();
        animator.register_targets(9);
        animator.run();
        animator.tick(5000.0);

        assert!(animator.states().all(|s| s == VisualState::SHOWN));
    }

    #[test]
    fn test_empty_run_completes_immediately() {
        let mut animator = StaggerAnimator::new(StaggerConfig::default()).unwrap();
        let run = animator.run();

        assert_eq!(run.target_count, 0);
        assert_eq!(run.completion_time_ms(), 0.0);
        assert!(animator.active_runs().is_empty());
        assert_eq!(animator.finished_runs(), 1);
        assert!(animator.tick(16.0).is_empty());
    }

    #[test]
    fn test_rerun_supersedes_in_flight_targets() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        let ids = animator.register_targets(2);

        let first = animator.run();
        animator.tick(500.0);
        let midway = animator.state(ids[0]).unwrap();
        assert!(midway.approx_eq(&VisualState::new(0.5, 25.0), 1e-4));

        let second = animator.run();
        assert_ne!(first.id, second.id);

        // Restarts from the current value, back in the scheduled phase
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Scheduled));
        assert_eq!(animator.state(ids[0]), Some(midway));

        // The first run's schedule is gone: at its old completion time the
        // second target is still moving
        animator.tick(600.0);
        assert_eq!(animator.phase(ids[1]), Some(TargetPhase::Animating));
        assert_eq!(animator.active_runs().len(), 1);
        assert_eq!(animator.active_runs()[0].id, second.id);
        assert_eq!(animator.finished_runs(), 1);

        animator.tick(500.0);
        assert!(!animator.is_animating());
        assert_eq!(animator.finished_runs(), 2);
    }

    #[test]
    fn test_rerun_after_settle_replays_from_start() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        let ids = animator.register_targets(1);

        animator.run();
        animator.tick(1000.0);
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Settled));

        animator.run();
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Scheduled));
        assert_eq!(animator.state(ids[0]), Some(VisualState::HIDDEN));
    }

    #[test]
    fn test_phase_transitions_reported_once() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        animator.register_targets(1);
        animator.run();

        let updates = animator.tick(1000.0);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].phase, TargetPhase::Settled);

        assert!(animator.tick(100.0).is_empty());
    }

    #[test]
    fn test_invalid_tick_is_ignored() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        animator.register_targets(1);
        animator.run();

        assert!(animator.tick(-10.0).is_empty());
        assert!(animator.tick(f32::NAN).is_empty());
        assert_eq!(animator.now_ms(), 0.0);
    }

    #[test]
    fn test_runs_complete_after_long_uptime() {
        let mut animator = StaggerAnimator::new(linear_config()).unwrap();
        let ids = animator.register_targets(2);

        // Roughly 75 hours of idle frames
        animator.tick(270_000_000.0);
        let run = animator.run();
        assert_eq!(run.started_at_ms, 270_000_000.0);

        for _ in 0..40 {
            animator.tick(16.0);
        }
        assert_eq!(animator.now_ms(), 270_000_640.0);
        assert_eq!(animator.phase(ids[0]), Some(TargetPhase::Animating));
        let state = animator.state(ids[0]).unwrap();
        assert!(state.approx_eq(&VisualState::new(0.64, 18.0), 1e-4));

        // 69 frames cover the 1100ms completion time
        for _ in 0..29 {
            animator.tick(16.0);
        }
        assert!(ids
            .iter()
            .all(|id| animator.phase(*id) == Some(TargetPhase::Settled)));
        assert!(animator.now_ms() >= run.completes_at_ms());
    }

    #[test]
    fn test_config_from_toml() {
        let config: StaggerConfig = toml::from_str(
            r#"
            stagger_ms = 50.0
            easing = "elastic.out(1.5, 0.4)"
            "#,
        )
        .unwrap();

        assert_eq!(config.stagger_ms, 50.0);
        assert_eq!(config.duration_ms, 1500.0);
        assert_eq!(config.easing, Easing::elastic_out(1.5, 0.4));
        assert_eq!(config.from, VisualState::HIDDEN);
    }
}
