//! Scroll-triggered letter reveal
//!
//! A [`RevealSection`] composes the pieces behind an animated heading:
//! the section's container is observed by a [`VisibilityTrigger`], its text
//! is split into one animation target per character, and each time the
//! container becomes visible the letters are revealed with a staggered
//! [`StaggerAnimator`] run. Selected text inside the section uses the
//! inverted theme colors from [`SelectionColors`].
//!
//! # Example
//!
//! ```
//! use lumen_core::Rect;
//! use lumen_layout::{RevealConfig, RevealSection, VisibilityTrigger};
//!
//! let trigger = VisibilityTrigger::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let mut section = RevealSection::mount(
//!     &trigger,
//!     "Hi!",
//!     Rect::new(0.0, 900.0, 800.0, 400.0),
//!     RevealConfig::default(),
//! )
//! .unwrap();
//!
//! let run = section.scroll_to(Rect::new(0.0, 600.0, 800.0, 600.0)).unwrap();
//! assert_eq!(run.target_count, 3);
//!
//! section.tick(run.completion_time_ms());
//! assert!(section.letters().all(|letter| letter.state.opacity == 1.0));
//! ```

use crate::error::Result;
use crate::visibility::{
    ObservationGuard, ObserveOptions, RegionId, SubscriberId, VisibilityTrigger,
};
use lumen_animation::{
    AnimationRun, StaggerAnimator, StaggerConfig, TargetId, TargetPhase, TickUpdates, VisualState,
};
use lumen_core::Rect;
use lumen_theme::{SelectionColors, SelectionConfig, ThemeColors};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Everything a reveal section can be tuned with
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub visibility: ObserveOptions,
    pub stagger: StaggerConfig,
    pub selection: SelectionConfig,
}

impl RevealConfig {
    pub fn validate(&self) -> Result<()> {
        self.visibility.validate()?;
        self.stagger.validate()?;
        self.selection.validate()?;
        Ok(())
    }
}

/// A character of the section text with its current visual state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letter {
    pub ch: char,
    pub target: TargetId,
    pub state: VisualState,
    pub phase: TargetPhase,
}

/// Crossings of this section's region not yet turned into runs
type PendingSignals = Rc<Cell<usize>>;

/// Live subscription to the trigger, dropped on unmount
struct Mounted {
    guard: ObservationGuard,
    subscriber: SubscriberId,
}

/// A block of text revealed letter by letter when scrolled into view
pub struct RevealSection {
    trigger: VisibilityTrigger,
    region: RegionId,
    letters: Vec<(char, TargetId)>,
    animator: StaggerAnimator,
    config: RevealConfig,
    pending: PendingSignals,
    mounted: Option<Mounted>,
    runs_started: u64,
}

impl RevealSection {
    /// Register `text` for animation and start observing `bounds`
    ///
    /// Every character, including spaces, becomes one target in reading
    /// order. If the section is already visible the first run starts on the
    /// next call that polls the trigger.
    pub fn mount(
        trigger: &VisibilityTrigger,
        text: &str,
        bounds: Rect,
        config: RevealConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut animator = StaggerAnimator::new(config.stagger.clone())?;
        let letters: Vec<(char, TargetId)> = text
            .chars()
            .map(|ch| (ch, animator.register_target()))
            .collect();

        let (guard, initial) = trigger.observe_scoped_with_signals(bounds, config.visibility)?;
        let region = guard.region();
        let pending = PendingSignals::new(Cell::new(initial.len()));
        let subscriber = {
            let pending = pending.clone();
            trigger.subscribe(move |signal| {
                if signal.region == region {
                    pending.set(pending.get() + 1);
                }
            })
        };

        tracing::debug!(
            "RevealSection: mounted {:?} with {} letters",
            guard.region(),
            letters.len()
        );

        Ok(Self {
            trigger: trigger.clone(),
            region,
            letters,
            animator,
            config,
            pending,
            mounted: Some(Mounted { guard, subscriber }),
            runs_started: 0,
        })
    }

    /// Start a run for every visibility signal received since the last poll
    ///
    /// Returns the most recent run started, if any.
    pub fn poll(&mut self) -> Option<AnimationRun> {
        let signals = self.pending.replace(0);
        if self.mounted.is_none() {
            return None;
        }

        let mut latest = None;
        for _ in 0..signals {
            let run = self.animator.run();
            self.runs_started += 1;
            tracing::debug!(
                "RevealSection: {:?} visible, run {} started",
                self.region,
                run.id.get()
            );
            latest = Some(run);
        }
        latest
    }

    /// Move the viewport and react to the resulting signals
    pub fn scroll_to(&mut self, viewport: Rect) -> Option<AnimationRun> {
        self.trigger.set_viewport(viewport);
        self.poll()
    }

    /// Move or resize the section container
    pub fn set_bounds(&mut self, bounds: Rect) -> Option<AnimationRun> {
        if self.mounted.is_some() {
            self.trigger.set_region_bounds(self.region, bounds);
        }
        self.poll()
    }

    /// Feed a visible ratio measured by the host
    pub fn report_ratio(&mut self, ratio: f32) -> Option<AnimationRun> {
        if self.mounted.is_some() {
            self.trigger.update_ratio(self.region, ratio);
        }
        self.poll()
    }

    /// Advance the letter animations by `dt_ms`
    ///
    /// Pending signals are handled first, so signals caused by other users
    /// of a shared trigger still start runs.
    pub fn tick(&mut self, dt_ms: f32) -> TickUpdates {
        self.poll();
        self.animator.tick(dt_ms)
    }

    /// Letters in reading order with their current state
    pub fn letters(&self) -> impl Iterator<Item = Letter> + '_ {
        self.letters.iter().map(move |&(ch, target)| Letter {
            ch,
            target,
            state: self.animator.state(target).unwrap_or(self.config.stagger.from),
            phase: self.animator.phase(target).unwrap_or_default(),
        })
    }

    pub fn text(&self) -> String {
        self.letters.iter().map(|(ch, _)| ch).collect()
    }

    /// Selection highlight for the current theme pair
    pub fn selection_colors(&self, theme: &ThemeColors) -> Result<SelectionColors> {
        Ok(SelectionColors::derive(theme, &self.config.selection)?)
    }

    /// Stop observing; runs already in flight keep animating under `tick`
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            self.trigger.unsubscribe(mounted.subscriber);
            drop(mounted.guard);
            self.pending.set(0);
            tracing::debug!("RevealSection: unmounted {:?}", self.region);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn animator(&self) -> &StaggerAnimator {
        &self.animator
    }

    /// Runs started by visibility signals since mount
    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }
}

impl Drop for RevealSection {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for RevealSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealSection")
            .field("region", &self.region)
            .field("text", &self.text())
            .field("mounted", &self.is_mounted())
            .field("runs_started", &self.runs_started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RevealError, VisibilityError};
    use lumen_animation::{AnimationError, Easing};

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);
    const BELOW_FOLD: Rect = Rect::new(0.0, 1000.0, 800.0, 400.0);

    fn mount(text: &str) -> (VisibilityTrigger, RevealSection) {
        let trigger = VisibilityTrigger::new(VIEWPORT);
        let section =
            RevealSection::mount(&trigger, text, BELOW_FOLD, RevealConfig::default()).unwrap();
        (trigger, section)
    }

    #[test]
    fn test_one_target_per_character() {
        let (_trigger, section) = mount("About me.");
        let letters: Vec<Letter> = section.letters().collect();

        assert_eq!(letters.len(), 9);
        assert_eq!(letters[5].ch, ' ');
        assert_eq!(section.text(), "About me.");
        assert!(letters
            .iter()
            .all(|l| l.state == VisualState::HIDDEN && l.phase == TargetPhase::Idle));
    }

    #[test]
    fn test_scroll_into_view_reveals_letters() {
        let (_trigger, mut section) = mount("Hey");

        assert!(section.scroll_to(VIEWPORT.offset(0.0, 100.0)).is_none());
        let run = section.scroll_to(VIEWPORT.offset(0.0, 700.0)).unwrap();
        assert_eq!(run.target_count, 3);
        assert_eq!(run.completion_time_ms(), 1700.0);

        section.tick(100.0);
        let phases: Vec<TargetPhase> = section.letters().map(|l| l.phase).collect();
        assert_eq!(
            phases,
            [TargetPhase::Animating, TargetPhase::Animating, TargetPhase::Scheduled]
        );

        section.tick(1600.0);
        assert!(section
            .letters()
            .all(|l| l.state == VisualState::SHOWN && l.phase == TargetPhase::Settled));
        assert!(!section.is_animating());
    }

    #[test]
    fn test_initially_visible_section_runs_on_first_poll() {
        let trigger = VisibilityTrigger::new(VIEWPORT);
        let mut section = RevealSection::mount(
            &trigger,
            "Hi",
            Rect::new(0.0, 100.0, 800.0, 200.0),
            RevealConfig::default(),
        )
        .unwrap();

        assert!(section.poll().is_some());
        assert_eq!(section.runs_started(), 1);
    }

    #[test]
    fn test_repeat_visibility_reruns() {
        let (_trigger, mut section) = mount("Hi");

        for ratio in [0.3, 0.6, 0.2, 0.55] {
            section.report_ratio(ratio);
        }
        assert_eq!(section.runs_started(), 2);
    }

    #[test]
    fn test_fire_once_config() {
        let trigger = VisibilityTrigger::new(VIEWPORT);
        let config = RevealConfig {
            visibility: ObserveOptions::default().fire_once(true),
            ..RevealConfig::default()
        };
        let mut section = RevealSection::mount(&trigger, "Hi", BELOW_FOLD, config).unwrap();

        for ratio in [0.6, 0.2, 0.9] {
            section.report_ratio(ratio);
        }
        assert_eq!(section.runs_started(), 1);
    }

    #[test]
    fn test_shared_trigger_signals() {
        let trigger = VisibilityTrigger::new(VIEWPORT);
        let mut first =
            RevealSection::mount(&trigger, "One", BELOW_FOLD, RevealConfig::default()).unwrap();
        let mut second = RevealSection::mount(
            &trigger,
            "Two",
            BELOW_FOLD.offset(0.0, 2000.0),
            RevealConfig::default(),
        )
        .unwrap();

        // Scrolled by someone else
        trigger.set_viewport(VIEWPORT.offset(0.0, 900.0));
        assert_eq!(first.pending.get(), 1);
        assert_eq!(second.pending.get(), 0);

        first.tick(16.0);
        second.tick(16.0);
        assert_eq!(first.runs_started(), 1);
        assert_eq!(second.runs_started(), 0);
    }

    #[test]
    fn test_unmount_keeps_in_flight_run() {
        let (trigger, mut section) = mount("Bye");
        section.report_ratio(1.0).unwrap();
        section.tick(50.0);

        section.unmount();
        section.unmount();
        assert!(!section.is_mounted());
        assert!(!trigger.is_observed(section.region()));
        assert_eq!(trigger.region_count(), 0);

        // No more runs once unmounted, but the current one finishes
        assert!(section.report_ratio(0.0).is_none());
        assert!(section.report_ratio(1.0).is_none());
        section.tick(2000.0);
        assert!(section.letters().all(|l| l.phase == TargetPhase::Settled));
    }

    #[test]
    fn test_drop_unobserves() {
        let (trigger, section) = mount("Gone");
        let region = section.region();
        drop(section);
        assert!(!trigger.is_observed(region));
    }

    #[test]
    fn test_invalid_config() {
        let trigger = VisibilityTrigger::new(VIEWPORT);

        let config = RevealConfig {
            visibility: ObserveOptions::threshold(1.5),
            ..RevealConfig::default()
        };
        assert_eq!(
            RevealSection::mount(&trigger, "x", BELOW_FOLD, config).unwrap_err(),
            RevealError::Visibility(VisibilityError::InvalidThreshold(1.5))
        );

        let config = RevealConfig {
            stagger: StaggerConfig::default().easing(Easing::elastic_out(0.0, 0.3)),
            ..RevealConfig::default()
        };
        assert!(matches!(
            RevealSection::mount(&trigger, "x", BELOW_FOLD, config),
            Err(RevealError::Animation(AnimationError::InvalidStaggerConfig(_)))
        ));
        assert_eq!(trigger.region_count(), 0);
    }

    #[test]
    fn test_selection_colors() {
        let (_trigger, section) = mount("Hi");
        let colors = section
            .selection_colors(&ThemeColors::new("#ffffff", "black"))
            .unwrap();
        assert_eq!(colors.background.to_string(), "rgba(255, 255, 255, 0.7)");
        assert_eq!(colors.foreground.to_string(), "rgba(0, 0, 0, 1)");

        assert!(matches!(
            section.selection_colors(&ThemeColors::new("nope", "black")),
            Err(RevealError::Color(_))
        ));
    }

    #[test]
    fn test_config_from_toml() {
        let config: RevealConfig = toml::from_str(
            r#"
            [visibility]
            threshold = 0.25

            [stagger]
            stagger_ms = 50.0
            easing = "ease-out"
            "#,
        )
        .unwrap();

        assert_eq!(config.visibility.threshold, 0.25);
        assert!(!config.visibility.fire_once);
        assert_eq!(config.stagger.stagger_ms, 50.0);
        assert_eq!(config.stagger.duration_ms, 1500.0);
        assert_eq!(config.stagger.easing, Easing::EaseOut);
        assert_eq!(config.selection, SelectionConfig::default());
    }
}
