//! Viewport visibility tracking
//!
//! Tracks how much of each observed region lies inside the viewport and
//! signals [`BecameVisible`] each time a region's visible ratio crosses its
//! threshold upward. Crossing back below re-arms the region, so scrolling
//! away and back fires again unless the region was observed with
//! `fire_once`.
//!
//! Everything is synchronous: geometry changes are pushed in by the host and
//! signals are returned to the caller and delivered to subscribers before
//! the call returns.
//!
//! # Example
//!
//! ```
//! use lumen_core::Rect;
//! use lumen_layout::{ObserveOptions, VisibilityTrigger};
//!
//! let trigger = VisibilityTrigger::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let section = trigger
//!     .observe(Rect::new(0.0, 1000.0, 800.0, 600.0), ObserveOptions::default())
//!     .unwrap();
//!
//! // Scroll so the section is 60% on screen
//! let signals = trigger.set_viewport(Rect::new(0.0, 760.0, 800.0, 600.0));
//! assert_eq!(signals.len(), 1);
//! assert_eq!(signals[0].region, section);
//! ```

use crate::error::VisibilityError;
use lumen_core::Rect;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Handle to an observed region
    pub struct RegionId;
    /// Handle to a signal subscriber
    pub struct SubscriberId;
}

/// Per-region observation options
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveOptions {
    /// Visible-area ratio at or above which the region counts as visible
    ///
    /// `0.0` means any contact with the viewport.
    pub threshold: f32,
    /// Signal only the first crossing
    pub fire_once: bool,
}

impl ObserveOptions {
    pub fn threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn fire_once(mut self, fire_once: bool) -> Self {
        self.fire_once = fire_once;
        self
    }

    pub fn validate(&self) -> Result<(), VisibilityError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(VisibilityError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            fire_once: false,
        }
    }
}

/// Signal emitted when a region crosses its threshold upward
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BecameVisible {
    pub region: RegionId,
    /// Visible ratio at the moment of crossing
    pub ratio: f32,
}

/// Signals produced by one geometry update, in region registration order
pub type Signals = SmallVec<[BecameVisible; 2]>;

/// Visible-area ratio of `region` within `viewport`, and whether they touch
///
/// A zero-area region counts as fully visible while it touches the viewport.
/// A region inside the viewport reports exactly `1.0`, independent of how
/// the overlap area rounds.
pub fn visible_ratio(region: &Rect, viewport: &Rect) -> (f32, bool) {
    let touching = region.touches(viewport);
    let area = region.area();
    if area <= 0.0 {
        return (if touching { 1.0 } else { 0.0 }, touching);
    }
    if viewport.contains_rect(region) {
        return (1.0, true);
    }
    let visible = region
        .intersection(viewport)
        .map(|overlap| overlap.area())
        .unwrap_or(0.0);
    ((visible / area).clamp(0.0, 1.0), touching)
}

/// Where a region's ratio comes from
#[derive(Clone, Copy, Debug)]
enum RatioSource {
    /// Computed from bounds against the viewport
    Geometry(Rect),
    /// Pushed by the host's own observation primitive
    Reported,
}

struct ObservedRegion {
    source: RatioSource,
    options: ObserveOptions,
    ratio: f32,
    past_threshold: bool,
    fired: bool,
}

impl ObservedRegion {
    /// Record a new measurement, returning a signal on an upward crossing
    fn update(&mut self, id: RegionId, ratio: f32, touching: bool) -> Option<BecameVisible> {
        let past = if self.options.threshold <= 0.0 {
            touching
        } else {
            ratio >= self.options.threshold
        };
        let crossed = past && !self.past_threshold;
        self.ratio = ratio;
        self.past_threshold = past;

        if !crossed || (self.options.fire_once && self.fired) {
            return None;
        }
        self.fired = true;
        Some(BecameVisible { region: id, ratio })
    }
}

type Subscriber = Rc<dyn Fn(&BecameVisible)>;

struct TriggerInner {
    viewport: Rect,
    regions: SlotMap<RegionId, ObservedRegion>,
    subscribers: SlotMap<SubscriberId, Subscriber>,
}

impl TriggerInner {
    fn remove(&mut self, region: RegionId) -> bool {
        let removed = self.regions.remove(region).is_some();
        if removed {
            tracing::debug!("VisibilityTrigger: unobserved {:?}", region);
        }
        removed
    }

    fn evaluate(&mut self, id: RegionId) -> Option<BecameVisible> {
        let viewport = self.viewport;
        let region = self.regions.get_mut(id)?;
        let RatioSource::Geometry(bounds) = region.source else {
            return None;
        };
        let (ratio, touching) = visible_ratio(&bounds, &viewport);
        region.update(id, ratio, touching)
    }
}

/// Tracks region visibility against a single viewport
///
/// Cloning shares the same underlying observer.
#[derive(Clone)]
pub struct VisibilityTrigger {
    inner: Rc<RefCell<TriggerInner>>,
}

impl VisibilityTrigger {
    pub fn new(viewport: Rect) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TriggerInner {
                viewport,
                regions: SlotMap::with_key(),
                subscribers: SlotMap::with_key(),
            })),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    /// Start observing `bounds`
    ///
    /// The region is measured immediately; if it is already past its
    /// threshold, subscribers receive a signal before this returns.
    pub fn observe(
        &self,
        bounds: Rect,
        options: ObserveOptions,
    ) -> Result<RegionId, VisibilityError> {
        self.observe_with_signals(bounds, options).map(|(id, _)| id)
    }

    /// Like [`observe`](Self::observe), also returning the initial signal
    pub fn observe_with_signals(
        &self,
        bounds: Rect,
        options: ObserveOptions,
    ) -> Result<(RegionId, Signals), VisibilityError> {
        if let Err(err) = options.validate() {
            tracing::warn!("VisibilityTrigger: rejected region: {}", err);
            return Err(err);
        }

        let (id, signals) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.regions.insert(ObservedRegion {
                source: RatioSource::Geometry(bounds),
                options,
                ratio: 0.0,
                past_threshold: false,
                fired: false,
            });
            tracing::debug!(
                "VisibilityTrigger: observing {:?} (threshold {}, fire_once {})",
                id,
                options.threshold,
                options.fire_once
            );
            let signals: Signals = inner.evaluate(id).into_iter().collect();
            (id, signals)
        };

        self.dispatch(&signals);
        Ok((id, signals))
    }

    /// Observe `bounds` until the returned guard is dropped
    pub fn observe_scoped(
        &self,
        bounds: Rect,
        options: ObserveOptions,
    ) -> Result<ObservationGuard, VisibilityError> {
        self.observe_scoped_with_signals(bounds, options)
            .map(|(guard, _)| guard)
    }

    /// Like [`observe_scoped`](Self::observe_scoped), also returning the
    /// initial signal
    pub fn observe_scoped_with_signals(
        &self,
        bounds: Rect,
        options: ObserveOptions,
    ) -> Result<(ObservationGuard, Signals), VisibilityError> {
        let (region, signals) = self.observe_with_signals(bounds, options)?;
        let guard = ObservationGuard {
            region,
            inner: Rc::downgrade(&self.inner),
        };
        Ok((guard, signals))
    }

    /// Stop observing a region
    ///
    /// Safe to call any number of times, including for regions that were
    /// never observed. Returns whether the region was being observed.
    pub fn unobserve(&self, region: RegionId) -> bool {
        self.inner.borrow_mut().remove(region)
    }

    /// Stop observing every region
    pub fn disconnect(&self) {
        let mut inner = self.inner.borrow_mut();
        tracing::debug!(
            "VisibilityTrigger: disconnecting {} regions",
            inner.regions.len()
        );
        inner.regions.clear();
    }

    pub fn is_observed(&self, region: RegionId) -> bool {
        self.inner.borrow().regions.contains_key(region)
    }

    pub fn region_count(&self) -> usize {
        self.inner.borrow().regions.len()
    }

    /// Last measured ratio of a region
    pub fn ratio(&self, region: RegionId) -> Option<f32> {
        self.inner.borrow().regions.get(region).map(|r| r.ratio)
    }

    /// Move or resize the viewport (scroll, window resize)
    pub fn set_viewport(&self, viewport: Rect) -> Signals {
        let signals = {
            let mut inner = self.inner.borrow_mut();
            inner.viewport = viewport;
            let ids: Vec<RegionId> = inner.regions.keys().collect();
            ids.into_iter()
                .filter_map(|id| inner.evaluate(id))
                .collect::<Signals>()
        };
        self.dispatch(&signals);
        signals
    }

    /// Move or resize an observed region (layout change)
    pub fn set_region_bounds(&self, region: RegionId, bounds: Rect) -> Signals {
        let signals: Signals = {
            let mut inner = self.inner.borrow_mut();
            match inner.regions.get_mut(region) {
                Some(observed) => observed.source = RatioSource::Geometry(bounds),
                None => return Signals::new(),
            }
            inner.evaluate(region).into_iter().collect()
        };
        self.dispatch(&signals);
        signals
    }

    /// Push a ratio measured by the host instead of computing it from bounds
    ///
    /// The region stops following viewport changes until new bounds are set.
    /// Non-finite ratios are ignored; others are clamped to `[0, 1]`.
    pub fn update_ratio(&self, region: RegionId, ratio: f32) -> Signals {
        if !ratio.is_finite() {
            tracing::warn!("VisibilityTrigger: ignoring ratio {} for {:?}", ratio, region);
            return Signals::new();
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let signals: Signals = {
            let mut inner = self.inner.borrow_mut();
            let Some(observed) = inner.regions.get_mut(region) else {
                return Signals::new();
            };
            observed.source = RatioSource::Reported;
            observed.update(region, ratio, ratio > 0.0).into_iter().collect()
        };
        self.dispatch(&signals);
        signals
    }

    /// Receive every signal this trigger emits
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&BecameVisible) + 'static,
    {
        self.inner.borrow_mut().subscribers.insert(Rc::new(callback))
    }

    pub fn unsubscribe(&self, subscriber: SubscriberId) {
        self.inner.borrow_mut().subscribers.remove(subscriber);
    }

    /// Deliver signals with no borrow held, so callbacks may call back in
    fn dispatch(&self, signals: &[BecameVisible]) {
        if signals.is_empty() {
            return;
        }
        for signal in signals {
            tracing::debug!(
                "VisibilityTrigger: {:?} became visible at ratio {:.3}",
                signal.region,
                signal.ratio
            );
        }
        let subscribers: Vec<Subscriber> =
            self.inner.borrow().subscribers.values().cloned().collect();
        for signal in signals {
            for callback in &subscribers {
                callback(signal);
            }
        }
    }
}

impl std::fmt::Debug for VisibilityTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("VisibilityTrigger")
            .field("viewport", &inner.viewport)
            .field("regions", &inner.regions.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Keeps a region observed for as long as it lives
///
/// Dropping the guard unobserves the region on every exit path. The guard
/// does not keep the trigger alive.
#[derive(Debug)]
pub struct ObservationGuard {
    region: RegionId,
    inner: Weak<RefCell<TriggerInner>>,
}

impl ObservationGuard {
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Unobserve now
    pub fn release(self) {}
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().remove(self.region);
        }
    }
}
