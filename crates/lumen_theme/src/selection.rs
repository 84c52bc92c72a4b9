//! Inverted text-selection colors
//!
//! A section painted in the theme's primary color on its background color
//! highlights selected text inversely: the primary color (translucent)
//! becomes the highlight and the background color becomes the text.
//!
//! Theme colors are passed in explicitly. [`SharedTheme`] is the thread-safe
//! holder a theme provider publishes into; it swaps the whole
//! `(primary, background)` pair at once so readers never see a half-updated
//! theme.

use crate::error::{ColorError, Result};
use crate::rgba::{to_rgba, ColorSpec, Rgba};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// The live theme color pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    /// Foreground/accent color of the section
    pub primary: ColorSpec,
    /// Section background color
    pub background: ColorSpec,
}

impl ThemeColors {
    pub fn new(primary: impl Into<ColorSpec>, background: impl Into<ColorSpec>) -> Self {
        Self {
            primary: primary.into(),
            background: background.into(),
        }
    }
}

/// Opacities applied to the derived selection colors
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Opacity of the primary color used as the highlight background
    pub highlight_opacity: f32,
    /// Opacity of the background color used as the selected text color
    pub text_opacity: f32,
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<()> {
        for opacity in [self.highlight_opacity, self.text_opacity] {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ColorError::OpacityOutOfRange(opacity));
            }
        }
        Ok(())
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            highlight_opacity: 0.7,
            text_opacity: 1.0,
        }
    }
}

/// Highlight pair consumed by the styling layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionColors {
    /// Highlight behind selected text
    pub background: Rgba,
    /// Selected text color
    pub foreground: Rgba,
}

impl SelectionColors {
    /// Derive the inverted pair from the theme colors
    pub fn derive(theme: &ThemeColors, config: &SelectionConfig) -> Result<Self> {
        Ok(Self {
            background: to_rgba(theme.primary.clone(), config.highlight_opacity)?,
            foreground: to_rgba(theme.background.clone(), config.text_opacity)?,
        })
    }

    /// `::selection` rule for the given class selector
    pub fn css_rule(&self, selector: &str) -> String {
        format!(
            "{selector}::selection {{\n  background: {} !important;\n  color: {} !important;\n}}\n",
            self.background, self.foreground
        )
    }
}

new_key_type! {
    /// Handle returned by [`SharedTheme::subscribe`]
    pub struct ThemeSubscription;
}

type ThemeSubscriber = Arc<dyn Fn(&ThemeColors) + Send + Sync>;

/// The pair plus a counter bumped on every change
#[derive(Debug)]
struct Published {
    colors: ThemeColors,
    version: u64,
}

/// Notification bookkeeping, guarded by one mutex
#[derive(Debug, Default)]
struct Delivery {
    /// Newest version handed to subscribers
    delivered: u64,
    /// A thread is currently running callbacks
    busy: bool,
}

/// Atomically published theme colors with change notification
///
/// Notifications are delivered in publish order, one pair at a time, and
/// no lock is held while callbacks run. If pairs are published faster than
/// they are delivered, intermediate pairs are skipped; the last
/// notification always carries the pair [`get`](Self::get) returns.
/// Delivery of a pair may happen on whichever publishing thread is already
/// notifying.
///
/// Cloning shares the same underlying theme.
#[derive(Clone)]
pub struct SharedTheme {
    current: Arc<RwLock<Published>>,
    subscribers: Arc<RwLock<SlotMap<ThemeSubscription, ThemeSubscriber>>>,
    delivery: Arc<Mutex<Delivery>>,
}

impl SharedTheme {
    pub fn new(colors: ThemeColors) -> Self {
        Self {
            current: Arc::new(RwLock::new(Published { colors, version: 0 })),
            subscribers: Arc::new(RwLock::new(SlotMap::with_key())),
            delivery: Arc::new(Mutex::new(Delivery::default())),
        }
    }

    /// Snapshot of the current pair
    pub fn get(&self) -> ThemeColors {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .colors
            .clone()
    }

    /// Replace both colors in one step, then notify subscribers
    pub fn publish(&self, colors: ThemeColors) {
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if current.colors == colors {
                return;
            }
            current.colors = colors.clone();
            current.version += 1;
        }
        tracing::debug!(
            "SharedTheme: published primary={} background={}",
            colors.primary,
            colors.background
        );
        self.deliver();
    }

    /// Notify subscribers until the newest pair has been delivered
    fn deliver(&self) {
        {
            let mut delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
            if delivery.busy {
                // The running delivery loop picks up the new pair
                return;
            }
            delivery.busy = true;
        }

        loop {
            let (colors, version) = {
                let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
                (current.colors.clone(), current.version)
            };
            {
                let mut delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
                if version <= delivery.delivered {
                    delivery.busy = false;
                    return;
                }
                delivery.delivered = version;
            }

            let subscribers: Vec<ThemeSubscriber> = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .cloned()
                .collect();
            for callback in &subscribers {
                callback(&colors);
            }
        }
    }

    /// Call `callback` with every newly published pair
    pub fn subscribe<F>(&self, callback: F) -> ThemeSubscription
    where
        F: Fn(&ThemeColors) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Arc::new(callback))
    }

    /// Stop notifying a subscriber; returns whether it was subscribed
    pub fn unsubscribe(&self, subscription: ThemeSubscription) -> bool {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subscription)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Derive selection colors from one consistent snapshot
    pub fn selection(&self, config: &SelectionConfig) -> Result<SelectionColors> {
        SelectionColors::derive(&self.get(), config)
    }
}

impl std::fmt::Debug for SharedTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTheme")
            .field("colors", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}
