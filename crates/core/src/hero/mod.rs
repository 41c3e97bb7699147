//! Auto-rotation of the hero presentation variants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{config::HeroConfig, timeline::Timer};

/// Snapshot of the rotation for presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroRotationState {
    pub current_variant_index: usize,
    /// True while anything stops auto-advance: a manual pause, a user
    /// override cooldown or the reduced-motion preference.
    pub is_paused: bool,
    pub is_user_paused: bool,
}

/// Which rule currently governs auto-advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    Auto,
    UserOverride,
    ManuallyPaused,
    MotionReduced,
}

/// Cycles through `variants` presentations on a fixed interval.
///
/// Explicit selection via [`set_variant`](Self::set_variant) holds the
/// rotation for a cooldown. [`pause`](Self::pause) holds it until
/// [`resume`](Self::resume). Reduced motion holds it unconditionally.
#[derive(Debug, Clone)]
pub struct HeroRotation {
    variants: usize,
    interval: Duration,
    cooldown: Duration,
    pause_on_interaction: bool,
    current: usize,
    manually_paused: bool,
    override_until: Option<Duration>,
    reduced_motion: bool,
    timer: Option<Timer>,
}

impl HeroRotation {
    /// `variants` is raised to one if zero.
    pub fn new(variants: usize, config: &HeroConfig, now: Duration) -> Self {
        let mut rotation = Self {
            variants: variants.max(1),
            interval: config.interval(),
            cooldown: config.cooldown(),
            pause_on_interaction: config.pause_on_interaction,
            current: 0,
            manually_paused: false,
            override_until: None,
            reduced_motion: false,
            timer: None,
        };
        rotation.refresh_timer(now);
        rotation
    }

    pub fn with_reduced_motion(mut self, reduced: bool, now: Duration) -> Self {
        self.set_reduced_motion(reduced, now);
        self
    }

    pub fn variants(&self) -> usize {
        self.variants
    }

    pub fn current_variant(&self) -> usize {
        self.current
    }

    pub fn state(&self) -> HeroRotationState {
        HeroRotationState {
            current_variant_index: self.current,
            is_paused: self.mode() != RotationMode::Auto,
            is_user_paused: self.override_until.is_some(),
        }
    }

    pub fn mode(&self) -> RotationMode {
        if self.reduced_motion {
            RotationMode::MotionReduced
        } else if self.manually_paused {
            RotationMode::ManuallyPaused
        } else if self.override_until.is_some() {
            RotationMode::UserOverride
        } else {
            RotationMode::Auto
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool, now: Duration) {
        self.reduced_motion = reduced;
        self.refresh_timer(now);
    }

    /// Jumps to `index` and starts the override cooldown. Out-of-range
    /// indices are ignored; returns whether the selection was applied.
    pub fn set_variant(&mut self, index: usize, now: Duration) -> bool {
        if index >= self.variants {
            tracing::debug!(index, variants = self.variants, "ignoring out-of-range hero variant");
            return false;
        }
        self.current = index;
        if self.pause_on_interaction {
            self.override_until = Some(now + self.cooldown);
        }
        self.refresh_timer(now);
        true
    }

    /// Advances one variant without starting a cooldown.
    pub fn next(&mut self) {
        self.current = (self.current + 1) % self.variants;
    }

    pub fn previous(&mut self) {
        self.current = (self.current + self.variants - 1) % self.variants;
    }

    pub fn pause(&mut self, now: Duration) {
        self.manually_paused = true;
        self.refresh_timer(now);
    }

    /// Lifts a manual pause and any override cooldown.
    pub fn resume(&mut self, now: Duration) {
        self.manually_paused = false;
        self.override_until = None;
        self.refresh_timer(now);
    }

    /// Expires the cooldown and applies due auto-advances. Returns whether
    /// the visible variant changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        if let Some(until) = self.override_until {
            if now >= until {
                self.override_until = None;
                tracing::debug!("hero override cooldown elapsed");
                self.refresh_timer(until);
            }
        }

        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        let fired = timer.poll(now) as usize;
        if fired == 0 {
            return false;
        }

        let before = self.current;
        self.current = (self.current + fired) % self.variants;
        tracing::debug!(variant = self.current, "hero auto-advanced");
        self.current != before
    }

    /// Drops the auto-advance timer and any pending cooldown.
    pub fn shutdown(&mut self) {
        self.timer = None;
        self.override_until = None;
    }

    /// Starts a fresh period when auto-advance becomes active and drops the
    /// timer when it stops. A running timer is left untouched.
    fn refresh_timer(&mut self, now: Duration) {
        if self.mode() == RotationMode::Auto {
            if self.timer.is_none() {
                self.timer = Some(Timer::repeating(now, self.interval));
            }
        } else {
            self.timer = None;
        }
    }
}
