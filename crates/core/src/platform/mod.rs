//! Device and accessibility signals the interaction components gate on.

use serde::{Deserialize, Serialize};

/// Whether the device takes touch input.
///
/// Detected once at startup and upgraded the first time a touch is seen.
/// It never goes back to non-touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchCapability {
    touch: bool,
}

impl TouchCapability {
    pub fn detect(has_touch_events: bool, max_touch_points: u32) -> Self {
        Self {
            touch: has_touch_events || max_touch_points > 0,
        }
    }

    pub fn pointer_only() -> Self {
        Self { touch: false }
    }

    pub fn touch() -> Self {
        Self { touch: true }
    }

    pub fn is_touch(&self) -> bool {
        self.touch
    }

    /// Records a touch event. Returns true if this upgraded the capability.
    pub fn observe_touch(&mut self) -> bool {
        let upgraded = !self.touch;
        self.touch = true;
        upgraded
    }
}

/// Snapshot of the platform preferences read at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSignals {
    pub reduced_motion: bool,
    pub touch: TouchCapability,
}

impl PlatformSignals {
    pub fn new(reduced_motion: bool, touch: TouchCapability) -> Self {
        Self {
            reduced_motion,
            touch,
        }
    }
}
