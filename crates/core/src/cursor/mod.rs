//! Shared cursor position and hover classification.
//!
//! Pointer samples are coalesced to at most one publish per frame. Visual
//! consumers read the published [`CursorState`] through a [`CursorHandle`]
//! and smooth it with their own [`Follower`].

mod spring;

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::{Deserialize, Serialize};

pub use spring::{Follower, MagneticField, Spring, SpringConfig};

use crate::{
    config::CursorConfig,
    platform::TouchCapability,
    timeline::frame_boundary,
    Result, ShowcaseError,
};

/// What the pointer is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorType {
    #[default]
    Default,
    Hover,
    Button,
    Link,
    Text,
    Hidden,
}

impl CursorType {
    pub const ALL: [CursorType; 6] = [
        CursorType::Default,
        CursorType::Hover,
        CursorType::Button,
        CursorType::Link,
        CursorType::Text,
        CursorType::Hidden,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CursorType::Default => "default",
            CursorType::Hover => "hover",
            CursorType::Button => "button",
            CursorType::Link => "link",
            CursorType::Text => "text",
            CursorType::Hidden => "hidden",
        }
    }

    /// Visual treatment for this type.
    pub fn preset(self) -> CursorPreset {
        match self {
            CursorType::Button => CursorPreset {
                dot_size: 6.0,
                ring_size: 28.0,
                ring_opacity: 0.4,
                dot_color: "rgba(167, 139, 250, 1)",
                ring_color: "rgba(167, 139, 250, 0.3)",
                scale: 1.2,
            },
            CursorType::Link => CursorPreset {
                dot_size: 4.0,
                ring_size: 24.0,
                ring_opacity: 0.35,
                dot_color: "rgba(103, 232, 249, 1)",
                ring_color: "rgba(103, 232, 249, 0.25)",
                scale: 1.1,
            },
            CursorType::Hover => CursorPreset {
                dot_size: 5.0,
                ring_size: 20.0,
                ring_opacity: 0.3,
                dot_color: "rgba(167, 139, 250, 0.9)",
                ring_color: "rgba(167, 139, 250, 0.2)",
                scale: 1.0,
            },
            CursorType::Hidden => CursorPreset {
                dot_size: 0.0,
                ring_size: 0.0,
                ring_opacity: 0.0,
                dot_color: "transparent",
                ring_color: "transparent",
                scale: 0.0,
            },
            CursorType::Default | CursorType::Text => CursorPreset {
                dot_size: 4.0,
                ring_size: 0.0,
                ring_opacity: 0.0,
                dot_color: "rgba(103, 232, 249, 1)",
                ring_color: "transparent",
                scale: 1.0,
            },
        }
    }
}

/// Dot and ring appearance for a cursor type. Sizes are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorPreset {
    pub dot_size: f32,
    pub ring_size: f32,
    pub ring_opacity: f32,
    pub dot_color: &'static str,
    pub ring_color: &'static str,
    pub scale: f32,
}

/// Published cursor snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub cursor_type: CursorType,
    pub text: Option<String>,
    /// False until the first published move and after the pointer leaves.
    pub is_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingFrame {
    due: Duration,
    x: f32,
    y: f32,
}

/// Single writer of the shared cursor state.
pub struct CursorTracker {
    frame_interval: Duration,
    touch: TouchCapability,
    pending: Option<PendingFrame>,
    coalesced: u64,
    shared: Arc<Mutex<CursorState>>,
}

impl CursorTracker {
    pub fn new(config: &CursorConfig, touch: TouchCapability) -> Self {
        Self {
            frame_interval: config.frame_interval(),
            touch,
            pending: None,
            coalesced: 0,
            shared: Arc::new(Mutex::new(CursorState::default())),
        }
    }

    /// True on touch devices, where pointer tracking is off.
    pub fn is_inert(&self) -> bool {
        self.touch.is_touch()
    }

    pub fn touch(&self) -> TouchCapability {
        self.touch
    }

    /// Number of samples replaced by a later sample in the same frame.
    pub fn coalesced_samples(&self) -> u64 {
        self.coalesced
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Records a pointer sample. The first sample requests a frame at the
    /// current frame boundary; later samples replace the pending one and
    /// keep its deadline.
    pub fn pointer_moved(&mut self, x: f32, y: f32, now: Duration) {
        if self.is_inert() {
            return;
        }
        if !x.is_finite() || !y.is_finite() {
            tracing::debug!("ignoring non-finite pointer sample");
            return;
        }

        let due = match self.pending.take() {
            Some(frame) => {
                self.coalesced += 1;
                frame.due
            }
            None => frame_boundary(now, self.frame_interval),
        };
        self.pending = Some(PendingFrame { due, x, y });
    }

    /// Publishes the pending sample once its frame is due. Returns whether
    /// anything was published.
    pub fn tick(&mut self, now: Duration) -> bool {
        let Some(frame) = self.pending else {
            return false;
        };
        if now < frame.due {
            return false;
        }
        self.pending = None;

        let mut state = self.write();
        state.x = frame.x;
        state.y = frame.y;
        state.is_visible = true;
        true
    }

    /// Sets the hover classification. No-op on touch devices.
    pub fn set_cursor_type(&mut self, cursor_type: CursorType, text: Option<String>) {
        if self.is_inert() {
            return;
        }
        let mut state = self.write();
        state.cursor_type = cursor_type;
        state.text = text;
    }

    pub fn pointer_enter(&mut self, cursor_type: CursorType, text: Option<String>) {
        self.set_cursor_type(cursor_type, text);
    }

    /// Resets the classification when the pointer leaves an element.
    pub fn pointer_leave(&mut self) {
        self.set_cursor_type(CursorType::Default, None);
    }

    /// Pointer left the document.
    pub fn pointer_exit(&mut self) {
        if self.is_inert() {
            return;
        }
        self.pending = None;
        self.write().is_visible = false;
    }

    /// Upgrades to touch mode the first time a touch is seen. Cancels the
    /// pending frame and hides the cursor.
    pub fn observe_touch(&mut self) {
        if !self.touch.observe_touch() {
            return;
        }
        tracing::info!("touch input detected; cursor tracking disabled");
        self.pending = None;
        self.write().is_visible = false;
    }

    pub fn state(&self) -> CursorState {
        self.write().clone()
    }

    /// Read-only view for visual consumers.
    pub fn handle(&self) -> CursorHandle {
        CursorHandle::new(self.shared.clone())
    }

    /// The tracker is the only writer, so a poisoned lock still holds a
    /// complete snapshot and is recovered.
    fn write(&self) -> MutexGuard<'_, CursorState> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for CursorTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorTracker")
            .field("frame_interval", &self.frame_interval)
            .field("touch", &self.touch)
            .field("pending", &self.pending)
            .field("coalesced", &self.coalesced)
            .finish()
    }
}

/// Shared, thread-safe view over the state published by [`CursorTracker`].
#[derive(Clone)]
pub struct CursorHandle {
    shared: Arc<Mutex<CursorState>>,
}

impl CursorHandle {
    fn new(shared: Arc<Mutex<CursorState>>) -> Self {
        Self { shared }
    }

    pub fn snapshot(&self) -> Result<CursorState> {
        let state = self.lock()?;
        Ok(state.clone())
    }

    pub fn position(&self) -> Result<(f32, f32)> {
        let state = self.lock()?;
        Ok((state.x, state.y))
    }

    fn lock(&self) -> Result<MutexGuard<'_, CursorState>> {
        self.shared
            .lock()
            .map_err(|_| ShowcaseError::msg("cursor state has been poisoned"))
    }
}

impl fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorHandle").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn tracker() -> CursorTracker {
        CursorTracker::new(&CursorConfig::default(), TouchCapability::pointer_only())
    }

    #[test]
    fn samples_in_one_frame_publish_once_with_the_latest() {
        let mut cursor = tracker();
        cursor.pointer_moved(10.0, 10.0, ms(1));
        cursor.pointer_moved(20.0, 15.0, ms(5));
        cursor.pointer_moved(30.0, 25.0, ms(9));

        assert!(!cursor.tick(ms(15)));
        assert!(!cursor.state().is_visible);
        assert!(cursor.tick(ms(16)));
        assert!(!cursor.tick(ms(32)));

        let state = cursor.state();
        assert_eq!((state.x, state.y), (30.0, 25.0));
        assert!(state.is_visible);
        assert_eq!(cursor.coalesced_samples(), 2);
    }

    #[test]
    fn sampling_then_ticking_in_the_same_frame_publishes_every_frame() {
        let mut cursor = tracker();
        for frame in 0..120_u64 {
            let now = ms(frame * 16);
            cursor.pointer_moved(frame as f32, frame as f32, now);
            assert!(cursor.tick(now), "frame {frame} did not publish");
            assert_eq!(cursor.state().x, frame as f32);
        }
        assert_eq!(cursor.coalesced_samples(), 0);
        assert!(cursor.state().is_visible);
    }

    #[test]
    fn late_samples_do_not_push_the_frame_back() {
        let mut cursor = tracker();
        cursor.pointer_moved(1.0, 1.0, ms(10));
        cursor.pointer_moved(2.0, 2.0, ms(16));
        cursor.pointer_moved(3.0, 3.0, ms(20));
        assert!(cursor.tick(ms(20)));
        assert_eq!(cursor.state().x, 3.0);
    }

    #[test]
    fn handle_sees_published_state() {
        let mut cursor = tracker();
        let handle = cursor.handle();
        cursor.pointer_moved(42.0, 7.0, ms(0));
        assert_eq!(handle.position().unwrap(), (0.0, 0.0));

        cursor.tick(ms(16));
        assert_eq!(handle.position().unwrap(), (42.0, 7.0));
        assert!(handle.snapshot().unwrap().is_visible);
    }

    #[test]
    fn enter_and_leave_classify_hover_targets() {
        let mut cursor = tracker();
        cursor.pointer_enter(CursorType::Text, Some("Read".into()));
        let state = cursor.state();
        assert_eq!(state.cursor_type, CursorType::Text);
        assert_eq!(state.text.as_deref(), Some("Read"));

        cursor.pointer_leave();
        let state = cursor.state();
        assert_eq!(state.cursor_type, CursorType::Default);
        assert_eq!(state.text, None);
    }

    #[test]
    fn touch_devices_ignore_pointer_input() {
        let mut cursor = CursorTracker::new(&CursorConfig::default(), TouchCapability::touch());
        cursor.pointer_moved(5.0, 5.0, ms(0));
        cursor.set_cursor_type(CursorType::Button, None);
        assert!(!cursor.tick(ms(100)));
        assert_eq!(cursor.state(), CursorState::default());
        assert!(cursor.is_inert());
    }

    #[test]
    fn first_touch_cancels_pending_frame_and_sticks() {
        let mut cursor = tracker();
        cursor.pointer_moved(5.0, 5.0, ms(0));
        cursor.tick(ms(16));
        cursor.pointer_moved(50.0, 50.0, ms(20));

        cursor.observe_touch();
        assert!(!cursor.has_pending_frame());
        assert!(!cursor.tick(ms(100)));
        assert!(!cursor.state().is_visible);

        cursor.pointer_moved(60.0, 60.0, ms(120));
        cursor.set_cursor_type(CursorType::Link, None);
        assert!(!cursor.has_pending_frame());
        assert_eq!(cursor.state().cursor_type, CursorType::Default);
    }

    #[test]
    fn leaving_the_document_hides_the_cursor() {
        let mut cursor = tracker();
        cursor.pointer_moved(5.0, 5.0, ms(0));
        cursor.tick(ms(16));
        cursor.pointer_exit();
        assert!(!cursor.state().is_visible);
    }

    #[test]
    fn non_finite_samples_are_dropped() {
        let mut cursor = tracker();
        cursor.pointer_moved(f32::NAN, 1.0, ms(0));
        assert!(!cursor.has_pending_frame());
    }

    #[test]
    fn presets_scale_with_affordance() {
        assert!(CursorType::Button.preset().ring_size > CursorType::Link.preset().ring_size);
        let hidden = CursorType::Hidden.preset();
        assert_eq!((hidden.dot_size, hidden.ring_size, hidden.scale), (0.0, 0.0, 0.0));
        assert_eq!(CursorType::Text.preset(), CursorType::Default.preset());
        assert_eq!(CursorType::ALL.len(), 6);
    }
}
