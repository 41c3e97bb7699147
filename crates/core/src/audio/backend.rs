use std::time::Duration;

use crate::Result;

/// Lifecycle of the platform audio context behind a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet allowed to produce sound.
    Suspended,
    Running,
    /// Released; the backend cannot be used again.
    Closed,
}

/// Notifications a media resource raises while it plays.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position in seconds.
    TimeUpdate(f64),
    /// Track duration in seconds, known once metadata has loaded.
    LoadedMetadata(f64),
    /// The current source played through to its end.
    Ended,
}

/// One playable media resource routed through a single gain stage.
///
/// Implementations wrap a platform player. Methods that can be refused by
/// the platform (autoplay policy, missing files, decode errors) return
/// `Result`; the rest are infallible and must tolerate redundant calls.
pub trait AudioBackend {
    fn context_state(&self) -> ContextState;

    /// Lifts a suspended context into the running state.
    fn resume(&mut self) -> Result<()>;

    /// URL of the currently loaded source, if any.
    fn source(&self) -> Option<&str>;

    /// Replaces the current source and rewinds to the start.
    fn load(&mut self, url: &str) -> Result<()>;

    fn play(&mut self, now: Duration) -> Result<()>;

    fn pause(&mut self, now: Duration);

    fn seek(&mut self, seconds: f64, now: Duration);

    fn gain(&self) -> f32;

    fn set_gain(&mut self, gain: f32);

    /// Drains the events raised since the previous poll.
    fn poll_events(&mut self, now: Duration) -> Vec<MediaEvent>;

    /// Halts playback, drops the source and closes the context.
    fn release(&mut self);
}
