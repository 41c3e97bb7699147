use std::{collections::HashMap, time::Duration};

use crate::{
    audio::{AudioBackend, ContextState, MediaEvent},
    PlaybackError, Result,
};

/// In-process media backend that advances playback on virtual time.
///
/// Sources must be registered with their duration before they can be
/// loaded. The context starts suspended, like a browser context created
/// before any user gesture.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    context: ContextState,
    library: HashMap<String, f64>,
    source: Option<String>,
    autoplay_allowed: bool,
    gain: f32,
    gain_writes: usize,
    position: f64,
    playing_since: Option<Duration>,
    last_reported: Option<f64>,
    pending: Vec<MediaEvent>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            context: ContextState::Suspended,
            library: HashMap::new(),
            source: None,
            autoplay_allowed: true,
            gain: 1.0,
            gain_writes: 0,
            position: 0.0,
            playing_since: None,
            last_reported: None,
            pending: Vec::new(),
        }
    }

    /// Registers a playable source and its length in seconds.
    pub fn with_track(mut self, url: impl Into<String>, duration_seconds: f64) -> Self {
        self.library.insert(url.into(), duration_seconds.max(0.0));
        self
    }

    pub fn with_autoplay_blocked(mut self) -> Self {
        self.autoplay_allowed = false;
        self
    }

    pub fn allow_autoplay(&mut self) {
        self.autoplay_allowed = true;
    }

    /// Number of gain writes so far, a proxy for fade resolution.
    pub fn gain_writes(&self) -> usize {
        self.gain_writes
    }

    pub fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    pub fn position(&self, now: Duration) -> f64 {
        match self.playing_since {
            Some(since) => self.position + now.saturating_sub(since).as_secs_f64(),
            None => self.position,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.source
            .as_ref()
            .and_then(|url| self.library.get(url).copied())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.context == ContextState::Closed {
            return Err(PlaybackError::ContextClosed.into());
        }
        Ok(())
    }
}

impl AudioBackend for SimulatedBackend {
    fn context_state(&self) -> ContextState {
        self.context
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.context = ContextState::Running;
        Ok(())
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.playing_since = None;
        self.position = 0.0;
        self.last_reported = None;

        let Some(duration) = self.library.get(url).copied() else {
            self.source = None;
            return Err(PlaybackError::MissingSource(url.to_string()).into());
        };

        self.source = Some(url.to_string());
        self.pending.push(MediaEvent::LoadedMetadata(duration));
        Ok(())
    }

    fn play(&mut self, now: Duration) -> Result<()> {
        self.ensure_open()?;
        if !self.autoplay_allowed {
            return Err(PlaybackError::AutoplayBlocked.into());
        }
        let Some(duration) = self.duration() else {
            return Err(PlaybackError::NotInitialized.into());
        };
        if self.position >= duration {
            self.position = 0.0;
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(now);
        }
        Ok(())
    }

    fn pause(&mut self, now: Duration) {
        self.position = self.position(now);
        self.playing_since = None;
    }

    fn seek(&mut self, seconds: f64, now: Duration) {
        let limit = self.duration().unwrap_or(f64::MAX);
        self.position = seconds.clamp(0.0, limit);
        if self.playing_since.is_some() {
            self.playing_since = Some(now);
        }
    }

    fn gain(&self) -> f32 {
        self.gain
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
        self.gain_writes += 1;
    }

    fn poll_events(&mut self, now: Duration) -> Vec<MediaEvent> {
        let mut events = std::mem::take(&mut self.pending);

        if let (Some(duration), true) = (self.duration(), self.is_playing()) {
            let position = self.position(now);
            if position >= duration {
                self.position = duration;
                self.playing_since = None;
                events.push(MediaEvent::TimeUpdate(duration));
                events.push(MediaEvent::Ended);
                self.last_reported = Some(duration);
            } else if self.last_reported != Some(position) {
                events.push(MediaEvent::TimeUpdate(position));
                self.last_reported = Some(position);
            }
        }

        events
    }

    fn release(&mut self) {
        self.playing_since = None;
        self.source = None;
        self.pending.clear();
        self.context = ContextState::Closed;
    }
}
