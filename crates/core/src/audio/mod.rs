mod backend;
mod simulated;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use backend::{AudioBackend, ContextState, MediaEvent};
pub use simulated::SimulatedBackend;

use crate::{
    config::AudioConfig,
    prefs::{MusicPreferences, PreferenceStore},
    timeline::Timer,
    PlaybackError, Result, ShowcaseError,
};

/// Immutable descriptor for one playable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub url: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
        }
    }

    /// Ambient playlist used when no tracks are supplied.
    pub fn default_playlist() -> Vec<Track> {
        vec![
            Track::new(
                "ambient-1",
                "Ethereal Dreams",
                "Generated Ambient",
                "/audio/music/track1.mp3",
            ),
            Track::new(
                "ambient-2",
                "Digital Horizons",
                "Generated Ambient",
                "/audio/music/track2.mp3",
            ),
        ]
    }
}

/// Observable transport state owned by [`AudioEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub track_index: usize,
    pub is_playing: bool,
    pub volume: f32,
    pub is_muted: bool,
    /// Seconds; zero until the track's metadata has loaded.
    pub duration: f64,
    pub current_time: f64,
}

impl PlaybackState {
    fn preferences(&self) -> MusicPreferences {
        MusicPreferences {
            volume: self.volume,
            is_muted: self.is_muted,
            current_track_index: self.track_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeCompletion {
    /// Leave the resource playing at the target gain.
    Hold,
    /// Halt the resource once the gain reaches zero.
    Halt,
}

/// Linear gain ramp applied in discrete steps.
#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    started_at: Duration,
    duration: Duration,
    steps: u32,
    applied: u32,
    completion: FadeCompletion,
}

impl Fade {
    fn steps_due(&self, now: Duration) -> u32 {
        let step_len = self.duration / self.steps.max(1);
        if step_len.is_zero() {
            return self.steps;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let due = elapsed.as_nanos() / step_len.as_nanos();
        u32::try_from(due).unwrap_or(u32::MAX).min(self.steps)
    }

    fn gain_at(&self, step: u32) -> f32 {
        if step >= self.steps {
            return self.to;
        }
        let increment = (self.to - self.from) / self.steps as f32;
        (self.from + increment * step as f32).clamp(0.0, 1.0)
    }
}

type Connector<B> = Box<dyn FnMut() -> Result<B>>;

/// Music player that owns one media resource and its output gain.
///
/// Construction is free of side effects. The backend is acquired through
/// the connector on the first [`play`](Self::play), which callers must
/// route from a user gesture. Every operation takes the current virtual
/// time; [`tick`](Self::tick) advances fades, deferred restarts and media
/// events.
pub struct AudioEngine<B: AudioBackend> {
    tracks: Vec<Track>,
    config: AudioConfig,
    state: PlaybackState,
    connect: Connector<B>,
    backend: Option<B>,
    fade: Option<Fade>,
    pending_restart: Option<Timer>,
    preferences: Option<PreferenceStore>,
    last_saved: Option<MusicPreferences>,
    closed: bool,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Creates an engine over `tracks`. An empty list falls back to
    /// [`Track::default_playlist`].
    pub fn new(
        tracks: Vec<Track>,
        config: AudioConfig,
        connect: impl FnMut() -> Result<B> + 'static,
    ) -> Self {
        let tracks = if tracks.is_empty() {
            Track::default_playlist()
        } else {
            tracks
        };
        let defaults = MusicPreferences::from_audio_config(&config);

        Self {
            tracks,
            state: PlaybackState {
                track_index: 0,
                is_playing: false,
                volume: defaults.volume,
                is_muted: defaults.is_muted,
                duration: 0.0,
                current_time: 0.0,
            },
            config,
            connect: Box::new(connect),
            backend: None,
            fade: None,
            pending_restart: None,
            preferences: None,
            last_saved: None,
            closed: false,
        }
    }

    /// Restores persisted preferences and writes every later change back.
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        let prefs = store.load();
        self.state.volume = prefs.volume.clamp(0.0, 1.0);
        self.state.is_muted = prefs.is_muted;
        self.state.track_index = prefs.current_track_index % self.tracks.len();
        self.last_saved = Some(prefs);
        self.preferences = Some(store);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_track(&self) -> &Track {
        &self.tracks[self.state.track_index]
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_restart_pending(&self) -> bool {
        self.pending_restart.is_some()
    }

    /// Gain currently applied to the output, zero before activation.
    pub fn gain(&self) -> f32 {
        self.backend.as_ref().map(|b| b.gain()).unwrap_or(0.0)
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Starts the current track and fades in to the target gain.
    ///
    /// Failures such as a blocked autoplay are logged and leave the engine
    /// not playing.
    pub fn play(&mut self, now: Duration) {
        self.pending_restart = None;
        if let Err(err) = self.try_play(now) {
            tracing::warn!(track = %self.current_track().id, error = %err, "playback did not start");
        }
    }

    /// Marks the engine paused at once and halts the resource after a
    /// fade to silence.
    pub fn pause(&mut self, now: Duration) {
        self.pending_restart = None;
        if self.backend.is_none() {
            return;
        }
        self.state.is_playing = false;
        self.start_fade(0.0, self.config.fade(), FadeCompletion::Halt, now);
    }

    pub fn toggle_play(&mut self, now: Duration) {
        if self.state.is_playing {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    pub fn next_track(&mut self, now: Duration) {
        let next = (self.state.track_index + 1) % self.tracks.len();
        self.switch_track(next, now);
    }

    pub fn previous_track(&mut self, now: Duration) {
        let len = self.tracks.len();
        let previous = (self.state.track_index + len - 1) % len;
        self.switch_track(previous, now);
    }

    /// Stores a clamped volume. The live gain follows immediately only
    /// while playing unmuted.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.state.volume = volume;

        if self.state.is_playing && !self.state.is_muted {
            if let Some(backend) = self.backend.as_mut() {
                self.fade = None;
                backend.set_gain(volume);
            }
        }
        self.persist();
    }

    pub fn toggle_mute(&mut self, now: Duration) {
        self.state.is_muted = !self.state.is_muted;
        if self.state.is_playing {
            let target = self.target_gain();
            self.start_fade(target, self.config.mute_fade(), FadeCompletion::Hold, now);
        }
        self.persist();
    }

    /// Moves the playback position without fading.
    pub fn seek(&mut self, seconds: f64, now: Duration) {
        if !seconds.is_finite() {
            tracing::warn!(seconds, "ignoring non-finite seek target");
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let mut target = seconds.max(0.0);
        if self.state.duration > 0.0 {
            target = target.min(self.state.duration);
        }
        backend.seek(target, now);
        self.state.current_time = target;
    }

    /// Advances fades and deferred restarts, then applies media events.
    pub fn tick(&mut self, now: Duration) {
        self.advance_fade(now);

        if let Some(restart) = self.pending_restart {
            if restart.is_due(now) {
                self.play(now);
            }
        }

        let events = match self.backend.as_mut() {
            Some(backend) => backend.poll_events(now),
            None => return,
        };
        for event in events {
            match event {
                MediaEvent::TimeUpdate(seconds) => self.state.current_time = seconds,
                MediaEvent::LoadedMetadata(seconds) => self.state.duration = seconds,
                MediaEvent::Ended => {
                    tracing::debug!(track = %self.current_track().id, "track ended");
                    self.next_track(now);
                }
            }
        }
    }

    /// Cancels pending work and releases the media resource. Safe to call
    /// more than once.
    pub fn shutdown(&mut self) {
        self.fade = None;
        self.pending_restart = None;
        self.state.is_playing = false;
        if let Some(mut backend) = self.backend.take() {
            backend.release();
            tracing::info!("audio graph released");
        }
        self.closed = true;
    }

    fn try_play(&mut self, now: Duration) -> Result<()> {
        let url = self.current_track().url.clone();
        let backend = self.activate()?;

        if backend.context_state() == ContextState::Suspended {
            backend.resume()?;
        }
        if backend.source() != Some(url.as_str()) {
            backend.load(&url)?;
        }
        backend.play(now)?;

        self.state.is_playing = true;
        let target = self.target_gain();
        self.start_fade(target, self.config.fade(), FadeCompletion::Hold, now);
        tracing::debug!(track = %self.current_track().id, target, "playback started");
        Ok(())
    }

    fn activate(&mut self) -> Result<&mut B> {
        if self.closed {
            return Err(PlaybackError::ContextClosed.into());
        }
        if self.backend.is_none() {
            let mut backend = (self.connect)()?;
            backend.set_gain(0.0);
            tracing::info!(tracks = self.tracks.len(), "audio graph initialised");
            self.backend = Some(backend);
        }
        self.backend
            .as_mut()
            .ok_or_else(|| ShowcaseError::from(PlaybackError::NotInitialized))
    }

    fn switch_track(&mut self, index: usize, now: Duration) {
        let resume = self.state.is_playing || self.pending_restart.is_some();
        let halting = matches!(
            self.fade,
            Some(Fade {
                completion: FadeCompletion::Halt,
                ..
            })
        );

        self.state.track_index = index;
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;

        if resume || halting {
            self.fade = None;
            if let Some(backend) = self.backend.as_mut() {
                backend.pause(now);
                backend.set_gain(0.0);
            }
        }
        let settle = self.config.settle();
        self.pending_restart = resume.then(|| Timer::once(now, settle));

        tracing::debug!(track = %self.current_track().id, resume, "switched track");
        self.persist();
    }

    fn target_gain(&self) -> f32 {
        if self.state.is_muted {
            0.0
        } else {
            self.state.volume
        }
    }

    fn start_fade(&mut self, to: f32, duration: Duration, completion: FadeCompletion, now: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        self.fade = Some(Fade {
            from: backend.gain(),
            to,
            started_at: now,
            duration,
            steps: self.config.fade_steps.max(1),
            applied: 0,
            completion,
        });
        self.advance_fade(now);
    }

    fn advance_fade(&mut self, now: Duration) {
        let (Some(mut fade), Some(backend)) = (self.fade, self.backend.as_mut()) else {
            return;
        };

        let due = fade.steps_due(now);
        if due > fade.applied {
            backend.set_gain(fade.gain_at(due));
            fade.applied = due;
        }

        if due < fade.steps {
            self.fade = Some(fade);
            return;
        }

        self.fade = None;
        if fade.completion == FadeCompletion::Halt && fade.to == 0.0 {
            backend.pause(now);
        }
        tracing::debug!(gain = fade.to, "fade finished");
    }

    fn persist(&mut self) {
        let prefs = self.state.preferences();
        if self.last_saved == Some(prefs) {
            return;
        }
        if let Some(store) = self.preferences.as_mut() {
            if store.save(&prefs) {
                self.last_saved = Some(prefs);
            }
        }
    }
}

impl<B: AudioBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: AudioBackend> fmt::Debug for AudioEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioEngine")
            .field("tracks", &self.tracks.len())
            .field("state", &self.state)
            .field("activated", &self.backend.is_some())
            .field("fading", &self.fade.is_some())
            .field("restart_pending", &self.pending_restart.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::prefs::{KeyValueStore, MemoryStore};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn backend() -> SimulatedBackend {
        SimulatedBackend::new()
            .with_track("/audio/music/track1.mp3", 120.0)
            .with_track("/audio/music/track2.mp3", 90.0)
    }

    fn unmuted() -> AudioConfig {
        AudioConfig {
            default_muted: false,
            ..AudioConfig::default()
        }
    }

    fn engine(config: AudioConfig) -> AudioEngine<SimulatedBackend> {
        AudioEngine::new(Track::default_playlist(), config, || Ok(backend()))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn backend_is_acquired_on_first_play_only() {
        let connects = Rc::new(Cell::new(0));
        let counter = connects.clone();
        let mut engine = AudioEngine::new(Vec::new(), unmuted(), move || {
            counter.set(counter.get() + 1);
            Ok(backend())
        });

        engine.set_volume(0.5);
        engine.seek(10.0, ms(0));
        assert_eq!(connects.get(), 0);
        assert!(engine.backend().is_none());

        engine.play(ms(0));
        engine.pause(ms(10));
        engine.play(ms(20));
        assert_eq!(connects.get(), 1);
        assert_eq!(
            engine.backend().unwrap().context_state(),
            ContextState::Running
        );
    }

    #[test]
    fn play_fades_in_over_sixty_steps() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));

        assert!(engine.is_playing());
        assert_eq!(engine.gain(), 0.0);

        engine.tick(ms(500));
        assert!(approx(engine.gain(), 0.15));
        assert!(engine.is_fading());

        engine.tick(ms(1000));
        assert!(approx(engine.gain(), 0.3));
        assert!(!engine.is_fading());
    }

    #[test]
    fn fade_writes_each_step() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        let before = engine.backend().unwrap().gain_writes();

        for t in (0..=1000).step_by(4) {
            engine.tick(ms(t));
        }
        let writes = engine.backend().unwrap().gain_writes() - before;
        assert_eq!(writes, 60);
    }

    #[test]
    fn muted_play_keeps_gain_silent() {
        let mut engine = engine(AudioConfig::default());
        engine.play(ms(0));
        engine.tick(ms(1000));

        assert!(engine.is_playing());
        assert_eq!(engine.gain(), 0.0);
        assert!(engine.backend().unwrap().is_playing());
    }

    #[test]
    fn pause_reports_immediately_and_halts_after_fade() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));

        engine.pause(ms(2000));
        assert!(!engine.is_playing());
        assert!(engine.backend().unwrap().is_playing());

        engine.tick(ms(2500));
        assert!(engine.backend().unwrap().is_playing());
        assert!(engine.gain() > 0.0);

        engine.tick(ms(3000));
        assert_eq!(engine.gain(), 0.0);
        assert!(!engine.backend().unwrap().is_playing());
    }

    #[test]
    fn toggle_play_dispatches_on_state() {
        let mut engine = engine(unmuted());
        engine.toggle_play(ms(0));
        assert!(engine.is_playing());
        engine.toggle_play(ms(100));
        assert!(!engine.is_playing());
    }

    #[test]
    fn volume_is_clamped() {
        let mut engine = engine(unmuted());
        engine.set_volume(-0.5);
        assert_eq!(engine.state().volume, 0.0);
        engine.set_volume(1.7);
        assert_eq!(engine.state().volume, 1.0);
        engine.set_volume(f32::NAN);
        assert_eq!(engine.state().volume, 0.0);
    }

    #[test]
    fn volume_reaches_live_gain_only_when_audible() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));

        engine.set_volume(0.8);
        assert!(approx(engine.gain(), 0.8));

        engine.toggle_mute(ms(1100));
        engine.tick(ms(1400));
        engine.set_volume(0.5);
        assert_eq!(engine.gain(), 0.0);
        assert_eq!(engine.state().volume, 0.5);
    }

    #[test]
    fn track_navigation_wraps_around() {
        let mut engine = engine(unmuted());
        engine.previous_track(ms(0));
        assert_eq!(engine.state().track_index, 1);
        engine.next_track(ms(0));
        assert_eq!(engine.state().track_index, 0);
        engine.next_track(ms(0));
        engine.next_track(ms(0));
        assert_eq!(engine.state().track_index, 0);
    }

    #[test]
    fn switching_while_playing_restarts_after_settle_delay() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));

        engine.next_track(ms(2000));
        assert!(!engine.is_playing());
        assert!(engine.is_restart_pending());
        assert!(!engine.backend().unwrap().is_playing());
        assert_eq!(engine.gain(), 0.0);

        engine.tick(ms(2099));
        assert!(!engine.is_playing());

        engine.tick(ms(2100));
        assert!(engine.is_playing());
        assert_eq!(
            engine.backend().unwrap().source(),
            Some("/audio/music/track2.mp3")
        );
        engine.tick(ms(3100));
        assert!(approx(engine.gain(), 0.3));
    }

    #[test]
    fn pause_cancels_pending_restart() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.next_track(ms(500));
        engine.pause(ms(550));

        engine.tick(ms(1000));
        assert!(!engine.is_playing());
        assert!(!engine.is_restart_pending());
    }

    #[test]
    fn switching_while_stopped_does_not_start_playback() {
        let mut engine = engine(unmuted());
        engine.next_track(ms(0));
        engine.tick(ms(500));
        assert!(!engine.is_playing());
        assert!(engine.backend().is_none());
    }

    #[test]
    fn toggling_mute_twice_restores_gain() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));

        engine.toggle_mute(ms(1000));
        assert!(engine.state().is_muted);
        engine.tick(ms(1300));
        assert_eq!(engine.gain(), 0.0);
        assert!(engine.backend().unwrap().is_playing());

        engine.toggle_mute(ms(1300));
        assert!(!engine.state().is_muted);
        engine.tick(ms(1600));
        assert!(approx(engine.gain(), 0.3));
    }

    #[test]
    fn mute_while_stopped_only_flips_flag() {
        let mut engine = engine(unmuted());
        engine.toggle_mute(ms(0));
        assert!(engine.state().is_muted);
        assert!(!engine.is_fading());
    }

    #[test]
    fn blocked_autoplay_leaves_engine_paused() {
        let mut engine = AudioEngine::new(Vec::new(), unmuted(), || {
            Ok(backend().with_autoplay_blocked())
        });
        engine.play(ms(0));
        assert!(!engine.is_playing());
        assert!(!engine.is_fading());

        engine.backend_mut().unwrap().allow_autoplay();
        engine.play(ms(100));
        assert!(engine.is_playing());
    }

    #[test]
    fn missing_source_surfaces_only_on_play() {
        let tracks = vec![Track::new("gone", "Gone", "Nobody", "/missing.mp3")];
        let mut engine = AudioEngine::new(tracks, unmuted(), || Ok(backend()));
        engine.play(ms(0));
        assert!(!engine.is_playing());
    }

    #[test]
    fn failed_activation_is_retried_on_next_play() {
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        let mut engine = AudioEngine::new(Vec::new(), unmuted(), move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                Err(ShowcaseError::msg("no audio device"))
            } else {
                Ok(backend())
            }
        });

        engine.play(ms(0));
        assert!(!engine.is_playing());
        engine.play(ms(10));
        assert!(engine.is_playing());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn media_events_update_position_and_advance_on_end() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));
        assert_eq!(engine.state().duration, 120.0);
        assert_eq!(engine.state().current_time, 1.0);

        engine.tick(ms(121_000));
        assert_eq!(engine.state().track_index, 1);
        assert!(engine.is_restart_pending());

        engine.tick(ms(121_100));
        assert!(engine.is_playing());
        engine.tick(ms(121_200));
        assert_eq!(engine.state().duration, 90.0);
    }

    #[test]
    fn seek_moves_position_without_fading() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.tick(ms(1000));

        engine.seek(42.0, ms(1000));
        assert_eq!(engine.state().current_time, 42.0);
        assert!(!engine.is_fading());

        engine.seek(500.0, ms(1000));
        assert_eq!(engine.state().current_time, 120.0);
    }

    #[test]
    fn shutdown_releases_resources_once() {
        let mut engine = engine(unmuted());
        engine.play(ms(0));
        engine.next_track(ms(100));

        engine.shutdown();
        engine.shutdown();
        assert!(engine.backend().is_none());
        assert!(!engine.is_restart_pending());
        assert!(!engine.is_fading());

        engine.play(ms(200));
        assert!(!engine.is_playing());
    }

    #[test]
    fn preferences_are_restored_and_written_on_change() {
        let key = "portfolio_music_preferences";
        let mut seed = MemoryStore::new();
        seed.set(key, r#"{"volume":0.4,"isMuted":false,"currentTrackIndex":3}"#)
            .unwrap();

        let mut engine = engine(AudioConfig::default())
            .with_preferences(PreferenceStore::new(seed, key));
        let state = engine.state();
        assert_eq!(state.volume, 0.4);
        assert!(!state.is_muted);
        assert_eq!(state.track_index, 1);

        engine.set_volume(0.9);
        engine.toggle_mute(ms(0));
        engine.next_track(ms(0));

        let saved = engine.preferences.as_ref().unwrap().load();
        assert_eq!(
            saved,
            MusicPreferences {
                volume: 0.9,
                is_muted: true,
                current_track_index: 0,
            }
        );
    }

    /// Store that rejects writes while `accepting` is false.
    struct FlakyStore {
        accepting: Rc<Cell<bool>>,
        value: Rc<RefCell<Option<String>>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(self.value.borrow().clone())
        }

        fn set(&mut self, _key: &str, value: &str) -> Result<()> {
            if !self.accepting.get() {
                return Err(ShowcaseError::Storage("storage unavailable".into()));
            }
            *self.value.borrow_mut() = Some(value.to_string());
            Ok(())
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            *self.value.borrow_mut() = None;
            Ok(())
        }
    }

    #[test]
    fn failed_save_is_retried_on_the_next_update() {
        let accepting = Rc::new(Cell::new(false));
        let value = Rc::new(RefCell::new(None));
        let store = FlakyStore {
            accepting: Rc::clone(&accepting),
            value: Rc::clone(&value),
        };
        let mut engine = engine(AudioConfig::default())
            .with_preferences(PreferenceStore::new(store, "portfolio_music_preferences"));

        engine.set_volume(0.6);
        assert!(value.borrow().is_none());

        accepting.set(true);
        engine.set_volume(0.6);
        let saved = engine.preferences.as_ref().unwrap().load();
        assert_eq!(saved.volume, 0.6);
        assert!(value.borrow().is_some());
    }
}
