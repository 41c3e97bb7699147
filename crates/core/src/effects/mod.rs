//! Programmatic interface sounds.
//!
//! Tones are described by [`ScheduledTone`] values pinned to the output's
//! audio clock, so their timing does not depend on how promptly the caller
//! runs. A per-kind throttle keyed on the caller's virtual time drops
//! repeats that arrive too quickly.

mod tone;

use std::{collections::HashMap, fmt, time::Duration};

pub use tone::{ScheduledTone, SoundConfig, SoundKind, Waveform};

use crate::{audio::ContextState, config::EffectsConfig, PlaybackError, Result};

/// Audio-clock driven sink for synthesized tones.
pub trait ToneOutput {
    /// Current audio-clock time in seconds.
    fn current_time(&self) -> f64;

    fn context_state(&self) -> ContextState;

    fn resume(&mut self) -> Result<()>;

    fn schedule(&mut self, tone: ScheduledTone) -> Result<()>;

    fn close(&mut self);
}

/// Output that keeps every scheduled tone and can mix them offline.
#[derive(Debug, Clone)]
pub struct ToneRecorder {
    clock: f64,
    state: ContextState,
    scheduled: Vec<ScheduledTone>,
}

impl Default for ToneRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneRecorder {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            state: ContextState::Suspended,
            scheduled: Vec::new(),
        }
    }

    /// Moves the audio clock forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.clock += delta.as_secs_f64();
    }

    pub fn scheduled(&self) -> &[ScheduledTone] {
        &self.scheduled
    }

    /// Mixes every scheduled tone into one mono buffer starting at audio
    /// time zero.
    pub fn mixdown(&self, sample_rate: u32) -> Vec<f32> {
        let rate = f64::from(sample_rate.max(1));
        let end = self
            .scheduled
            .iter()
            .map(|tone| tone.stop_at)
            .fold(0.0_f64, f64::max);
        let len = (end * rate).ceil() as usize;
        let mut mix = vec![0.0_f32; len];

        for tone in &self.scheduled {
            let first = (tone.start_at * rate).floor().max(0.0) as usize;
            let last = ((tone.stop_at * rate).ceil() as usize).min(len);
            for (index, slot) in mix.iter_mut().enumerate().take(last).skip(first) {
                *slot += tone.sample_at(index as f64 / rate);
            }
        }

        mix
    }
}

impl ToneOutput for ToneRecorder {
    fn current_time(&self) -> f64 {
        self.clock
    }

    fn context_state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(PlaybackError::ContextClosed.into());
        }
        self.state = ContextState::Running;
        Ok(())
    }

    fn schedule(&mut self, tone: ScheduledTone) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(PlaybackError::ContextClosed.into());
        }
        self.scheduled.push(tone);
        Ok(())
    }

    fn close(&mut self) {
        self.state = ContextState::Closed;
    }
}

/// Throttled synthesizer for interface sounds.
pub struct SoundEffects<O: ToneOutput> {
    output: O,
    throttle: Duration,
    attack: Duration,
    last_played: HashMap<SoundKind, Duration>,
    muted: bool,
}

impl<O: ToneOutput> SoundEffects<O> {
    pub fn new(output: O, config: &EffectsConfig) -> Self {
        Self {
            output,
            throttle: Duration::from_millis(config.throttle_ms),
            attack: Duration::from_millis(config.attack_ms),
            last_played: HashMap::new(),
            muted: false,
        }
    }

    /// Schedules `kind` unless `muted`, the synthesizer's own mute, or the
    /// throttle window rules it out. Returns whether a tone was scheduled.
    pub fn play(&mut self, kind: SoundKind, now: Duration, muted: bool) -> bool {
        if muted || self.muted {
            return false;
        }

        if let Some(last) = self.last_played.get(&kind) {
            if now.saturating_sub(*last) < self.throttle {
                return false;
            }
        }
        self.last_played.insert(kind, now);

        match self.synthesize(kind) {
            Ok(tone) => {
                tracing::debug!(sound = kind.name(), start = tone.start_at, "scheduled tone");
                true
            }
            Err(err) => {
                tracing::warn!(sound = kind.name(), error = %err, "failed to synthesize tone");
                false
            }
        }
    }

    pub fn click(&mut self, now: Duration) -> bool {
        self.play(SoundKind::Click, now, false)
    }

    pub fn hover(&mut self, now: Duration) -> bool {
        self.play(SoundKind::Hover, now, false)
    }

    pub fn transition(&mut self, now: Duration) -> bool {
        self.play(SoundKind::Transition, now, false)
    }

    pub fn success(&mut self, now: Duration) -> bool {
        self.play(SoundKind::Success, now, false)
    }

    pub fn error(&mut self, now: Duration) -> bool {
        self.play(SoundKind::Error, now, false)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Closes the output; later calls schedule nothing.
    pub fn shutdown(&mut self) {
        self.output.close();
        self.last_played.clear();
    }

    fn synthesize(&mut self, kind: SoundKind) -> Result<ScheduledTone> {
        if self.output.context_state() == ContextState::Suspended {
            self.output.resume()?;
        }
        let tone = ScheduledTone::new(kind, self.output.current_time(), self.attack);
        self.output.schedule(tone)?;
        Ok(tone)
    }
}

impl<O: ToneOutput> Drop for SoundEffects<O> {
    fn drop(&mut self) {
        self.output.close();
    }
}

impl<O: ToneOutput> fmt::Debug for SoundEffects<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundEffects")
            .field("throttle", &self.throttle)
            .field("attack", &self.attack)
            .field("muted", &self.muted)
            .field("tracked_kinds", &self.last_played.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn effects() -> SoundEffects<ToneRecorder> {
        SoundEffects::new(ToneRecorder::new(), &EffectsConfig::default())
    }

    #[test]
    fn repeats_inside_throttle_window_are_dropped() {
        let mut fx = effects();
        assert!(fx.play(SoundKind::Hover, ms(1000), false));
        assert!(!fx.play(SoundKind::Hover, ms(1050), false));
        assert_eq!(fx.output().scheduled().len(), 1);
    }

    #[test]
    fn repeats_after_throttle_window_play_again() {
        let mut fx = effects();
        assert!(fx.play(SoundKind::Hover, ms(1000), false));
        assert!(fx.play(SoundKind::Hover, ms(1100), false));
        assert_eq!(fx.output().scheduled().len(), 2);
    }

    #[test]
    fn throttle_is_tracked_per_kind() {
        let mut fx = effects();
        assert!(fx.click(ms(0)));
        assert!(fx.hover(ms(10)));
        assert!(fx.success(ms(20)));
        assert!(!fx.click(ms(30)));
        assert_eq!(fx.output().scheduled().len(), 3);
    }

    #[test]
    fn muted_calls_are_skipped_without_touching_the_ledger() {
        let mut fx = effects();
        assert!(!fx.play(SoundKind::Click, ms(0), true));
        assert!(fx.play(SoundKind::Click, ms(10), false));

        fx.set_muted(true);
        assert!(!fx.error(ms(500)));
        fx.toggle_mute();
        assert!(fx.error(ms(510)));
        assert_eq!(fx.output().scheduled().len(), 2);
    }

    #[test]
    fn first_trigger_resumes_a_suspended_context() {
        let mut fx = effects();
        assert_eq!(fx.output().context_state(), ContextState::Suspended);
        fx.transition(ms(0));
        assert_eq!(fx.output().context_state(), ContextState::Running);
    }

    #[test]
    fn tones_are_pinned_to_the_audio_clock() {
        let mut fx = effects();
        fx.output_mut().advance(Duration::from_secs_f64(3.25));
        fx.click(ms(9_999));

        let tone = fx.output().scheduled()[0];
        assert_eq!(tone.start_at, 3.25);
        assert!((tone.stop_at - 3.30).abs() < 1e-9);
        assert_eq!(tone.frequency, 800.0);
        assert_eq!(tone.waveform, Waveform::Sine);
    }

    #[test]
    fn closed_output_schedules_nothing() {
        let mut fx = effects();
        fx.shutdown();
        assert!(!fx.click(ms(0)));
        assert!(fx.output().scheduled().is_empty());
    }

    #[test]
    fn overlapping_kinds_mix_together() {
        let mut fx = effects();
        fx.click(ms(0));
        fx.error(ms(0));

        let mix = fx.output().mixdown(8_000);
        assert_eq!(mix.len(), 800);
        assert!(mix.iter().any(|sample| sample.abs() > 0.1));
    }

    /// Output that only counts how often it was closed.
    struct CountingOutput {
        closes: Rc<Cell<u32>>,
    }

    impl ToneOutput for CountingOutput {
        fn current_time(&self) -> f64 {
            0.0
        }

        fn context_state(&self) -> ContextState {
            ContextState::Running
        }

        fn resume(&mut self) -> Result<()> {
            Ok(())
        }

        fn schedule(&mut self, _tone: ScheduledTone) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn dropping_the_synthesizer_closes_its_output() {
        let closes = Rc::new(Cell::new(0));
        let fx = SoundEffects::new(
            CountingOutput {
                closes: Rc::clone(&closes),
            },
            &EffectsConfig::default(),
        );
        assert_eq!(closes.get(), 0);
        drop(fx);
        assert_eq!(closes.get(), 1);
    }
}
