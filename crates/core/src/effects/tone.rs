use std::{f64::consts::TAU, time::Duration};

use serde::{Deserialize, Serialize};

/// Interface sounds the synthesizer knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    Click,
    Hover,
    Transition,
    Success,
    Error,
}

impl SoundKind {
    pub const ALL: [SoundKind; 5] = [
        SoundKind::Click,
        SoundKind::Hover,
        SoundKind::Transition,
        SoundKind::Success,
        SoundKind::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundKind::Click => "click",
            SoundKind::Hover => "hover",
            SoundKind::Transition => "transition",
            SoundKind::Success => "success",
            SoundKind::Error => "error",
        }
    }

    /// Fixed tone parameters for this sound.
    pub fn config(self) -> SoundConfig {
        let (frequency, millis, waveform, volume) = match self {
            SoundKind::Click => (800.0, 50, Waveform::Sine, 0.15),
            SoundKind::Hover => (1200.0, 30, Waveform::Sine, 0.08),
            SoundKind::Transition => (600.0, 200, Waveform::Sine, 0.1),
            SoundKind::Success => (1000.0, 150, Waveform::Triangle, 0.12),
            SoundKind::Error => (400.0, 100, Waveform::Sawtooth, 0.15),
        };
        SoundConfig {
            frequency,
            duration: Duration::from_millis(millis),
            waveform,
            volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Value of a unit-amplitude cycle at `phase` in [0, 1).
    pub fn sample(self, phase: f64) -> f64 {
        let phase = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase + 0.5).rem_euclid(1.0) - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundConfig {
    pub frequency: f32,
    pub duration: Duration,
    pub waveform: Waveform,
    pub volume: f32,
}

/// One oscillator voice with its envelope pinned to the audio clock.
///
/// All timestamps are audio-clock seconds. The gain rises linearly from
/// zero to `peak` between `start_at` and `attack_end`, then falls linearly
/// back to zero at `stop_at`, where the oscillator stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTone {
    pub kind: SoundKind,
    pub waveform: Waveform,
    pub frequency: f32,
    pub peak: f32,
    pub start_at: f64,
    pub attack_end: f64,
    pub stop_at: f64,
}

impl ScheduledTone {
    /// Pins `kind` to start at audio time `start_at`.
    pub fn new(kind: SoundKind, start_at: f64, attack: Duration) -> Self {
        let config = kind.config();
        let length = config.duration.as_secs_f64();
        let attack = attack.as_secs_f64().min(length);
        Self {
            kind,
            waveform: config.waveform,
            frequency: config.frequency,
            peak: config.volume,
            start_at,
            attack_end: start_at + attack,
            stop_at: start_at + length,
        }
    }

    pub fn length(&self) -> f64 {
        self.stop_at - self.start_at
    }

    pub fn gain_at(&self, time: f64) -> f32 {
        let peak = f64::from(self.peak);
        let gain = if time < self.start_at || time >= self.stop_at {
            0.0
        } else if time < self.attack_end {
            peak * (time - self.start_at) / (self.attack_end - self.start_at)
        } else {
            let release = self.stop_at - self.attack_end;
            if release <= 0.0 {
                0.0
            } else {
                peak * (self.stop_at - time) / release
            }
        };
        gain as f32
    }

    pub fn sample_at(&self, time: f64) -> f32 {
        let phase = f64::from(self.frequency) * (time - self.start_at);
        self.gain_at(time) * self.waveform.sample(phase) as f32
    }

    /// Renders the voice from `start_at` to `stop_at` as mono PCM.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = f64::from(sample_rate.max(1));
        let count = (self.length() * rate).round() as usize;
        (0..count)
            .map(|i| self.sample_at(self.start_at + i as f64 / rate))
            .collect()
    }
}
