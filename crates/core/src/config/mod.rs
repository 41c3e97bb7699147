use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
///
/// Every section falls back to its defaults when omitted, so a partial JSON
/// document only needs to name the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub effects: EffectsConfig,
    pub hero: HeroConfig,
    pub cursor: CursorConfig,
    pub scroll: ScrollConfig,
    pub preferences: PreferencesConfig,
    pub toasts: ToastConfig,
}

impl AppConfig {
    /// Parses a configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Transport and fade timings for the music player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub fade_ms: u64,
    pub fade_steps: u32,
    pub mute_fade_ms: u64,
    pub settle_ms: u64,
    pub default_volume: f32,
    pub default_muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fade_ms: 1000,
            fade_steps: 60,
            mute_fade_ms: 300,
            settle_ms: 100,
            default_volume: 0.3,
            default_muted: true,
        }
    }
}

impl AudioConfig {
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn mute_fade(&self) -> Duration {
        Duration::from_millis(self.mute_fade_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Sound-effect synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub throttle_ms: u64,
    pub attack_ms: u64,
    /// Only used when tones are rendered offline.
    pub sample_rate: u32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 100,
            attack_ms: 10,
            sample_rate: 48_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub interval_ms: u64,
    pub cooldown_ms: u64,
    pub pause_on_interaction: bool,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            cooldown_ms: 10_000,
            pause_on_interaction: true,
        }
    }
}

impl HeroConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Sampling period standing in for the display refresh.
    pub frame_interval_ms: u64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

impl CursorConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub threshold: f32,
    pub root_margin: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: "-10% 0px -80% 0px".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub storage_key: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            storage_key: "portfolio_music_preferences".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub default_duration_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let config =
            AppConfig::from_json_str(r#"{ "hero": { "interval_ms": 2500 } }"#).unwrap();

        assert_eq!(config.hero.interval(), Duration::from_millis(2500));
        assert_eq!(config.hero.cooldown(), Duration::from_secs(10));
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.scroll.root_margin, "-10% 0px -80% 0px");
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(AppConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn frame_interval_never_collapses_to_zero() {
        let config = CursorConfig {
            frame_interval_ms: 0,
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(1));
    }
}
