//! Durable music preferences behind a string key-value store.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config::AudioConfig, Result, ShowcaseError};

/// Minimal string store in the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, mostly useful for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes whose value is longer than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(ShowcaseError::Storage(format!(
                    "quota of {quota} bytes exceeded writing `{key}`"
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object file, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Persisted subset of the playback state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicPreferences {
    pub volume: f32,
    pub is_muted: bool,
    pub current_track_index: usize,
}

impl Default for MusicPreferences {
    fn default() -> Self {
        Self::from_audio_config(&AudioConfig::default())
    }
}

impl MusicPreferences {
    pub fn from_audio_config(config: &AudioConfig) -> Self {
        Self {
            volume: config.default_volume.clamp(0.0, 1.0),
            is_muted: config.default_muted,
            current_track_index: 0,
        }
    }

    /// Reads each field independently, keeping `defaults` for anything
    /// missing or of the wrong type.
    fn merge_json(defaults: Self, value: &Value) -> Self {
        let volume = value
            .get("volume")
            .and_then(Value::as_f64)
            .filter(|volume| volume.is_finite())
            .map(|volume| (volume as f32).clamp(0.0, 1.0))
            .unwrap_or(defaults.volume);
        let is_muted = value
            .get("isMuted")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.is_muted);
        let current_track_index = value
            .get("currentTrackIndex")
            .and_then(Value::as_u64)
            .and_then(|index| usize::try_from(index).ok())
            .unwrap_or(defaults.current_track_index);

        Self {
            volume,
            is_muted,
            current_track_index,
        }
    }
}

/// Loads and saves [`MusicPreferences`] under one namespaced key.
///
/// Neither operation fails: storage problems are logged and the caller
/// carries on with defaults or unsaved state.
pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    key: String,
    defaults: MusicPreferences,
}

impl PreferenceStore {
    pub fn new(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            key: key.into(),
            defaults: MusicPreferences::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: MusicPreferences) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn defaults(&self) -> MusicPreferences {
        self.defaults
    }

    pub fn load(&self) -> MusicPreferences {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no stored music preferences; using defaults");
                return self.defaults;
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to read music preferences");
                return self.defaults;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if value.is_object() => MusicPreferences::merge_json(self.defaults, &value),
            Ok(_) => {
                tracing::warn!(key = %self.key, "stored music preferences are not an object");
                self.defaults
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to parse music preferences");
                self.defaults
            }
        }
    }

    /// Writes `prefs`, returning whether the store accepted them. Failures
    /// are logged and never propagated.
    pub fn save(&mut self, prefs: &MusicPreferences) -> bool {
        match self.try_save(prefs) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to save music preferences");
                false
            }
        }
    }

    /// Removes the stored entry; subsequent loads return the defaults.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(&self.key)
    }

    fn try_save(&mut self, prefs: &MusicPreferences) -> Result<()> {
        let raw = serde_json::to_string(prefs)?;
        self.store.set(&self.key, &raw)
    }
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("key", &self.key)
            .field("defaults", &self.defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "portfolio_music_preferences";

    fn seeded(raw: &str) -> PreferenceStore {
        let mut store = MemoryStore::new();
        store.set(KEY, raw).unwrap();
        PreferenceStore::new(store, KEY)
    }

    #[test]
    fn empty_store_returns_defaults() {
        let prefs = PreferenceStore::new(MemoryStore::new(), KEY).load();
        assert_eq!(prefs, MusicPreferences::default());
        assert_eq!(prefs.volume, 0.3);
        assert!(prefs.is_muted);
        assert_eq!(prefs.current_track_index, 0);
    }

    #[test]
    fn saved_preferences_load_back() {
        let mut store = PreferenceStore::new(MemoryStore::new(), KEY);
        let saved = MusicPreferences {
            volume: 0.4,
            is_muted: true,
            current_track_index: 1,
        };
        assert!(store.save(&saved));
        assert_eq!(store.load(), saved);
    }

    #[test]
    fn serialises_with_camel_case_fields() {
        let raw = serde_json::to_string(&MusicPreferences {
            volume: 0.5,
            is_muted: false,
            current_track_index: 2,
        })
        .unwrap();
        assert!(raw.contains("\"isMuted\":false"));
        assert!(raw.contains("\"currentTrackIndex\":2"));
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        assert_eq!(seeded("{ volume: ").load(), MusicPreferences::default());
        assert_eq!(seeded("[1, 2]").load(), MusicPreferences::default());
    }

    #[test]
    fn partial_fields_fall_back_individually() {
        let prefs = seeded(r#"{ "volume": 0.8, "isMuted": "yes" }"#).load();
        assert_eq!(prefs.volume, 0.8);
        assert!(prefs.is_muted);
        assert_eq!(prefs.current_track_index, 0);
    }

    #[test]
    fn out_of_range_volume_is_clamped_on_load() {
        assert_eq!(seeded(r#"{ "volume": 4.2 }"#).load().volume, 1.0);
        assert_eq!(seeded(r#"{ "volume": -1 }"#).load().volume, 0.0);
    }

    #[test]
    fn quota_failures_are_swallowed() {
        let mut store = PreferenceStore::new(MemoryStore::with_quota(4), KEY);
        assert!(!store.save(&MusicPreferences::default()));
        assert_eq!(store.load(), MusicPreferences::default());
    }

    #[test]
    fn file_store_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let saved = MusicPreferences {
            volume: 0.65,
            is_muted: false,
            current_track_index: 1,
        };
        PreferenceStore::new(FileStore::new(&path), KEY).save(&saved);

        let reopened = PreferenceStore::new(FileStore::new(&path), KEY);
        assert_eq!(reopened.load(), saved);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("storage.json"));
        store.set("theme", "dark").unwrap();
        store.set(KEY, "{}").unwrap();
        store.remove(KEY).unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_file_store_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let prefs = PreferenceStore::new(FileStore::new(&path), KEY).load();
        assert_eq!(prefs, MusicPreferences::default());
    }
}
