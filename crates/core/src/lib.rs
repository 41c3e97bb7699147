//! Interaction core for the portfolio showcase.
//!
//! Every component is a state machine driven by a caller-supplied virtual
//! clock (`now: Duration`). Platform resources sit behind small traits
//! ([`AudioBackend`], [`ToneOutput`], [`KeyValueStore`]) so the same logic
//! runs against real devices or the in-process implementations shipped
//! here.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod cursor;
pub mod effects;
pub mod error;
pub mod hero;
pub mod platform;
pub mod prefs;
pub mod scroll;
pub mod timeline;
pub mod toast;

pub use analysis::{analyse_tone, ToneAnalysis, ToneAnalyzer};
pub use audio::{
    AudioBackend, AudioEngine, ContextState, MediaEvent, PlaybackState, SimulatedBackend, Track,
};
pub use config::AppConfig;
pub use cursor::{
    CursorHandle, CursorPreset, CursorState, CursorTracker, CursorType, Follower, MagneticField,
    SpringConfig,
};
pub use effects::{ScheduledTone, SoundEffects, SoundKind, ToneOutput, ToneRecorder, Waveform};
pub use error::{PlaybackError, Result, ShowcaseError};
pub use hero::{HeroRotation, HeroRotationState, RotationMode};
pub use platform::{PlatformSignals, TouchCapability};
pub use prefs::{FileStore, KeyValueStore, MemoryStore, MusicPreferences, PreferenceStore};
pub use scroll::{
    Rect, RootMargin, ScrollDirection, ScrollTracker, SectionBounds, SectionMeta, SectionObserver,
    Viewport,
};
pub use timeline::{PlaybackClock, Timer};
pub use toast::{Toast, ToastId, ToastKind, ToastQueue};
