use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use showcase_core::{
    analyse_tone, AppConfig, AudioEngine, CursorTracker, CursorType, FileStore, Follower,
    HeroRotation, KeyValueStore, MagneticField, MemoryStore, MusicPreferences, PlatformSignals,
    PlaybackClock, PreferenceStore, Rect, ScrollTracker, SectionBounds, SectionMeta,
    SectionObserver, SimulatedBackend, SoundEffects, SoundKind, SpringConfig, ToastKind,
    ToastQueue, ToneRecorder, TouchCapability, Track, Viewport,
};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const SESSION: Duration = Duration::from_secs(24);
const HERO_VARIANTS: usize = 4;
const SECTION_HEIGHT: f32 = 900.0;
const SCROLL_SPEED: f32 = 220.0;

fn main() -> showcase_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            config,
            prefs,
            reduced_motion,
            touch,
        } => {
            let config = load_config(config.as_ref())?;
            let signals = PlatformSignals::new(reduced_motion, TouchCapability::detect(touch, 0));
            run_demo(&config, prefs, signals)
        }
        Commands::Tones { config } => run_tones(&load_config(config.as_ref())?),
        Commands::Prefs { action } => run_prefs(action),
    }
}

fn load_config(path: Option<&PathBuf>) -> showcase_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn preference_store(config: &AppConfig, path: Option<PathBuf>) -> PreferenceStore {
    let key = config.preferences.storage_key.clone();
    let store = match path {
        Some(path) => PreferenceStore::new(FileStore::new(path), key),
        None => PreferenceStore::new(MemoryStore::new(), key),
    };
    store.with_defaults(MusicPreferences::from_audio_config(&config.audio))
}

/// Scripted interactions applied when the virtual clock reaches them.
#[derive(Debug, Clone, Copy)]
enum Step {
    Play,
    Hover(CursorType),
    Leave,
    PickVariant(usize),
    Unmute,
    NextTrack,
    Volume(f32),
    Toast(ToastKind),
    Touch,
    Pause,
}

fn script() -> Vec<(Duration, Step)> {
    let at = Duration::from_millis;
    vec![
        (at(400), Step::Play),
        (at(1_200), Step::Hover(CursorType::Button)),
        (at(1_250), Step::Hover(CursorType::Button)),
        (at(1_800), Step::Leave),
        (at(2_000), Step::Unmute),
        (at(3_500), Step::PickVariant(2)),
        (at(6_000), Step::Volume(0.6)),
        (at(8_000), Step::NextTrack),
        (at(8_040), Step::NextTrack),
        (at(11_000), Step::Hover(CursorType::Link)),
        (at(12_000), Step::Toast(ToastKind::Success)),
        (at(15_000), Step::Leave),
        (at(18_000), Step::Touch),
        (at(21_000), Step::Pause),
    ]
}

fn run_demo(
    config: &AppConfig,
    prefs: Option<PathBuf>,
    signals: PlatformSignals,
) -> showcase_core::Result<()> {
    tracing::info!(
        reduced_motion = signals.reduced_motion,
        touch = signals.touch.is_touch(),
        "starting demo session"
    );

    let mut clock = PlaybackClock::new();
    let tracks = Track::default_playlist();
    let library: Vec<(String, f64)> = tracks
        .iter()
        .zip([9.0, 30.0])
        .map(|(track, seconds)| (track.url.clone(), seconds))
        .collect();

    let mut audio = AudioEngine::new(tracks, config.audio.clone(), move || {
        Ok(library
            .iter()
            .fold(SimulatedBackend::new(), |backend, (url, seconds)| {
                backend.with_track(url.clone(), *seconds)
            }))
    })
    .with_preferences(preference_store(config, prefs));

    let mut effects = SoundEffects::new(ToneRecorder::new(), &config.effects);
    let mut hero = HeroRotation::new(HERO_VARIANTS, &config.hero, clock.now())
        .with_reduced_motion(signals.reduced_motion, clock.now());
    let mut cursor = CursorTracker::new(&config.cursor, signals.touch);
    let cursor_view = cursor.handle();
    let mut dot =
        Follower::new(SpringConfig::CURSOR_DOT).with_reduced_motion(signals.reduced_motion);
    let mut glow =
        Follower::new(SpringConfig::CURSOR_GLOW).with_reduced_motion(signals.reduced_motion);
    let magnet = MagneticField::default();
    let mut toasts = ToastQueue::new(&config.toasts);
    let mut scroll = ScrollTracker::new();

    let meta = SectionMeta::default_sections();
    let mut sections = SectionObserver::from_config(&config.scroll)?;
    sections.observe(meta.iter().enumerate().map(|(i, section)| {
        SectionBounds::new(
            section.id.clone(),
            Rect::new(0.0, i as f32 * SECTION_HEIGHT, 1280.0, SECTION_HEIGHT),
        )
    }));

    let mut pending = script().into_iter().peekable();
    let mut last_variant = hero.current_variant();

    while clock.now() < SESSION {
        let now = clock.advance(FRAME);

        while let Some((_, step)) = pending.next_if(|(at, _)| *at <= now) {
            apply_step(step, now, &mut audio, &mut effects, &mut hero, &mut cursor, &mut toasts);
        }

        let t = now.as_secs_f32();
        cursor.pointer_moved(640.0 + 300.0 * (t * 0.8).sin(), 360.0 + 120.0 * t.cos(), now);
        if cursor.tick(now) {
            let state = cursor_view.snapshot()?;
            dot.follow(&state, FRAME);
            glow.follow(&state, FRAME);
        }

        audio.tick(now);
        toasts.tick(now);
        if hero.tick(now) || hero.current_variant() != last_variant {
            last_variant = hero.current_variant();
            tracing::info!(variant = last_variant, "hero variant shown");
        }

        let scroll_y = (t * SCROLL_SPEED).min(SECTION_HEIGHT * (meta.len() as f32 - 1.0));
        scroll.record(scroll_y);
        let viewport = Viewport::new(1280.0, SECTION_HEIGHT).scrolled_to(scroll_y);
        if let Some(active) = sections.update(&viewport) {
            let label = meta
                .iter()
                .find(|section| section.id == active)
                .map(|section| section.nav_label.as_str())
                .unwrap_or("?");
            tracing::info!(section = %active, label, direction = ?scroll.direction(), "active section");
        }
    }

    let state = audio.state();
    let (dot_x, dot_y) = dot.position();
    let (glow_x, glow_y) = glow.position();
    let lean = magnet.offset(cursor_view.position()?, (640.0, 360.0), signals.reduced_motion);
    tracing::info!(
        track = %audio.current_track().title,
        playing = state.is_playing,
        volume = state.volume,
        muted = state.is_muted,
        position = state.current_time,
        "music state"
    );
    tracing::info!(dot_x, dot_y, glow_x, glow_y, lean_x = lean.0, lean_y = lean.1, "cursor followers");
    tracing::info!(
        tones = effects.output().scheduled().len(),
        toasts = toasts.toasts().len(),
        section = sections.active_section(),
        "demo session finished"
    );

    audio.shutdown();
    effects.shutdown();
    hero.shutdown();
    sections.disconnect();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_step(
    step: Step,
    now: Duration,
    audio: &mut AudioEngine<SimulatedBackend>,
    effects: &mut SoundEffects<ToneRecorder>,
    hero: &mut HeroRotation,
    cursor: &mut CursorTracker,
    toasts: &mut ToastQueue,
) {
    let muted = audio.state().is_muted;
    tracing::debug!(?step, at = ?now, "script step");
    match step {
        Step::Play => {
            effects.play(SoundKind::Click, now, muted);
            audio.play(now);
        }
        Step::Hover(kind) => {
            cursor.pointer_enter(kind, None);
            effects.play(SoundKind::Hover, now, muted);
        }
        Step::Leave => cursor.pointer_leave(),
        Step::PickVariant(index) => {
            hero.set_variant(index, now);
            effects.play(SoundKind::Transition, now, muted);
        }
        Step::Unmute => audio.toggle_mute(now),
        Step::NextTrack => {
            audio.next_track(now);
            tracing::info!(track = %audio.current_track().title, "track selected");
        }
        Step::Volume(volume) => audio.set_volume(volume),
        Step::Toast(kind) => {
            toasts.notify("Preferences saved", kind, now);
            effects.play(SoundKind::Success, now, muted);
        }
        Step::Touch => cursor.observe_touch(),
        Step::Pause => audio.pause(now),
    }
}

fn run_tones(config: &AppConfig) -> showcase_core::Result<()> {
    let attack = Duration::from_millis(config.effects.attack_ms);
    let rate = config.effects.sample_rate;
    tracing::info!(sample_rate = rate, "rendering interface tones");

    for kind in SoundKind::ALL {
        let preset = kind.config();
        let analysis = analyse_tone(kind, attack, rate)?;
        println!(
            "{:<10} {:>6.0} Hz {:>4} ms {:<8} peak {:.3} rms {:.3} dominant {:>7.1} Hz centroid {:>7.1} Hz",
            kind.name(),
            preset.frequency,
            preset.duration.as_millis(),
            format!("{:?}", preset.waveform).to_lowercase(),
            analysis.peak,
            analysis.rms,
            analysis.dominant_hz,
            analysis.spectral_centroid_hz,
        );
    }
    Ok(())
}

fn run_prefs(action: PrefsAction) -> showcase_core::Result<()> {
    match action {
        PrefsAction::Show { prefs, config } => {
            let config = load_config(config.as_ref())?;
            let store = FileStore::new(&prefs);
            match store.get(&config.preferences.storage_key)? {
                Some(raw) => tracing::debug!(%raw, "stored preferences"),
                None => tracing::info!(?prefs, "no stored preferences; showing defaults"),
            }
            let loaded = preference_store(&config, Some(prefs)).load();
            println!(
                "volume {:.2} muted {} track {}",
                loaded.volume, loaded.is_muted, loaded.current_track_index
            );
            Ok(())
        }
        PrefsAction::Reset { prefs, config } => {
            let config = load_config(config.as_ref())?;
            preference_store(&config, Some(prefs.clone())).clear()?;
            tracing::info!(?prefs, "music preferences cleared");
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Portfolio interaction core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted session over every component on virtual time.
    Demo {
        /// JSON configuration overriding the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// File used to persist music preferences. Kept in memory if omitted.
        #[arg(short, long)]
        prefs: Option<PathBuf>,
        /// Behave as if the platform asked for reduced motion.
        #[arg(long)]
        reduced_motion: bool,
        /// Behave as a touch device.
        #[arg(long)]
        touch: bool,
    },
    /// Render every interface tone offline and print its analysis.
    Tones {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Inspect or clear stored music preferences.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the preferences the music player would start with.
    Show {
        #[arg(short, long)]
        prefs: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Remove the stored preferences.
    Reset {
        #[arg(short, long)]
        prefs: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
