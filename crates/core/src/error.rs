/// Result alias that carries the custom [`ShowcaseError`] type.
pub type Result<T> = std::result::Result<T, ShowcaseError>;

/// Common error type for the core crate.
///
/// The state machines in this crate absorb these errors at their public
/// boundary; the type surfaces only through configuration loading, raw
/// key-value stores, platform backends and offline analysis.
#[derive(Debug, thiserror::Error)]
pub enum ShowcaseError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialisation failure.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Key-value storage rejected a read or write.
    #[error("storage: {0}")]
    Storage(String),
    /// Media or tone playback failure.
    #[error("playback: {0}")]
    Playback(#[from] PlaybackError),
    /// Caller supplied an argument outside the accepted domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// FFT planning or processing failed.
    #[error("fft: {0}")]
    Fft(String),
}

/// Failures raised by an audio backend while starting or driving playback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("playback was blocked by the autoplay policy")]
    AutoplayBlocked,
    #[error("could not decode `{0}`")]
    Decode(String),
    #[error("no media found at `{0}`")]
    MissingSource(String),
    #[error("audio context is closed")]
    ContextClosed,
    #[error("audio graph has not been initialised")]
    NotInitialized,
}

impl ShowcaseError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ShowcaseError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShowcaseError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<realfft::FftError> for ShowcaseError {
    fn from(value: realfft::FftError) -> Self {
        Self::Fft(value.to_string())
    }
}
