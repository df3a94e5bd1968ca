//! Error types for the freemix crate.

use thiserror::Error;

/// Errors reported by the remix engine and its I/O collaborators.
///
/// Expected conditions inside the core (silent stems, absent configs, a
/// missing drums stem) never surface here; they degrade to silence or
/// defaults instead.
#[derive(Debug, Error)]
pub enum FreemixError {
    /// `separate` was requested before any audio was loaded.
    #[error("no audio loaded: call load() before separate()")]
    NotLoaded,
    /// `remix` or `freestyle` was requested before a stem set exists.
    #[error("no stems available: call separate() before remixing")]
    NotSeparated,
    /// A spectrogram frame does not match the transform's bin count.
    #[error("spectrogram shape mismatch: expected {expected} bins per frame, found {found}")]
    SpectrogramShape { expected: usize, found: usize },
    /// Engine configuration is unusable (zero FFT size, hop larger than window, ...).
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    /// WAV decode/encode failure.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    /// Unsupported audio layout in an otherwise valid file.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Manifest or remix config (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FreemixError>;
