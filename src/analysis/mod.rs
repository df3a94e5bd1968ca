//! Spectral analysis: STFT, harmonic/percussive decomposition, onset strength
//! and tempo estimation.

pub mod beat;
pub mod hpss;
pub mod stft;
pub mod transient;

pub use beat::{beat_samples, detect_bpm, estimate_tempo, BeatGrid};
pub use hpss::{hpss, HpssComponents, HpssParams};
pub use stft::{Spectrogram, Stft};
