//! Pitch-preserving time stretch and duration-preserving pitch shift.

pub mod phase_vocoder;
pub mod pitch;

pub use phase_vocoder::{time_stretch, PhaseVocoder};
pub use pitch::{pitch_shift, semitones_to_ratio};
