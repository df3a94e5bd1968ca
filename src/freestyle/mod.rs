//! Freestyle mode: seeded, bar-quantized remix variations.

pub mod edits;
pub mod generator;
pub mod mutation;

use serde::{Deserialize, Serialize};

pub use edits::SampleEdit;
pub use generator::FreestyleGenerator;
pub use mutation::{Mutation, MutationKind};

/// One rendered variation, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// 1-based ordinal.
    pub variation: usize,
    /// Tempo the variation was quantized to, rounded to 0.1 BPM.
    pub bpm: f64,
    pub bars: usize,
    pub mutation: Mutation,
    /// Rendered length in seconds, rounded to milliseconds.
    pub duration_s: f64,
}
