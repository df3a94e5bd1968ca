#![forbid(unsafe_code)]
//! Model-free stem separation and freestyle remixing.
//!
//! `freemix` splits a mixed-down mono track into four stems (vocals, drums,
//! bass, other) with median-filter harmonic/percussive separation and
//! frequency-band soft masks, re-renders the stems under per-stem volume,
//! pitch, stretch and mute settings, and generates seeded, bar-locked remix
//! variations ("freestyle") with a manifest describing each one.
//!
//! # Quick Start
//!
//! ```
//! use freemix::{RemixConfig, Signal, StemConfig, StemName};
//!
//! // 1 second of 220 Hz sine at 44.1 kHz
//! let input: Vec<f32> = (0..44100)
//!     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin() * 0.5)
//!     .collect();
//!
//! let stems = freemix::separate(&Signal::new(input, 44100)).unwrap();
//! assert_eq!(stems.len(), 4);
//!
//! let config = RemixConfig::new()
//!     .with(StemName::Drums, StemConfig::default().with_mute(true))
//!     .with(StemName::Bass, StemConfig::default().with_volume(1.5));
//! let mix = freemix::remix(&stems, &config).unwrap();
//! assert!(mix.iter().all(|s| s.abs() <= 0.95 + 1e-6));
//! ```
//!
//! # Freestyle
//!
//! ```no_run
//! use freemix::{session::FreeMix, EngineConfig};
//!
//! let mut fm = FreeMix::new(EngineConfig::default()).unwrap();
//! fm.load("track.wav").unwrap();
//! fm.separate().unwrap();
//! let manifest = fm.freestyle_to_dir("out/", 8, 4, 42).unwrap();
//! println!("{} variations", manifest.variations.len());
//! ```

pub mod analysis;
pub mod core;
pub mod error;
pub mod freestyle;
pub mod io;
pub mod manifest;
pub mod remix;
pub mod session;
pub mod stems;
pub mod stretch;

pub use analysis::beat::BeatGrid;
pub use core::config::{EngineConfig, FrequencyBand};
pub use core::types::{RemixConfig, Sample, Signal, StemConfig, StemName, StemSet};
pub use error::{FreemixError, Result};
pub use freestyle::{FreestyleGenerator, Mutation, MutationKind, Variation};
pub use manifest::Manifest;
pub use remix::{RemixEngine, StemProcessor};
pub use stems::{FrequencyMask, StemSeparator};

/// Separates a signal into four stems with the default engine config.
pub fn separate(signal: &Signal) -> Result<StemSet> {
    separate_with_config(signal, &EngineConfig::default())
}

/// Separates a signal into four stems.
///
/// # Errors
///
/// Returns [`FreemixError::InvalidConfig`] if the config's FFT geometry is
/// unusable.
pub fn separate_with_config(signal: &Signal, config: &EngineConfig) -> Result<StemSet> {
    let separator = StemSeparator::new(config.clone())?;
    Ok(separator.separate(signal))
}

/// Renders one remix of `stems` under `config`, normalized to a 0.95 peak.
///
/// Missing stems are silent and missing configs are the default.
pub fn remix(stems: &StemSet, config: &RemixConfig) -> Result<Vec<Sample>> {
    RemixEngine::default().remix(stems, config)
}

/// Generates `n_variations` seeded variations of `bars_per_variation` bars.
///
/// The same stems and seed always produce the same samples and mutations.
///
/// # Example
///
/// ```
/// use freemix::{StemName, StemSet};
///
/// let stems = StemSet::new(44100).with_stem(StemName::Other, vec![0.1; 44100]);
/// let (mix, variations) = freemix::freestyle(&stems, 2, 1, 42).unwrap();
/// assert_eq!(variations.len(), 2);
/// assert_eq!(mix.len(), 2 * 4 * 44100); // silent drums clamp to 60 BPM
/// ```
pub fn freestyle(
    stems: &StemSet,
    n_variations: usize,
    bars_per_variation: usize,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Variation>)> {
    let config = EngineConfig::default().with_sample_rate(stems.sample_rate);
    FreestyleGenerator::with_seed(config, seed).generate(stems, n_variations, bars_per_variation)
}
