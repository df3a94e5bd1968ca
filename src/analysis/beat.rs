//! Tempo estimation from the onset strength envelope.
//!
//! The envelope is autocorrelated over the lags that correspond to the
//! allowed tempo range and each lag is weighted by a log-normal prior
//! centered on 120 BPM, one octave wide, so that octave errors resolve
//! towards common dance tempos.

use crate::analysis::transient::onset_envelope;
use crate::core::config::EngineConfig;

/// FFT size for onset analysis.
const BEAT_FFT_SIZE: usize = 2048;
/// Hop size for onset analysis frames.
const BEAT_HOP_SIZE: usize = 512;
/// Center of the tempo prior in BPM.
const PRIOR_CENTER_BPM: f64 = 120.0;
/// Width of the tempo prior in octaves.
const PRIOR_WIDTH_OCTAVES: f64 = 1.0;

/// Estimates the tempo of a mono signal in BPM, searching `[min_bpm, max_bpm]`.
///
/// Returns 0.0 when no tempo can be detected (input shorter than one analysis
/// window, silence, or no periodic onsets).
pub fn detect_bpm(samples: &[f32], sample_rate: u32, min_bpm: f64, max_bpm: f64) -> f64 {
    let envelope = onset_envelope(samples, sample_rate, BEAT_FFT_SIZE, BEAT_HOP_SIZE);
    let frame_rate = sample_rate as f64 / BEAT_HOP_SIZE as f64;
    bpm_from_envelope(&envelope, frame_rate, min_bpm, max_bpm)
}

/// Estimates the tempo of `samples` (recorded at `sample_rate`) and clamps it
/// into the config's tempo range.
///
/// Undetectable input clamps to `min_bpm`.
pub fn estimate_tempo(samples: &[f32], sample_rate: u32, config: &EngineConfig) -> f64 {
    let raw = detect_bpm(samples, sample_rate, config.min_bpm, config.max_bpm);
    raw.clamp(config.min_bpm, config.max_bpm)
}

/// Samples per beat at the given tempo: `round(sr * 60 / bpm)`.
#[inline]
pub fn beat_samples(sample_rate: u32, bpm: f64) -> usize {
    if bpm <= 0.0 {
        return 0;
    }
    (sample_rate as f64 * 60.0 / bpm).round() as usize
}

/// Bar-quantization grid derived from one tempo estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatGrid {
    /// Clamped tempo in BPM.
    pub bpm: f64,
    pub sample_rate: u32,
    pub beats_per_bar: usize,
    /// `round(sample_rate * 60 / bpm)`.
    pub beat_samples: usize,
    /// `beat_samples * beats_per_bar`.
    pub bar_samples: usize,
}

impl BeatGrid {
    pub fn new(sample_rate: u32, bpm: f64, beats_per_bar: usize) -> Self {
        let beat_samples = beat_samples(sample_rate, bpm);
        Self {
            bpm,
            sample_rate,
            beats_per_bar,
            beat_samples,
            bar_samples: beat_samples * beats_per_bar,
        }
    }

    /// Grid at the clamped tempo of `samples`; see [`estimate_tempo`].
    pub fn estimate(samples: &[f32], sample_rate: u32, config: &EngineConfig) -> Self {
        let bpm = estimate_tempo(samples, sample_rate, config);
        Self::new(sample_rate, bpm, config.beats_per_bar)
    }

    /// Start sample of bar `index`.
    #[inline]
    pub fn bar_start(&self, index: usize) -> usize {
        index * self.bar_samples
    }

    /// Bar length in seconds.
    #[inline]
    pub fn bar_secs(&self) -> f64 {
        self.bar_samples as f64 / self.sample_rate as f64
    }
}

fn bpm_from_envelope(envelope: &[f32], frame_rate: f64, min_bpm: f64, max_bpm: f64) -> f64 {
    if envelope.len() < 4 || min_bpm <= 0.0 || max_bpm < min_bpm {
        return 0.0;
    }

    let n = envelope.len();
    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let centered: Vec<f64> = envelope.iter().map(|&v| v as f64 - mean).collect();
    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= f64::EPSILON {
        return 0.0;
    }

    let min_lag = ((60.0 * frame_rate / max_bpm).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / min_bpm).ceil() as usize).min(n - 2);
    if min_lag >= max_lag {
        return 0.0;
    }

    // One extra lag on each side for peak interpolation.
    let lo = min_lag.saturating_sub(1).max(1);
    let hi = (max_lag + 1).min(n - 1);
    let acf: Vec<f64> = (lo..=hi)
        .map(|lag| {
            centered[..n - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / energy
        })
        .collect();
    let acf_at = |lag: usize| acf[lag - lo];

    let mut best_lag = 0usize;
    let mut best_score = 0.0f64;
    for lag in min_lag..=max_lag {
        let value = acf_at(lag);
        if value <= 0.0 {
            continue;
        }
        let bpm = 60.0 * frame_rate / lag as f64;
        let score = value * tempo_prior(bpm);
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return 0.0;
    }

    // Parabolic refinement of the peak position.
    let mut lag = best_lag as f64;
    if best_lag > lo && best_lag < hi {
        let (a, b, c) = (acf_at(best_lag - 1), acf_at(best_lag), acf_at(best_lag + 1));
        let denom = a - 2.0 * b + c;
        if denom.abs() > f64::EPSILON {
            let offset = 0.5 * (a - c) / denom;
            if offset.abs() < 1.0 {
                lag += offset;
            }
        }
    }

    60.0 * frame_rate / lag
}

#[inline]
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_WIDTH_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}
