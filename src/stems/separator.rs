//! Model-free four-stem separation.
//!
//! HPSS splits the magnitude spectrogram into harmonic, percussive and
//! residual parts; static frequency masks then carve bass and vocals out of
//! the harmonic part. Every stem is rebuilt with the mixture's phase.

use rustfft::num_complex::Complex;
use tracing::{debug, warn};

use crate::analysis::hpss::{hpss, HpssParams};
use crate::analysis::stft::Stft;
use crate::core::config::{EngineConfig, FrequencyBand};
use crate::core::gain::{normalize_peak, peak};
use crate::core::types::{Signal, StemName, StemSet};
use crate::error::Result;

/// Guards the Wiener-style division on silent cells.
const MASK_EPSILON: f32 = 1e-8;

/// Per-bin weight in [0, 1], constant across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMask {
    weights: Vec<f32>,
}

impl FrequencyMask {
    /// 1.0 for bins whose center frequency lies inside `band` (bounds
    /// inclusive), 0.0 elsewhere.
    pub fn band(band: FrequencyBand, fft_size: usize, sample_rate: u32) -> Self {
        let num_bins = fft_size / 2 + 1;
        let bin_hz = sample_rate as f32 / fft_size as f32;
        let weights = (0..num_bins)
            .map(|bin| if band.contains(bin as f32 * bin_hz) { 1.0 } else { 0.0 })
            .collect();
        Self { weights }
    }

    /// All-pass mask.
    pub fn full(num_bins: usize) -> Self {
        Self {
            weights: vec![1.0; num_bins],
        }
    }

    #[inline]
    pub fn weight(&self, bin: usize) -> f32 {
        self.weights[bin]
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.weights.len()
    }

    /// Number of bins with a non-zero weight.
    pub fn pass_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0.0).count()
    }
}

/// Splits a mono mixture into vocals, drums, bass and other.
#[derive(Debug, Clone)]
pub struct StemSeparator {
    config: EngineConfig,
    stft: Stft,
    hpss_params: HpssParams,
}

impl StemSeparator {
    /// # Errors
    ///
    /// Returns [`crate::FreemixError::InvalidConfig`] for unusable FFT geometry.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let stft = Stft::new(&config)?;
        let hpss_params = HpssParams::from_config(&config);
        Ok(Self {
            config,
            stft,
            hpss_params,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Separates `signal` into the four stems, each peak-normalized to
    /// `stem_peak` unless silent.
    pub fn separate(&self, signal: &Signal) -> StemSet {
        if signal.sample_rate != self.config.sample_rate {
            warn!(
                signal_rate = signal.sample_rate,
                config_rate = self.config.sample_rate,
                "separating at a rate other than the configured one; masks follow the signal"
            );
        }

        let spec = self.stft.forward(&signal.samples);
        let (magnitudes, phases) = spec.magnitude_phase();
        let parts = hpss(&magnitudes, &self.hpss_params);
        debug!(
            frames = spec.num_frames(),
            bins = spec.num_bins(),
            margin = self.hpss_params.margin,
            "hpss complete"
        );

        let fft_size = self.stft.fft_size();
        let full = FrequencyMask::full(self.stft.num_bins());
        let bass_mask = FrequencyMask::band(self.config.bass_band, fft_size, signal.sample_rate);
        let vocal_mask = FrequencyMask::band(self.config.vocal_band, fft_size, signal.sample_rate);

        let plan: [(StemName, &[Vec<f32>], &FrequencyMask); 4] = [
            (StemName::Vocals, parts.harmonic.as_slice(), &vocal_mask),
            (StemName::Drums, parts.percussive.as_slice(), &full),
            (StemName::Bass, parts.harmonic.as_slice(), &bass_mask),
            (StemName::Other, parts.residual.as_slice(), &full),
        ];

        let mut stems = StemSet::new(signal.sample_rate);
        for (name, source, mask) in plan {
            let frames = soft_mask_frames(source, &magnitudes, &phases, mask);
            let mut samples = self.stft.overlap_add(&frames, signal.len());
            let raw_peak = peak(&samples);
            normalize_peak(&mut samples, self.config.stem_peak, self.config.silence_floor);
            debug!(stem = %name, raw_peak, "stem reconstructed");
            stems.insert(name, samples);
        }
        stems
    }
}

/// `(source · mask)² / (total + ε)` per cell, carried on the mixture phase.
fn soft_mask_frames(
    source: &[Vec<f32>],
    total: &[Vec<f32>],
    phases: &[Vec<f32>],
    mask: &FrequencyMask,
) -> Vec<Vec<Complex<f32>>> {
    source
        .iter()
        .zip(total)
        .zip(phases)
        .map(|((src_row, mag_row), phase_row)| {
            src_row
                .iter()
                .zip(mag_row)
                .zip(phase_row)
                .enumerate()
                .map(|(bin, ((&src, &mag), &phase))| {
                    let masked = src * mask.weight(bin);
                    let soft = masked * masked / (mag + MASK_EPSILON);
                    Complex::from_polar(soft, phase)
                })
                .collect()
        })
        .collect()
}
