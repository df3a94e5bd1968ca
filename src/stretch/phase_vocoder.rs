//! Phase vocoder time stretching with identity phase locking.
//!
//! Synthesis frames sit on a fixed hop; analysis frames are read at
//! `k * hop / ratio` so the output is `ratio` times as long as the input.
//! Both sides are centered (half a window of padding up front), which keeps
//! input sample `n` aligned with output sample `n * ratio`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::core::config::EngineConfig;
use crate::core::fft::{normalize_by_window_sum, COMPLEX_ZERO};
use crate::core::window::{generate_window, WindowType};
use crate::error::{FreemixError, Result};

const TWO_PI: f32 = 2.0 * PI;

/// Phase vocoder state for time stretching.
pub struct PhaseVocoder {
    fft_size: usize,
    hop_synthesis: usize,
    stretch_ratio: f64,
    window: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    /// Phase accumulator for resynthesis.
    phase_accum: Vec<f32>,
    /// Previous analysis phase.
    prev_phase: Vec<f32>,
    /// Bin center frequencies in radians per sample.
    bin_omega: Vec<f32>,
    /// Reusable FFT buffer.
    fft_buffer: Vec<Complex<f32>>,
    /// Reusable magnitude buffer.
    magnitudes: Vec<f32>,
    /// Reusable analysis phase buffer.
    phases: Vec<f32>,
    /// Reusable peaks buffer for identity phase locking.
    peaks: Vec<usize>,
}

impl std::fmt::Debug for PhaseVocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseVocoder")
            .field("fft_size", &self.fft_size)
            .field("hop_synthesis", &self.hop_synthesis)
            .field("stretch_ratio", &self.stretch_ratio)
            .finish()
    }
}

impl PhaseVocoder {
    /// Creates a phase vocoder that lengthens its input by `stretch_ratio`.
    ///
    /// # Errors
    ///
    /// Returns [`FreemixError::InvalidConfig`] when the ratio is not a
    /// positive finite number, or the hop is zero or longer than the window.
    pub fn new(fft_size: usize, hop_synthesis: usize, stretch_ratio: f64) -> Result<Self> {
        if !(stretch_ratio.is_finite() && stretch_ratio > 0.0) {
            return Err(FreemixError::InvalidConfig(format!(
                "stretch ratio must be positive, got {}",
                stretch_ratio
            )));
        }
        if fft_size < 4 || hop_synthesis == 0 || hop_synthesis > fft_size {
            return Err(FreemixError::InvalidConfig(format!(
                "invalid phase vocoder geometry: fft_size={} hop={}",
                fft_size, hop_synthesis
            )));
        }

        let num_bins = fft_size / 2 + 1;
        let mut planner = FftPlanner::new();
        let bin_omega = (0..num_bins)
            .map(|bin| TWO_PI * bin as f32 / fft_size as f32)
            .collect();

        Ok(Self {
            fft_size,
            hop_synthesis,
            stretch_ratio,
            window: generate_window(WindowType::Hann, fft_size),
            fft_forward: planner.plan_fft_forward(fft_size),
            fft_inverse: planner.plan_fft_inverse(fft_size),
            phase_accum: vec![0.0; num_bins],
            prev_phase: vec![0.0; num_bins],
            bin_omega,
            fft_buffer: vec![COMPLEX_ZERO; fft_size],
            magnitudes: vec![0.0; num_bins],
            phases: vec![0.0; num_bins],
            peaks: Vec::with_capacity(num_bins / 4),
        })
    }

    /// Uses the engine's window and hop length.
    pub fn from_config(config: &EngineConfig, stretch_ratio: f64) -> Result<Self> {
        Self::new(config.fft_size, config.hop_size, stretch_ratio)
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn hop_synthesis(&self) -> usize {
        self.hop_synthesis
    }

    #[inline]
    pub fn stretch_ratio(&self) -> f64 {
        self.stretch_ratio
    }

    /// Output length for an input of `len` samples.
    #[inline]
    pub fn output_len(&self, len: usize) -> usize {
        (len as f64 * self.stretch_ratio).round() as usize
    }

    /// Stretches a mono signal; the result is exactly `output_len(input.len())` long.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let target_len = self.output_len(input.len());
        if input.is_empty() || target_len == 0 {
            return vec![0.0; target_len];
        }

        let pad = self.fft_size / 2;
        let num_bins = self.fft_size / 2 + 1;
        let hop_analysis = self.hop_synthesis as f64 / self.stretch_ratio;
        let num_frames = (target_len + pad).div_ceil(self.hop_synthesis) + 1;
        let last_pos = ((num_frames - 1) as f64 * hop_analysis).round() as usize;

        let mut padded = vec![0.0f32; (input.len() + self.fft_size).max(last_pos + self.fft_size)];
        padded[pad..pad + input.len()].copy_from_slice(input);

        let out_len = (num_frames - 1) * self.hop_synthesis + self.fft_size;
        let mut output = vec![0.0f32; out_len];
        let mut window_sum = vec![0.0f32; out_len];
        let norm = 1.0 / self.fft_size as f32;

        self.phase_accum.iter_mut().for_each(|x| *x = 0.0);
        self.prev_phase.iter_mut().for_each(|x| *x = 0.0);
        let mut prev_pos = 0usize;

        for frame_idx in 0..num_frames {
            let analysis_pos = (frame_idx as f64 * hop_analysis).round() as usize;
            let synthesis_pos = frame_idx * self.hop_synthesis;

            for (buf, (&s, &w)) in self
                .fft_buffer
                .iter_mut()
                .zip(padded[analysis_pos..analysis_pos + self.fft_size].iter().zip(&self.window))
            {
                *buf = Complex::new(s * w, 0.0);
            }
            self.fft_forward.process(&mut self.fft_buffer);

            for (bin, c) in self.fft_buffer[..num_bins].iter().enumerate() {
                self.magnitudes[bin] = c.norm();
                self.phases[bin] = c.arg();
            }

            if frame_idx == 0 {
                self.phase_accum.copy_from_slice(&self.phases);
            } else {
                self.advance_phases(analysis_pos - prev_pos);
                identity_phase_lock(&self.magnitudes, &self.phases, &mut self.phase_accum, &mut self.peaks);
            }
            self.prev_phase.copy_from_slice(&self.phases);
            prev_pos = analysis_pos;

            self.reconstruct_spectrum(num_bins);
            self.fft_inverse.process(&mut self.fft_buffer);

            for (i, &w) in self.window.iter().enumerate() {
                output[synthesis_pos + i] += self.fft_buffer[i].re * norm * w;
                window_sum[synthesis_pos + i] += w * w;
            }
        }

        normalize_by_window_sum(&mut output, &window_sum);

        let mut stretched: Vec<f32> = output.into_iter().skip(pad).take(target_len).collect();
        stretched.resize(target_len, 0.0);
        stretched
    }

    /// Advances every bin by its instantaneous frequency over one synthesis hop.
    fn advance_phases(&mut self, analysis_advance: usize) {
        let hop_s = self.hop_synthesis as f32;
        for bin in 0..self.phase_accum.len() {
            let omega = self.bin_omega[bin];
            let true_omega = if analysis_advance == 0 {
                omega
            } else {
                let a = analysis_advance as f32;
                let deviation = wrap_phase(self.phases[bin] - self.prev_phase[bin] - omega * a);
                omega + deviation / a
            };
            self.phase_accum[bin] = wrap_phase(self.phase_accum[bin] + true_omega * hop_s);
        }
    }

    /// Rebuilds the full complex spectrum from magnitudes and synthesis phases.
    fn reconstruct_spectrum(&mut self, num_bins: usize) {
        for bin in 0..num_bins {
            self.fft_buffer[bin] = Complex::from_polar(self.magnitudes[bin], self.phase_accum[bin]);
        }
        self.fft_buffer[0].im = 0.0;
        self.fft_buffer[num_bins - 1].im = 0.0;
        for bin in 1..num_bins - 1 {
            self.fft_buffer[self.fft_size - bin] = self.fft_buffer[bin].conj();
        }
    }
}

/// Stretches `samples` by `ratio` using the config's window and hop.
///
/// `ratio > 1` lengthens (slows down) without changing pitch.
pub fn time_stretch(samples: &[f32], ratio: f64, config: &EngineConfig) -> Result<Vec<f32>> {
    let mut pv = PhaseVocoder::from_config(config, ratio)?;
    Ok(pv.process(samples))
}

/// Wraps a phase value to [-PI, PI).
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase + PI;
    p - (p / TWO_PI).floor() * TWO_PI - PI
}

/// Identity phase locking (Laroche & Dolson).
///
/// Only spectral peaks keep their propagated phase; every other bin takes the
/// phase of its nearest peak plus the offset it had to that peak in the
/// analysis frame, so each peak's region moves as one rigid partial.
fn identity_phase_lock(
    magnitudes: &[f32],
    analysis_phases: &[f32],
    synth_phases: &mut [f32],
    peaks: &mut Vec<usize>,
) {
    let num_bins = magnitudes.len();
    if num_bins < 3 {
        return;
    }

    peaks.clear();
    for bin in 1..num_bins - 1 {
        if magnitudes[bin] > magnitudes[bin - 1] && magnitudes[bin] >= magnitudes[bin + 1] {
            peaks.push(bin);
        }
    }
    if peaks.is_empty() {
        return;
    }

    let mut peak_idx = 0;
    for bin in 0..num_bins {
        while peak_idx + 1 < peaks.len()
            && peaks[peak_idx + 1].abs_diff(bin) < peaks[peak_idx].abs_diff(bin)
        {
            peak_idx += 1;
        }
        let peak = peaks[peak_idx];
        if bin != peak {
            synth_phases[bin] = synth_phases[peak] + (analysis_phases[bin] - analysis_phases[peak]);
        }
    }
}
