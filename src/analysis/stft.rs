//! Short-time Fourier transform with centered framing.
//!
//! The signal is zero-padded by half a window on both sides so every input
//! sample is covered by the same number of frames as interior samples.
//! Synthesis is a weighted overlap-add normalized by the summed squared
//! window, which makes `inverse(forward(x))` reproduce `x` for any hop that
//! keeps the window sum non-zero.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::core::config::EngineConfig;
use crate::core::fft::{normalize_by_window_sum, COMPLEX_ZERO};
use crate::core::window::{generate_window, WindowType};
use crate::error::{FreemixError, Result};

/// Complex time-frequency representation, stored frame-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// One vector of `fft_size / 2 + 1` bins per analysis frame.
    pub frames: Vec<Vec<Complex<f32>>>,
    /// Length of the time-domain signal the frames were computed from.
    pub signal_len: usize,
}

impl Spectrogram {
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// Splits every value into magnitude and phase.
    pub fn magnitude_phase(&self) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        let mut magnitudes = Vec::with_capacity(self.frames.len());
        let mut phases = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            magnitudes.push(frame.iter().map(|c| c.norm()).collect());
            phases.push(frame.iter().map(|c| c.arg()).collect());
        }
        (magnitudes, phases)
    }

    /// Rebuilds a spectrogram from magnitudes and phases of equal shape.
    pub fn from_polar(magnitudes: &[Vec<f32>], phases: &[Vec<f32>], signal_len: usize) -> Self {
        let frames = magnitudes
            .iter()
            .zip(phases.iter())
            .map(|(mags, phs)| {
                mags.iter()
                    .zip(phs.iter())
                    .map(|(&m, &p)| Complex::from_polar(m, p))
                    .collect()
            })
            .collect();
        Self { frames, signal_len }
    }
}

/// Forward/inverse STFT with a fixed periodic Hann window and hop.
#[derive(Clone)]
pub struct Stft {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("fft_size", &self.fft_size)
            .field("hop_size", &self.hop_size)
            .finish()
    }
}

impl Stft {
    /// Plans the transform for the config's window and hop length.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        Ok(Self {
            fft_size: config.fft_size,
            hop_size: config.hop_size,
            window: generate_window(WindowType::Hann, config.fft_size),
            fft_forward: planner.plan_fft_forward(config.fft_size),
            fft_inverse: planner.plan_fft_inverse(config.fft_size),
        })
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples.
    pub fn num_frames(&self, len: usize) -> usize {
        let padded = len + self.fft_size;
        1 + (padded - self.fft_size).div_ceil(self.hop_size)
    }

    /// Computes the spectrogram of a mono signal.
    pub fn forward(&self, signal: &[f32]) -> Spectrogram {
        let pad = self.fft_size / 2;
        let num_frames = self.num_frames(signal.len());
        let num_bins = self.num_bins();

        let mut padded = vec![0.0f32; (num_frames - 1) * self.hop_size + self.fft_size];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let mut fft_buf = vec![COMPLEX_ZERO; self.fft_size];
        let frames = (0..num_frames)
            .map(|frame_idx| {
                let start = frame_idx * self.hop_size;
                for (buf, (&s, &w)) in fft_buf
                    .iter_mut()
                    .zip(padded[start..start + self.fft_size].iter().zip(&self.window))
                {
                    *buf = Complex::new(s * w, 0.0);
                }
                self.fft_forward.process(&mut fft_buf);
                fft_buf[..num_bins].to_vec()
            })
            .collect();

        Spectrogram {
            frames,
            signal_len: signal.len(),
        }
    }

    /// Reconstructs the time-domain signal, `spec.signal_len` samples long.
    ///
    /// # Errors
    ///
    /// Returns [`FreemixError::SpectrogramShape`] if any frame does not hold
    /// exactly `fft_size / 2 + 1` bins.
    pub fn inverse(&self, spec: &Spectrogram) -> Result<Vec<f32>> {
        let num_bins = self.num_bins();
        if let Some(bad) = spec.frames.iter().find(|f| f.len() != num_bins) {
            return Err(FreemixError::SpectrogramShape {
                expected: num_bins,
                found: bad.len(),
            });
        }
        Ok(self.overlap_add(&spec.frames, spec.signal_len))
    }

    /// Inverse FFT and weighted overlap-add of frames already known to hold
    /// `num_bins` values each.
    pub(crate) fn overlap_add(&self, frames: &[Vec<Complex<f32>>], signal_len: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; signal_len];
        }

        let num_bins = self.num_bins();
        let out_len = (frames.len() - 1) * self.hop_size + self.fft_size;
        let mut output = vec![0.0f32; out_len];
        let mut window_sum = vec![0.0f32; out_len];
        let mut fft_buf = vec![COMPLEX_ZERO; self.fft_size];
        let norm = 1.0 / self.fft_size as f32;

        for (frame_idx, frame) in frames.iter().enumerate() {
            fft_buf[..num_bins].copy_from_slice(frame);
            fft_buf[0].im = 0.0;
            fft_buf[num_bins - 1].im = 0.0;
            for bin in 1..num_bins - 1 {
                fft_buf[self.fft_size - bin] = fft_buf[bin].conj();
            }
            self.fft_inverse.process(&mut fft_buf);

            let start = frame_idx * self.hop_size;
            for (i, &w) in self.window.iter().enumerate() {
                output[start + i] += fft_buf[i].re * norm * w;
                window_sum[start + i] += w * w;
            }
        }

        normalize_by_window_sum(&mut output, &window_sum);

        let pad = self.fft_size / 2;
        let mut signal: Vec<f32> = output.into_iter().skip(pad).take(signal_len).collect();
        signal.resize(signal_len, 0.0);
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn stft() -> Stft {
        Stft::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_bin_count() {
        let s = stft();
        let spec = s.forward(&vec![0.1f32; 5000]);
        assert_eq!(spec.num_bins(), 1025);
        assert_eq!(spec.num_frames(), s.num_frames(5000));
    }

    #[test]
    fn test_round_trip_sine() {
        let s = stft();
        let input: Vec<f32> = (0..10_000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 44100.0).sin() * 0.7)
            .collect();
        let output = s.inverse(&s.forward(&input)).unwrap();
        assert_eq!(output.len(), input.len());
        for (i, (a, b)) in input.iter().zip(output.iter()).enumerate() {
            assert!((a - b).abs() < 1e-4, "sample {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_round_trip_shorter_than_window() {
        let s = stft();
        let input: Vec<f32> = (0..300).map(|i| ((i % 17) as f32 - 8.0) / 10.0).collect();
        let output = s.inverse(&s.forward(&input)).unwrap();
        assert_eq!(output.len(), 300);
        for (a, b) in input.iter().zip(output.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_signal() {
        let s = stft();
        let spec = s.forward(&[]);
        assert_eq!(spec.num_frames(), 1);
        assert!(s.inverse(&spec).unwrap().is_empty());
    }

    #[test]
    fn test_inverse_rejects_wrong_shape() {
        let s = stft();
        let spec = Spectrogram {
            frames: vec![vec![COMPLEX_ZERO; 513]],
            signal_len: 100,
        };
        match s.inverse(&spec) {
            Err(FreemixError::SpectrogramShape { expected, found }) => {
                assert_eq!(expected, 1025);
                assert_eq!(found, 513);
            }
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_polar_round_trip() {
        let s = stft();
        let input: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();
        let spec = s.forward(&input);
        let (mags, phases) = spec.magnitude_phase();
        let rebuilt = Spectrogram::from_polar(&mags, &phases, spec.signal_len);
        let output = s.inverse(&rebuilt).unwrap();
        for (a, b) in input.iter().zip(output.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
