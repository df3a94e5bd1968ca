//! Band-weighted spectral-flux onset strength.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::core::fft::COMPLEX_ZERO;
use crate::core::window::{generate_window, WindowType};

// Frequency band boundaries for transient weighting (Hz).
const BAND_SUB_BASS_LIMIT: f32 = 100.0;
const BAND_BASS_MID_LIMIT: f32 = 500.0;
const BAND_MID_LIMIT: f32 = 2000.0;
const BAND_HIGH_MID_LIMIT: f32 = 8000.0;

// Spectral flux weights per frequency band.
/// Sub-bass (<100 Hz): kick fundamentals, little attack detail.
const WEIGHT_SUB_BASS: f32 = 0.6;
/// Bass/low-mid (100–500 Hz): kick and snare body.
const WEIGHT_BASS_MID: f32 = 1.0;
/// Mid (500–2000 Hz).
const WEIGHT_MID: f32 = 0.8;
/// High-mid (2–8 kHz): hi-hats, snare attacks.
const WEIGHT_HIGH_MID: f32 = 1.2;
/// Very high (>8 kHz): mostly noise.
const WEIGHT_VERY_HIGH: f32 = 0.6;

/// Computes the onset strength envelope of a mono signal.
///
/// One value per analysis frame: the band-weighted sum of positive magnitude
/// increases since the previous frame. Frames start at `frame_idx * hop_size`.
/// Returns an empty envelope when the input is shorter than one window.
pub fn onset_envelope(
    samples: &[f32],
    sample_rate: u32,
    fft_size: usize,
    hop_size: usize,
) -> Vec<f32> {
    if samples.len() < fft_size || fft_size == 0 || hop_size == 0 {
        return vec![];
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window = generate_window(WindowType::Hann, fft_size);

    let bin_weights = compute_bin_weights(fft_size, sample_rate);
    let num_bins = fft_size / 2 + 1;
    let num_frames = (samples.len() - fft_size) / hop_size + 1;
    let mut prev_magnitude = vec![0.0f32; num_bins];
    let mut flux_values = Vec::with_capacity(num_frames);
    let mut fft_buffer = vec![COMPLEX_ZERO; fft_size];

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop_size;

        for (buf, (&s, &w)) in fft_buffer
            .iter_mut()
            .zip(samples[start..start + fft_size].iter().zip(window.iter()))
        {
            *buf = Complex::new(s * w, 0.0);
        }

        fft.process(&mut fft_buffer);

        let mut flux = 0.0f32;
        for ((&c, prev), &weight) in fft_buffer[..num_bins]
            .iter()
            .zip(prev_magnitude.iter_mut())
            .zip(bin_weights.iter())
        {
            let mag = c.norm();
            let diff = mag - *prev;
            if diff > 0.0 && frame_idx > 0 {
                flux += diff * weight;
            }
            *prev = mag;
        }

        flux_values.push(flux);
    }

    flux_values
}

/// Computes frequency bin weights for onset detection.
fn compute_bin_weights(fft_size: usize, sample_rate: u32) -> Vec<f32> {
    let num_bins = fft_size / 2 + 1;
    let bin_freq = sample_rate as f32 / fft_size as f32;

    (0..num_bins)
        .map(|bin| {
            let freq = bin as f32 * bin_freq;
            if freq < BAND_SUB_BASS_LIMIT {
                WEIGHT_SUB_BASS
            } else if freq < BAND_BASS_MID_LIMIT {
                WEIGHT_BASS_MID
            } else if freq < BAND_MID_LIMIT {
                WEIGHT_MID
            } else if freq < BAND_HIGH_MID_LIMIT {
                WEIGHT_HIGH_MID
            } else {
                WEIGHT_VERY_HIGH
            }
        })
        .collect()
}
