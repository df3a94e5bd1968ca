//! Length-based and rate-based resampling.
//!
//! Cubic interpolation squeezes phase-vocoder output back to its original
//! length during pitch shifting; windowed-sinc conversion brings decoded files
//! to the canonical engine rate.

use crate::core::window::kaiser;

/// Kaiser beta for the sinc kernel (~60 dB stopband).
const SINC_KAISER_BETA: f64 = 6.0;
/// Kernel half-width in input samples at unity cutoff.
const SINC_LOBES: usize = 8;

/// Linear interpolation to `output_len` samples (endpoints aligned).
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let ratio = (input.len() - 1) as f64 / (output_len - 1).max(1) as f64;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            if idx + 1 < input.len() {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[input.len() - 1]
            }
        })
        .collect()
}

/// 4-point Hermite interpolation to `output_len` samples (endpoints aligned).
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() < 4 {
        return resample_linear(input, output_len);
    }

    let last = input.len() - 1;
    let ratio = last as f64 / (output_len - 1).max(1) as f64;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;

            let s0 = input[idx.saturating_sub(1)];
            let s1 = input[idx];
            let s2 = input[(idx + 1).min(last)];
            let s3 = input[(idx + 2).min(last)];

            let c1 = 0.5 * (s2 - s0);
            let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
            let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);
            ((c3 * frac + c2) * frac + c1) * frac + s1
        })
        .collect()
}

/// Converts `input` from `from_rate` to `to_rate` with a Kaiser-windowed sinc.
///
/// When downsampling the kernel cutoff drops to `to_rate / from_rate` so
/// content above the new Nyquist is attenuated rather than aliased.
pub fn resample_to_rate(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if input.is_empty() || from_rate == 0 || to_rate == 0 {
        return vec![];
    }
    if from_rate == to_rate {
        return input.to_vec();
    }

    let step = from_rate as f64 / to_rate as f64;
    let output_len = ((input.len() as f64) / step).round() as usize;
    let cutoff = (to_rate as f64 / from_rate as f64).min(1.0);
    let half_width = (SINC_LOBES as f64 / cutoff).ceil() as isize;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let center = pos.floor() as isize;
            let mut acc = 0.0f64;
            let mut weight_sum = 0.0f64;

            for j in (center - half_width + 1)..=(center + half_width) {
                if j < 0 || j >= input.len() as isize {
                    continue;
                }
                let x = (pos - j as f64) * cutoff;
                let sinc = if x.abs() < 1e-10 {
                    1.0
                } else {
                    let pi_x = std::f64::consts::PI * x;
                    pi_x.sin() / pi_x
                };
                let w = sinc * kaiser(x / SINC_LOBES as f64, SINC_KAISER_BETA);
                acc += input[j as usize] as f64 * w;
                weight_sum += w;
            }

            if weight_sum.abs() > 1e-10 {
                (acc / weight_sum) as f32
            } else {
                0.0
            }
        })
        .collect()
}
