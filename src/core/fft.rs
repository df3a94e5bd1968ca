//! FFT-related constants shared by the STFT and the phase vocoder.

use rustfft::num_complex::Complex;

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Minimum window sum (as a fraction of max) applied during overlap-add
/// normalization so sparsely covered edges are not amplified.
pub const WINDOW_SUM_FLOOR_RATIO: f32 = 1e-3;

/// Absolute floor for window sum normalization to prevent division by zero.
pub const WINDOW_SUM_EPSILON: f32 = 1e-8;

/// Divides an overlap-added buffer by its accumulated squared-window sum,
/// flooring the divisor at `WINDOW_SUM_FLOOR_RATIO` of its maximum.
pub fn normalize_by_window_sum(output: &mut [f32], window_sum: &[f32]) {
    let max_ws = window_sum.iter().copied().fold(0.0f32, f32::max);
    let min_ws = (max_ws * WINDOW_SUM_FLOOR_RATIO).max(WINDOW_SUM_EPSILON);
    for (sample, &ws) in output.iter_mut().zip(window_sum.iter()) {
        *sample /= ws.max(min_ws);
    }
}
