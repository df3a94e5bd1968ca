//! Peak measurement, normalization, clipping and length fitting.

use crate::core::types::Sample;

/// Largest absolute sample value (0.0 for empty input).
#[inline]
pub fn peak(samples: &[Sample]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Scales `samples` so that their peak equals `target`.
///
/// Signals whose peak does not exceed `floor` are left untouched.
/// Returns the gain that was applied (1.0 when skipped).
#[inline]
pub fn normalize_peak(samples: &mut [Sample], target: f32, floor: f32) -> f32 {
    let current = peak(samples);
    if current <= floor {
        return 1.0;
    }
    let gain = target / current;
    for s in samples.iter_mut() {
        *s *= gain;
    }
    gain
}

/// Hard-clips every sample to [-1, 1].
#[inline]
pub fn hard_clip(samples: &mut [Sample]) {
    for s in samples.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
}

/// Truncates or zero-pads `samples` to exactly `len`.
#[inline]
pub fn fit_length(samples: &mut Vec<Sample>, len: usize) {
    samples.resize(len, 0.0);
}
