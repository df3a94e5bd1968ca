//! Duration-preserving pitch shift.

use crate::core::config::EngineConfig;
use crate::core::resample::resample_cubic;
use crate::error::Result;
use crate::stretch::phase_vocoder::time_stretch;

/// Frequency ratio for a shift of `semitones` in equal temperament.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f64 {
    2.0f64.powf(semitones as f64 / 12.0)
}

/// Shifts pitch by `semitones` while keeping the sample count.
///
/// The signal is first stretched by the frequency ratio, then resampled back
/// to its original length, which raises or lowers every partial by that ratio.
pub fn pitch_shift(samples: &[f32], semitones: f32, config: &EngineConfig) -> Result<Vec<f32>> {
    if samples.is_empty() {
        return Ok(vec![]);
    }
    let ratio = semitones_to_ratio(semitones);
    let stretched = time_stretch(samples, ratio, config)?;
    if stretched.is_empty() {
        // Shifted so far down that the intermediate stretch rounds to nothing.
        return Ok(vec![0.0; samples.len()]);
    }
    Ok(resample_cubic(&stretched, samples.len()))
}
