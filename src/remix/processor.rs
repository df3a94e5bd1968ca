//! Per-stem volume, pitch, stretch and mute.

use tracing::warn;

use crate::core::config::EngineConfig;
use crate::core::gain::hard_clip;
use crate::core::types::{Sample, StemConfig};
use crate::error::Result;
use crate::stretch::{pitch_shift, time_stretch};

/// Pitch shifts at or below this many semitones are skipped.
const PITCH_EPSILON: f32 = 0.01;
/// Stretch factors within this distance of 1.0 are skipped.
const STRETCH_EPSILON: f32 = 0.01;

/// Applies one [`StemConfig`] to one stem.
#[derive(Debug, Clone)]
pub struct StemProcessor {
    config: EngineConfig,
}

impl Default for StemProcessor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StemProcessor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns a processed copy of `samples`.
    ///
    /// Order is fixed: mute, pitch, stretch, volume, clip. A muted stem
    /// becomes zeros of the same length and nothing else runs.
    ///
    /// # Errors
    ///
    /// Only fails when the engine config's FFT geometry is unusable.
    pub fn apply(&self, samples: &[Sample], stem: &StemConfig) -> Result<Vec<Sample>> {
        if stem.mute {
            return Ok(vec![0.0; samples.len()]);
        }
        if samples.is_empty() {
            return Ok(vec![]);
        }

        let mut out = if stem.pitch.abs() > PITCH_EPSILON {
            pitch_shift(samples, stem.pitch, &self.config)?
        } else {
            samples.to_vec()
        };

        if (stem.stretch - 1.0).abs() > STRETCH_EPSILON {
            if stem.stretch > 0.0 && stem.stretch.is_finite() {
                out = time_stretch(&out, stem.stretch as f64, &self.config)?;
            } else {
                warn!(stretch = stem.stretch, "ignoring non-positive stretch factor");
            }
        }

        if stem.volume != 1.0 {
            for s in out.iter_mut() {
                *s *= stem.volume;
            }
        }
        hard_clip(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * 330.0 * i as f32 / 44100.0).sin() * 0.6)
            .collect()
    }

    #[test]
    fn test_default_config_is_identity() {
        let input = tone(5000);
        let out = StemProcessor::default().apply(&input, &StemConfig::default()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_mute_short_circuits() {
        let input = tone(5000);
        let cfg = StemConfig::default()
            .with_mute(true)
            .with_volume(5.0)
            .with_pitch(3.0)
            .with_stretch(2.0);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out, vec![0.0; 5000]);
    }

    #[test]
    fn test_volume_then_clip() {
        let input = vec![0.2, -0.4, 0.9];
        let cfg = StemConfig::default().with_volume(2.0);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out, vec![0.4, -0.8, 1.0]);
    }

    #[test]
    fn test_stretch_changes_length() {
        let input = tone(20_000);
        let cfg = StemConfig::default().with_stretch(2.0);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out.len(), 40_000);
    }

    #[test]
    fn test_pitch_keeps_length() {
        let input = tone(20_000);
        let cfg = StemConfig::default().with_pitch(-1.5);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out.len(), 20_000);
        assert!(out.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_negligible_pitch_and_stretch_skipped() {
        let input = tone(3000);
        let cfg = StemConfig::default().with_pitch(0.005).with_stretch(1.005);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_non_positive_stretch_ignored() {
        let input = tone(3000);
        let cfg = StemConfig::default().with_stretch(0.0);
        let out = StemProcessor::default().apply(&input, &cfg).unwrap();
        assert_eq!(out.len(), 3000);
    }

    #[test]
    fn test_input_untouched() {
        let input = tone(3000);
        let copy = input.clone();
        let _ = StemProcessor::default()
            .apply(&input, &StemConfig::default().with_volume(3.0))
            .unwrap();
        assert_eq!(input, copy);
    }
}
