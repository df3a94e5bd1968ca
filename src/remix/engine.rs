//! Renders a stem set plus per-stem configs into one mix.

use tracing::debug;

use crate::core::config::EngineConfig;
use crate::core::gain::normalize_peak;
use crate::core::types::{RemixConfig, Sample, StemName, StemSet};
use crate::error::Result;
use crate::remix::processor::StemProcessor;

/// Processes every stem, sums them and normalizes the result.
#[derive(Debug, Clone)]
pub struct RemixEngine {
    config: EngineConfig,
    processor: StemProcessor,
}

impl Default for RemixEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RemixEngine {
    pub fn new(config: EngineConfig) -> Self {
        let processor = StemProcessor::new(config.clone());
        Self { config, processor }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mixes all four stems under `remix`.
    ///
    /// A missing stem counts as empty and a missing config as the default, so
    /// neither is an error. Stems are zero-padded to the longest processed
    /// stem before summing; the sum is normalized to `mix_peak` unless silent.
    pub fn remix(&self, stems: &StemSet, remix: &RemixConfig) -> Result<Vec<Sample>> {
        let mut processed = Vec::with_capacity(StemName::ALL.len());
        let mut max_len = 0usize;

        for name in StemName::ALL {
            let samples = stems.get(name).unwrap_or(&[]);
            let stem_config = remix.get(name);
            let out = self.processor.apply(samples, &stem_config)?;
            debug!(stem = %name, len = out.len(), ?stem_config, "stem processed");
            max_len = max_len.max(out.len());
            processed.push(out);
        }

        let mut mix = vec![0.0f32; max_len];
        for stem in &processed {
            for (m, &s) in mix.iter_mut().zip(stem) {
                *m += s;
            }
        }

        normalize_peak(&mut mix, self.config.mix_peak, self.config.silence_floor);
        Ok(mix)
    }
}
