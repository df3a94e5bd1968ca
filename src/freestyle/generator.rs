//! Beat-locked freestyle variation generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::analysis::beat::BeatGrid;
use crate::core::config::EngineConfig;
use crate::core::gain::{fit_length, normalize_peak};
use crate::core::types::{Sample, StemName, StemSet};
use crate::error::{FreemixError, Result};
use crate::freestyle::mutation::Mutation;
use crate::freestyle::Variation;
use crate::remix::engine::RemixEngine;

/// Draws mutations from `R` and renders them bar-locked to the drums' tempo.
///
/// The RNG is the only state that changes between calls; a generator built
/// from the same seed replays the same run.
#[derive(Debug, Clone)]
pub struct FreestyleGenerator<R: Rng = ChaCha8Rng> {
    config: EngineConfig,
    engine: RemixEngine,
    rng: R,
}

impl FreestyleGenerator<ChaCha8Rng> {
    /// Generator backed by `ChaCha8Rng::seed_from_u64(seed)`.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> FreestyleGenerator<R> {
    pub fn new(config: EngineConfig, rng: R) -> Self {
        let engine = RemixEngine::new(config.clone());
        Self { config, engine, rng }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tempo grid from the drums stem, or from one second of silence when the
    /// set has no drums.
    pub fn beat_grid(&self, stems: &StemSet) -> BeatGrid {
        let fallback;
        let drums = match stems.get(StemName::Drums) {
            Some(samples) => samples,
            None => {
                debug!("no drums stem, estimating tempo from silence");
                fallback = vec![0.0f32; stems.sample_rate as usize];
                fallback.as_slice()
            }
        };
        BeatGrid::estimate(drums, stems.sample_rate, &self.config)
    }

    /// Renders `n_variations` variations of `bars_per_variation` bars each
    /// and concatenates them, normalized to `mix_peak`.
    ///
    /// Each variation is exactly `bar_samples * bars_per_variation` long.
    /// Zero variations yields an empty mix and an empty list.
    pub fn generate(
        &mut self,
        stems: &StemSet,
        n_variations: usize,
        bars_per_variation: usize,
    ) -> Result<(Vec<Sample>, Vec<Variation>)> {
        let grid = self.beat_grid(stems);
        let (variation_len, total_len) = render_lengths(&grid, n_variations, bars_per_variation)?;
        info!(
            bpm = round_to(grid.bpm, 1),
            bar_secs = round_to(grid.bar_secs(), 2),
            n_variations,
            "generating freestyle"
        );

        let mut mix = Vec::with_capacity(total_len);
        let mut variations = Vec::with_capacity(n_variations);

        for index in 0..n_variations {
            let mutation = Mutation::draw(&mut self.rng);
            let remix_config = mutation.remix_config();

            let mut local = stems.clone();
            if let Some(edit) = mutation.edit() {
                edit.apply(&mut local, &grid);
            }

            let mut rendered = self.engine.remix(&local, &remix_config)?;
            fit_length(&mut rendered, variation_len);

            let variation = Variation {
                variation: index + 1,
                bpm: round_to(grid.bpm, 1),
                bars: bars_per_variation,
                mutation,
                duration_s: round_to(rendered.len() as f64 / stems.sample_rate as f64, 3),
            };
            info!(
                variation = variation.variation,
                of = n_variations,
                mutation = %variation.mutation.kind().as_str(),
                target = ?variation.mutation.target(),
                "variation rendered"
            );

            mix.extend_from_slice(&rendered);
            variations.push(variation);
        }

        normalize_peak(&mut mix, self.config.mix_peak, self.config.silence_floor);
        Ok((mix, variations))
    }
}

/// Samples per variation and for the whole run.
///
/// Both must fit in a `Vec<f32>`; larger requests are rejected up front.
fn render_lengths(
    grid: &BeatGrid,
    n_variations: usize,
    bars_per_variation: usize,
) -> Result<(usize, usize)> {
    let max_samples = isize::MAX as usize / std::mem::size_of::<Sample>();
    grid.bar_samples
        .checked_mul(bars_per_variation)
        .and_then(|variation| Some((variation, variation.checked_mul(n_variations)?)))
        .filter(|&(_, total)| total <= max_samples)
        .ok_or_else(|| {
            FreemixError::InvalidConfig(format!(
                "{} variations of {} bars at {} samples per bar is too long to render",
                n_variations, bars_per_variation, grid.bar_samples
            ))
        })
}

#[inline]
fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}
