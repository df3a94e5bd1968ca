//! Pre-render edits applied directly to stem samples.
//!
//! These run on a per-variation copy of the stem set, between copying and
//! rendering, and never touch the remix config.

use tracing::debug;

use crate::analysis::beat::BeatGrid;
use crate::core::types::{Sample, StemName, StemSet};

/// Chunks shorter than this are too short to stutter audibly.
const CHOP_MIN_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEdit {
    /// Stutter at 1/`division`-note resolution.
    Chop { stem: StemName, division: u32 },
    /// Reverse one bar in place.
    ReverseBar { stem: StemName, bar: usize },
}

impl SampleEdit {
    pub fn target(&self) -> StemName {
        match *self {
            SampleEdit::Chop { stem, .. } | SampleEdit::ReverseBar { stem, .. } => stem,
        }
    }

    /// Applies the edit to its target stem. Absent stems are left alone.
    pub fn apply(&self, stems: &mut StemSet, grid: &BeatGrid) {
        let Some(samples) = stems.get_mut(self.target()) else {
            debug!(stem = %self.target(), "edit target missing, skipped");
            return;
        };
        match *self {
            SampleEdit::Chop { division, .. } => chop(samples, grid.beat_samples, division),
            SampleEdit::ReverseBar { bar, .. } => reverse_bar(samples, grid.bar_samples, bar),
        }
    }
}

/// Stutter-chop: every second chunk is overwritten by the chunk before it.
///
/// The chunk is a 1/`division` note, `beat_samples / (division / 4)`. No-op
/// when the chunk is under [`CHOP_MIN_CHUNK`] samples or longer than the stem.
pub fn chop(samples: &mut [Sample], beat_samples: usize, division: u32) {
    let per_beat = (division / 4) as usize;
    if per_beat == 0 {
        return;
    }
    let chunk = beat_samples / per_beat;
    if chunk < CHOP_MIN_CHUNK || chunk > samples.len() {
        return;
    }

    let mut pos = 0;
    while pos + 2 * chunk < samples.len() {
        samples.copy_within(pos..pos + chunk, pos + chunk);
        pos += 2 * chunk;
    }
}

/// Reverses `[bar * bar_samples, bar * bar_samples + bar_samples)`, clipped
/// to the stem.
pub fn reverse_bar(samples: &mut [Sample], bar_samples: usize, bar: usize) {
    let start = bar.saturating_mul(bar_samples);
    let end = start.saturating_add(bar_samples).min(samples.len());
    if end > start {
        samples[start..end].reverse();
    }
}
