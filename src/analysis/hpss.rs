//! Harmonic-Percussive Source Separation (HPSS) via median filtering.
//!
//! Works on a magnitude spectrogram. Harmonic content is identified by
//! temporal continuity (median across frames), percussive content by
//! broadband energy (median across bins). A separation margin above 1.0
//! makes the two soft masks sum to less than one, leaving a non-negative
//! residual that belongs to neither component.
//!
//! Both median filters keep their full width at the spectrogram edges by
//! reflecting the data about the first and last frame or bin.

use crate::core::config::EngineConfig;

/// Parameters for HPSS processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HpssParams {
    /// Width of the horizontal (time) median filter in frames.
    pub harmonic_width: usize,
    /// Width of the vertical (frequency) median filter in bins.
    pub percussive_width: usize,
    /// Separation margin; 1.0 gives complementary masks, larger values leave
    /// ambiguous energy in the residual.
    pub margin: f32,
}

impl Default for HpssParams {
    fn default() -> Self {
        Self {
            harmonic_width: 31,
            percussive_width: 31,
            margin: 3.0,
        }
    }
}

impl HpssParams {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            harmonic_width: config.hpss_kernel,
            percussive_width: config.hpss_kernel,
            margin: config.hpss_margin,
        }
    }
}

/// Harmonic, percussive and residual magnitudes, all shaped like the input.
#[derive(Debug, Clone, PartialEq)]
pub struct HpssComponents {
    pub harmonic: Vec<Vec<f32>>,
    pub percussive: Vec<Vec<f32>>,
    /// `max(total - harmonic - percussive, 0)` per cell.
    pub residual: Vec<Vec<f32>>,
}

/// Splits a frame-major magnitude spectrogram into harmonic, percussive and
/// residual parts.
pub fn hpss(magnitudes: &[Vec<f32>], params: &HpssParams) -> HpssComponents {
    let harmonic_enh = median_filter_horizontal(magnitudes, params.harmonic_width.max(1));
    let percussive_enh = median_filter_vertical(magnitudes, params.percussive_width.max(1));
    let split_zeros = (params.margin - 1.0).abs() < f32::EPSILON;

    let mut harmonic = Vec::with_capacity(magnitudes.len());
    let mut percussive = Vec::with_capacity(magnitudes.len());
    let mut residual = Vec::with_capacity(magnitudes.len());

    for (frame_idx, mags) in magnitudes.iter().enumerate() {
        let mut h_row = Vec::with_capacity(mags.len());
        let mut p_row = Vec::with_capacity(mags.len());
        let mut r_row = Vec::with_capacity(mags.len());
        for (bin, &mag) in mags.iter().enumerate() {
            let h = harmonic_enh[frame_idx][bin];
            let p = percussive_enh[frame_idx][bin];
            let h_mask = soft_mask(h, p * params.margin, split_zeros);
            let p_mask = soft_mask(p, h * params.margin, split_zeros);
            let h_mag = mag * h_mask;
            let p_mag = mag * p_mask;
            h_row.push(h_mag);
            p_row.push(p_mag);
            r_row.push((mag - h_mag - p_mag).max(0.0));
        }
        harmonic.push(h_row);
        percussive.push(p_row);
        residual.push(r_row);
    }

    HpssComponents {
        harmonic,
        percussive,
        residual,
    }
}

/// Power-2 Wiener mask `x² / (x² + reference²)`.
///
/// Both inputs are scaled by their max first so tiny magnitudes do not
/// underflow. Cells where both are ~0 get 0.5 when `split_zeros`, else 0.
#[inline]
fn soft_mask(x: f32, reference: f32, split_zeros: bool) -> f32 {
    let z = x.max(reference);
    if z < f32::MIN_POSITIVE {
        return if split_zeros { 0.5 } else { 0.0 };
    }
    let xs = (x / z) * (x / z);
    let rs = (reference / z) * (reference / z);
    xs / (xs + rs)
}

#[inline]
fn median_in_place(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| {
        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
    });
    *median
}

/// Indices of the `2 * half + 1` window centered on `center`, reflected at
/// both edges (`d c b a | a b c d | d c b a`).
#[inline]
fn window_indices(center: usize, half: usize, len: usize) -> impl Iterator<Item = usize> {
    let period = 2 * len as isize;
    let center = center as isize;
    let half = half as isize;
    (center - half..=center + half).map(move |i| {
        let m = i.rem_euclid(period);
        if m < len as isize {
            m as usize
        } else {
            (period - 1 - m) as usize
        }
    })
}

/// Applies a horizontal (time-axis) median filter to the magnitude spectrogram.
///
/// For each bin, the median is computed over a window of `width` frames centered
/// on the current frame. This enhances temporally stable (harmonic) components.
fn median_filter_horizontal(mags: &[Vec<f32>], width: usize) -> Vec<Vec<f32>> {
    let num_frames = mags.len();
    if num_frames == 0 {
        return vec![];
    }
    let num_bins = mags[0].len();
    let half = width / 2;
    let mut result = vec![vec![0.0f32; num_bins]; num_frames];
    let mut scratch = Vec::with_capacity(width);

    for (frame_idx, row) in result.iter_mut().enumerate() {
        for (bin, out) in row.iter_mut().enumerate() {
            scratch.clear();
            scratch.extend(
                window_indices(frame_idx, half, num_frames).map(|frame| mags[frame][bin]),
            );
            *out = median_in_place(&mut scratch);
        }
    }

    result
}

/// Applies a vertical (frequency-axis) median filter to the magnitude spectrogram.
///
/// For each frame, the median is computed over a window of `width` bins centered
/// on the current bin. This enhances spectrally broad (percussive) components.
fn median_filter_vertical(mags: &[Vec<f32>], width: usize) -> Vec<Vec<f32>> {
    let half = width / 2;
    let mut scratch = Vec::with_capacity(width);

    mags.iter()
        .map(|frame| {
            let num_bins = frame.len();
            (0..num_bins)
                .map(|bin| {
                    scratch.clear();
                    scratch.extend(window_indices(bin, half, num_bins).map(|i| frame[i]));
                    median_in_place(&mut scratch)
                })
                .collect()
        })
        .collect()
}
