//! Window functions for spectral analysis and resampling.

use std::f64::consts::PI;

/// Window function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Periodic Hann (DFT-even), the STFT analysis/synthesis window.
    Hann,
}

/// Generates a window function of the specified type and size.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f32> {
    match window_type {
        WindowType::Hann => hann_window(size),
    }
}

/// Periodic Hann window of `size` points.
#[inline]
fn hann_window(size: usize) -> Vec<f32> {
    match size {
        0 => return vec![],
        1 => return vec![1.0],
        _ => {}
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / n;
            (0.5 * (1.0 - x.cos())) as f32
        })
        .collect()
}

/// Value at offset `t` ∈ [-1, 1] of a Kaiser window with the given `beta`.
#[inline]
pub fn kaiser(t: f64, beta: f64) -> f64 {
    if t.abs() > 1.0 {
        return 0.0;
    }
    bessel_i0(beta * (1.0 - t * t).max(0.0).sqrt()) / bessel_i0(beta)
}

/// Maximum number of series terms for Bessel I0 convergence.
const BESSEL_MAX_TERMS: usize = 30;
/// Relative convergence threshold for Bessel I0 series.
const BESSEL_CONVERGENCE: f64 = 1e-15;

/// Zeroth-order modified Bessel function of the first kind.
/// Computed via series expansion.
#[inline]
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let x_half = x / 2.0;
    for k in 1..BESSEL_MAX_TERMS {
        term *= (x_half / k as f64) * (x_half / k as f64);
        sum += term;
        if term < BESSEL_CONVERGENCE * sum {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_hann_overlap_add_constant() {
        // Squared periodic Hann at 75% overlap sums to a constant 1.5.
        let size = 1024;
        let hop = size / 4;
        let w = generate_window(WindowType::Hann, size);
        for pos in size..2 * size {
            let sum: f32 = (0..8)
                .map(|k| {
                    let start = k * hop;
                    if pos >= start && pos < start + size {
                        w[pos - start] * w[pos - start]
                    } else {
                        0.0
                    }
                })
                .sum();
            assert!((sum - 1.5).abs() < 1e-4, "sum at {} = {}", pos, sum);
        }
    }

    #[test]
    fn test_periodic_hann_shape() {
        let w = generate_window(WindowType::Hann, 1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-6);
        assert!((w[512] - 1.0).abs() < 1e-6);
        for i in 1..512 {
            assert!((w[i] - w[1024 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(generate_window(WindowType::Hann, 0).is_empty());
        assert_eq!(generate_window(WindowType::Hann, 1), vec![1.0]);
    }

    #[test]
    fn test_kaiser_shape() {
        assert!((kaiser(0.0, 6.0) - 1.0).abs() < 1e-12);
        assert!(kaiser(0.5, 6.0) < 1.0);
        assert_eq!(kaiser(1.5, 6.0), 0.0);
        assert!((kaiser(0.3, 6.0) - kaiser(-0.3, 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bessel_i0_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        // I0(1) = 1.2660658777...
        assert!((bessel_i0(1.0) - 1.266_065_877_7).abs() < 1e-8);
    }
}
