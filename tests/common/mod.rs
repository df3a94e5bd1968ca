#![allow(dead_code)]

use std::f32::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use freemix::{Signal, StemName, StemSet};

pub const SR: u32 = 44100;

pub fn gen_sine<F>(freq_hz: f32, sr: u32, n: usize, amp_fn: F) -> Vec<f32>
where
    F: Fn(usize) -> f32,
{
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * freq_hz * i as f32 / sr as f32;
            amp_fn(i) * phase.sin()
        })
        .collect()
}

/// Short decaying noise bursts every `period` samples.
pub fn gen_click_train(period: usize, n: usize, amp: f32, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = vec![0.0f32; n];
    if period == 0 {
        return out;
    }
    for start in (0..n).step_by(period) {
        for (k, s) in out[start..].iter_mut().take(256).enumerate() {
            let decay = (-(k as f32) / 40.0).exp();
            *s += amp * decay * rng.gen_range(-1.0f32..1.0);
        }
    }
    out
}

pub fn gen_noise(n: usize, amp: f32, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| amp * rng.gen_range(-1.0f32..1.0)).collect()
}

/// Bass tone, a mid tone and a 120 BPM click track mixed together.
pub fn gen_song(secs: f32) -> Signal {
    let n = (secs * SR as f32) as usize;
    let bass = gen_sine(60.0, SR, n, |_| 0.3);
    let lead = gen_sine(660.0, SR, n, |_| 0.2);
    let drums = gen_click_train(SR as usize / 2, n, 0.6, 7);
    let samples = bass
        .iter()
        .zip(&lead)
        .zip(&drums)
        .map(|((a, b), c)| a + b + c)
        .collect();
    Signal::new(samples, SR)
}

/// Four distinct synthetic stems of equal length.
pub fn gen_stems(n: usize) -> StemSet {
    StemSet::new(SR)
        .with_stem(StemName::Vocals, gen_sine(440.0, SR, n, |_| 0.5))
        .with_stem(StemName::Drums, gen_click_train(SR as usize / 2, n, 0.8, 3))
        .with_stem(StemName::Bass, gen_sine(55.0, SR, n, |_| 0.5))
        .with_stem(StemName::Other, gen_sine(1500.0, SR, n, |_| 0.3))
}

pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |m, &s| m.max(s.abs()))
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

pub fn count_positive_zero_crossings(signal: &[f32], start: usize, end: usize) -> usize {
    if signal.len() < 2 {
        return 0;
    }
    let start = start.min(signal.len() - 1);
    let end = end.min(signal.len());
    if end <= start + 1 {
        return 0;
    }
    (start..end - 1)
        .filter(|&i| signal[i] <= 0.0 && signal[i + 1] > 0.0)
        .count()
}

pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

pub fn assert_finite(signal: &[f32]) {
    assert!(
        signal.iter().all(|s| s.is_finite()),
        "signal contains NaN or infinity"
    );
}
