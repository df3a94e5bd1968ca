//! Engine-wide constants gathered into one immutable configuration.

use serde::{Deserialize, Serialize};

use crate::error::{FreemixError, Result};

/// A frequency range in Hz, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }

    #[inline]
    pub fn contains(&self, freq_hz: f32) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }

    /// Finite, non-negative and not inverted.
    pub fn is_valid(&self) -> bool {
        self.low_hz.is_finite()
            && self.high_hz.is_finite()
            && self.low_hz >= 0.0
            && self.low_hz <= self.high_hz
    }
}

/// Parameters shared by the transform, separator, processor and generator.
///
/// Built once per run and passed explicitly; nothing in the crate mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical sample rate in Hz (default: 44100).
    pub sample_rate: u32,
    /// STFT window length (default: 2048).
    pub fft_size: usize,
    /// STFT hop length (default: 512).
    pub hop_size: usize,
    /// HPSS separation margin; higher = less bleed, more artifacts (default: 3.0).
    pub hpss_margin: f32,
    /// HPSS median kernel length in frames / bins (default: 31).
    pub hpss_kernel: usize,
    /// Pass band for the bass stem (default: 20–300 Hz).
    pub bass_band: FrequencyBand,
    /// Pass band for the vocal stem (default: 80–8000 Hz).
    pub vocal_band: FrequencyBand,
    /// Peak level each separated stem is normalized to (default: 0.9).
    pub stem_peak: f32,
    /// Peak level of rendered mixes (default: 0.95).
    pub mix_peak: f32,
    /// Beats per bar for freestyle quantization (default: 4).
    pub beats_per_bar: usize,
    /// Lower tempo clamp in BPM (default: 60).
    pub min_bpm: f64,
    /// Upper tempo clamp in BPM (default: 200).
    pub max_bpm: f64,
    /// Peaks at or below this level are treated as silence (default: 1e-6).
    pub silence_floor: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 2048,
            hop_size: 512,
            hpss_margin: 3.0,
            hpss_kernel: 31,
            bass_band: FrequencyBand::new(20.0, 300.0),
            vocal_band: FrequencyBand::new(80.0, 8000.0),
            stem_peak: 0.9,
            mix_peak: 0.95,
            beats_per_bar: 4,
            min_bpm: 60.0,
            max_bpm: 200.0,
            silence_floor: 1e-6,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set FFT window and hop length together.
    pub fn with_fft(mut self, fft_size: usize, hop_size: usize) -> Self {
        self.fft_size = fft_size;
        self.hop_size = hop_size;
        self
    }

    pub fn with_hpss_margin(mut self, margin: f32) -> Self {
        self.hpss_margin = margin;
        self
    }

    pub fn with_hpss_kernel(mut self, kernel: usize) -> Self {
        self.hpss_kernel = kernel;
        self
    }

    pub fn with_beats_per_bar(mut self, beats: usize) -> Self {
        self.beats_per_bar = beats;
        self
    }

    /// Number of frequency bins produced by the transform.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Center frequency in Hz of an FFT bin.
    #[inline]
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Parses a JSON object; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects geometry the transform cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(FreemixError::InvalidConfig(
                "sample rate must be positive".to_string(),
            ));
        }
        if self.fft_size < 4 || !self.fft_size.is_power_of_two() {
            return Err(FreemixError::InvalidConfig(format!(
                "fft size must be a power of two >= 4, got {}",
                self.fft_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            return Err(FreemixError::InvalidConfig(format!(
                "hop size must be in 1..={}, got {}",
                self.fft_size, self.hop_size
            )));
        }
        if self.hpss_kernel == 0 {
            return Err(FreemixError::InvalidConfig(
                "hpss kernel must be at least 1".to_string(),
            ));
        }
        if self.beats_per_bar == 0 {
            return Err(FreemixError::InvalidConfig(
                "beats per bar must be at least 1".to_string(),
            ));
        }
        if !(self.min_bpm > 0.0 && self.min_bpm <= self.max_bpm) {
            return Err(FreemixError::InvalidConfig(format!(
                "invalid tempo range {}..{}",
                self.min_bpm, self.max_bpm
            )));
        }
        if !(self.hpss_margin.is_finite() && self.hpss_margin > 0.0) {
            return Err(FreemixError::InvalidConfig(format!(
                "hpss margin must be positive, got {}",
                self.hpss_margin
            )));
        }
        for (name, band) in [("bass", self.bass_band), ("vocal", self.vocal_band)] {
            if !band.is_valid() {
                return Err(FreemixError::InvalidConfig(format!(
                    "{} band {}..{} Hz is not an ordered non-negative range",
                    name, band.low_hz, band.high_hz
                )));
            }
        }
        for (name, level) in [("stem_peak", self.stem_peak), ("mix_peak", self.mix_peak)] {
            if !(level.is_finite() && level > 0.0) {
                return Err(FreemixError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, level
                )));
            }
        }
        if !(self.silence_floor.is_finite() && self.silence_floor >= 0.0) {
            return Err(FreemixError::InvalidConfig(format!(
                "silence floor must be non-negative, got {}",
                self.silence_floor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_bins(), 1025);
    }

    #[test]
    fn test_bin_frequency_monotonic() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.bin_frequency(0), 0.0);
        assert!((cfg.bin_frequency(1024) - 22050.0).abs() < 1e-3);
        assert!(cfg.bin_frequency(10) < cfg.bin_frequency(11));
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(EngineConfig::default().with_fft(1000, 256).validate().is_err());
        assert!(EngineConfig::default().with_fft(1024, 0).validate().is_err());
        assert!(EngineConfig::default().with_fft(1024, 2048).validate().is_err());
        assert!(EngineConfig::default().with_sample_rate(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"hpss_margin": 2.0}"#).unwrap();
        assert_eq!(cfg.hpss_margin, 2.0);
        assert_eq!(cfg.fft_size, 2048);
    }

    #[test]
    fn test_from_json_validates() {
        assert!(EngineConfig::from_json(r#"{"fft_size": 1024, "hop_size": 256}"#).is_ok());
        assert!(matches!(
            EngineConfig::from_json(r#"{"hop_size": 0}"#),
            Err(FreemixError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(FreemixError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_bands_and_bad_levels() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"bass_band": {"low_hz": 300.0, "high_hz": 20.0}}"#),
            Err(FreemixError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{"vocal_band": {"low_hz": -5.0, "high_hz": 80.0}}"#)
            .is_err());
        assert!(EngineConfig::from_json(r#"{"stem_peak": -0.9}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"mix_peak": 0.0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"silence_floor": -1e-6}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"hpss_margin": -3.0}"#).is_err());

        let mut cfg = EngineConfig::default();
        cfg.stem_peak = f32::NAN;
        assert!(cfg.validate().is_err());
        assert!(EngineConfig::default().with_hpss_margin(f32::NAN).validate().is_err());
        assert!(EngineConfig::from_json(r#"{"silence_floor": 0.0}"#).is_ok());
    }

    #[test]
    fn test_band_inclusive() {
        let band = FrequencyBand::new(20.0, 300.0);
        assert!(band.contains(20.0));
        assert!(band.contains(300.0));
        assert!(!band.contains(300.1));
        assert!(!band.contains(0.0));
    }
}
