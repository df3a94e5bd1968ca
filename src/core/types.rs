use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// A mono sample sequence tagged with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Raw mono sample data.
    pub samples: Vec<Sample>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Signal {
    /// Create a new signal.
    pub fn new(samples: Vec<Sample>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a zero-filled signal of `len` samples.
    pub fn silent(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the signal holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// The four fixed stem names, in canonical mixing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemName {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl StemName {
    /// All stems in canonical order.
    pub const ALL: [StemName; 4] = [
        StemName::Vocals,
        StemName::Drums,
        StemName::Bass,
        StemName::Other,
    ];

    /// Lowercase name used in file names and manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            StemName::Vocals => "vocals",
            StemName::Drums => "drums",
            StemName::Bass => "bass",
            StemName::Other => "other",
        }
    }
}

impl fmt::Display for StemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vocals" => Ok(StemName::Vocals),
            "drums" => Ok(StemName::Drums),
            "bass" => Ok(StemName::Bass),
            "other" => Ok(StemName::Other),
            other => Err(format!("unknown stem '{}'", other)),
        }
    }
}

/// Named stems sharing one sample rate.
///
/// Stem lengths may differ by a few samples from each other; each one is
/// reconstructed independently.
#[derive(Debug, Clone, PartialEq)]
pub struct StemSet {
    /// Sample rate shared by every stem.
    pub sample_rate: u32,
    stems: BTreeMap<StemName, Vec<Sample>>,
}

impl StemSet {
    /// Create an empty stem set.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stems: BTreeMap::new(),
        }
    }

    /// Insert (or replace) a stem, returning the previous samples if any.
    pub fn insert(&mut self, name: StemName, samples: Vec<Sample>) -> Option<Vec<Sample>> {
        self.stems.insert(name, samples)
    }

    /// Builder-style insert.
    pub fn with_stem(mut self, name: StemName, samples: Vec<Sample>) -> Self {
        self.insert(name, samples);
        self
    }

    pub fn get(&self, name: StemName) -> Option<&[Sample]> {
        self.stems.get(&name).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, name: StemName) -> Option<&mut Vec<Sample>> {
        self.stems.get_mut(&name)
    }

    /// Returns a stem as a standalone [`Signal`].
    pub fn signal(&self, name: StemName) -> Option<Signal> {
        self.get(name)
            .map(|s| Signal::new(s.to_vec(), self.sample_rate))
    }

    /// Number of stems present.
    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Iterates stems in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (StemName, &[Sample])> {
        self.stems.iter().map(|(&name, s)| (name, s.as_slice()))
    }

    /// Names of the stems present, in canonical order.
    pub fn names(&self) -> Vec<StemName> {
        self.stems.keys().copied().collect()
    }
}

/// Per-stem transform settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemConfig {
    /// Linear gain; values above 1.0 are allowed.
    pub volume: f32,
    /// Pitch shift in semitones (duration preserving).
    pub pitch: f32,
    /// Time-scale factor: >1.0 = slower (longer), <1.0 = faster (shorter).
    pub stretch: f32,
    /// Silences the stem regardless of the other settings.
    pub mute: bool,
}

impl Default for StemConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 0.0,
            stretch: 1.0,
            mute: false,
        }
    }
}

impl StemConfig {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch(mut self, semitones: f32) -> Self {
        self.pitch = semitones;
        self
    }

    pub fn with_stretch(mut self, stretch: f32) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }
}

/// Stem name to [`StemConfig`] mapping. Absent stems use the default config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemixConfig(BTreeMap<StemName, StemConfig>);

impl RemixConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A config holding an explicit default entry for every stem.
    pub fn all_default() -> Self {
        Self(
            StemName::ALL
                .iter()
                .map(|&name| (name, StemConfig::default()))
                .collect(),
        )
    }

    /// Effective config for a stem (default when absent).
    pub fn get(&self, name: StemName) -> StemConfig {
        self.0.get(&name).copied().unwrap_or_default()
    }

    /// Mutable entry for a stem, created with defaults if absent.
    pub fn entry(&mut self, name: StemName) -> &mut StemConfig {
        self.0.entry(name).or_default()
    }

    pub fn set(&mut self, name: StemName, config: StemConfig) {
        self.0.insert(name, config);
    }

    pub fn with(mut self, name: StemName, config: StemConfig) -> Self {
        self.set(name, config);
        self
    }

    /// Parses a JSON object such as `{"drums": {"volume": 1.5}}`.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_names_canonical_order() {
        let mut set = StemSet::new(44100);
        set.insert(StemName::Other, vec![0.0]);
        set.insert(StemName::Vocals, vec![0.0]);
        set.insert(StemName::Bass, vec![0.0]);
        set.insert(StemName::Drums, vec![0.0]);
        assert_eq!(set.names(), StemName::ALL.to_vec());
    }

    #[test]
    fn test_stem_name_parse() {
        assert_eq!("Drums".parse::<StemName>(), Ok(StemName::Drums));
        assert!("guitar".parse::<StemName>().is_err());
    }

    #[test]
    fn test_stem_config_default() {
        let cfg = StemConfig::default();
        assert_eq!(cfg.volume, 1.0);
        assert_eq!(cfg.pitch, 0.0);
        assert_eq!(cfg.stretch, 1.0);
        assert!(!cfg.mute);
    }

    #[test]
    fn test_remix_config_partial_json() {
        let cfg = RemixConfig::from_json(r#"{"drums": {"volume": 1.5}, "vocals": {"pitch": -2.0}}"#)
            .unwrap();
        assert_eq!(cfg.get(StemName::Drums).volume, 1.5);
        assert_eq!(cfg.get(StemName::Drums).stretch, 1.0);
        assert_eq!(cfg.get(StemName::Vocals).pitch, -2.0);
        assert_eq!(cfg.get(StemName::Bass), StemConfig::default());
    }

    #[test]
    fn test_remix_config_rejects_unknown_stem() {
        assert!(RemixConfig::from_json(r#"{"guitar": {"volume": 1.0}}"#).is_err());
    }

    #[test]
    fn test_signal_duration() {
        let sig = Signal::silent(22050, 44100);
        assert!((sig.duration_secs() - 0.5).abs() < 1e-9);
        assert_eq!(Signal::silent(10, 0).duration_secs(), 0.0);
    }
}
