//! Stateful `load → separate → remix / freestyle` facade that writes results
//! to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::config::EngineConfig;
use crate::core::types::{RemixConfig, Signal, StemName, StemSet};
use crate::error::{FreemixError, Result};
use crate::freestyle::{FreestyleGenerator, Variation};
use crate::io::wav::{read_wav_file, to_rate, write_wav_file};
use crate::manifest::{Manifest, ManifestOutput, MANIFEST_FILE_NAME};
use crate::remix::engine::RemixEngine;
use crate::stems::separator::StemSeparator;

pub const FREESTYLE_MIX_FILE_NAME: &str = "freestyle_mix.wav";
pub const REMIX_FILE_NAME: &str = "remix.wav";

/// File name of a saved stem, e.g. `stem_drums.wav`.
pub fn stem_file_name(name: StemName) -> String {
    format!("stem_{}.wav", name)
}

/// One track moving through the pipeline.
///
/// Loading new audio discards any stems separated from the previous track.
#[derive(Debug)]
pub struct FreeMix {
    config: EngineConfig,
    separator: StemSeparator,
    engine: RemixEngine,
    audio: Option<Signal>,
    stems: Option<StemSet>,
    source_path: Option<PathBuf>,
}

impl FreeMix {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let separator = StemSeparator::new(config.clone())?;
        let engine = RemixEngine::new(config.clone());
        Ok(Self {
            config,
            separator,
            engine,
            audio: None,
            stems: None,
            source_path: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audio(&self) -> Option<&Signal> {
        self.audio.as_ref()
    }

    pub fn stems(&self) -> Option<&StemSet> {
        self.stems.as_ref()
    }

    /// Decodes a WAV file at the session rate.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let path = path.as_ref();
        let signal = read_wav_file(path, self.config.sample_rate)?;
        info!(
            path = %path.display(),
            secs = signal.duration_secs(),
            sample_rate = signal.sample_rate,
            "loaded"
        );
        self.audio = Some(signal);
        self.stems = None;
        self.source_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Uses an in-memory signal, resampled to the session rate if needed.
    pub fn load_signal(&mut self, signal: Signal) -> &mut Self {
        self.audio = Some(to_rate(signal, self.config.sample_rate));
        self.stems = None;
        self.source_path = None;
        self
    }

    /// # Errors
    ///
    /// [`FreemixError::NotLoaded`] when no audio has been loaded.
    pub fn separate(&mut self) -> Result<&StemSet> {
        let audio = self.audio.as_ref().ok_or(FreemixError::NotLoaded)?;
        info!("separating stems (hpss + band masks)");
        let stems = self.separator.separate(audio);
        for (name, samples) in stems.iter() {
            info!(stem = %name, secs = samples.len() as f64 / stems.sample_rate as f64, "stem ready");
        }
        Ok(&*self.stems.insert(stems))
    }

    fn require_stems(&self) -> Result<&StemSet> {
        self.stems.as_ref().ok_or(FreemixError::NotSeparated)
    }

    /// Writes `stem_<name>.wav` for every stem into `dir`, creating it.
    pub fn save_stems<P: AsRef<Path>>(&self, dir: P) -> Result<BTreeMap<StemName, PathBuf>> {
        let stems = self.require_stems()?;
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut paths = BTreeMap::new();
        for (name, samples) in stems.iter() {
            let path = dir.join(stem_file_name(name));
            write_wav_file(&path, &Signal::new(samples.to_vec(), stems.sample_rate))?;
            info!(path = %path.display(), "saved stem");
            paths.insert(name, path);
        }
        Ok(paths)
    }

    pub fn remix(&self, remix: &RemixConfig) -> Result<Signal> {
        let stems = self.require_stems()?;
        let samples = self.engine.remix(stems, remix)?;
        Ok(Signal::new(samples, stems.sample_rate))
    }

    /// Renders one remix and writes it to `path`.
    pub fn remix_to_file<P: AsRef<Path>>(&self, path: P, remix: &RemixConfig) -> Result<PathBuf> {
        let path = path.as_ref();
        let mixed = self.remix(remix)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_wav_file(path, &mixed)?;
        info!(path = %path.display(), secs = mixed.duration_secs(), "remix saved");
        Ok(path.to_path_buf())
    }

    pub fn freestyle(
        &self,
        n_variations: usize,
        bars_per_variation: usize,
        seed: u64,
    ) -> Result<(Signal, Vec<Variation>)> {
        let stems = self.require_stems()?;
        let mut generator = FreestyleGenerator::with_seed(self.config.clone(), seed);
        let (samples, variations) = generator.generate(stems, n_variations, bars_per_variation)?;
        Ok((Signal::new(samples, stems.sample_rate), variations))
    }

    /// Runs freestyle and writes the mix, every stem and the manifest into
    /// `dir`. Returns the manifest that was written.
    pub fn freestyle_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        n_variations: usize,
        bars_per_variation: usize,
        seed: u64,
    ) -> Result<Manifest> {
        let dir = dir.as_ref();
        let stems = self.require_stems()?;
        std::fs::create_dir_all(dir)?;
        info!(n_variations, bars_per_variation, seed, "freestyle");

        let (mix, variations) = self.freestyle(n_variations, bars_per_variation, seed)?;
        let mix_path = dir.join(FREESTYLE_MIX_FILE_NAME);
        write_wav_file(&mix_path, &mix)?;

        let stem_paths = self.save_stems(dir)?;
        let manifest = Manifest::new(
            self.source_path.as_deref(),
            stems.sample_rate,
            stem_paths.keys().copied().collect(),
            variations,
            ManifestOutput {
                freestyle_mix: mix_path.clone(),
                stem_dir: dir.to_path_buf(),
            },
        )?;
        let manifest_path = dir.join(MANIFEST_FILE_NAME);
        manifest.write_to(&manifest_path)?;

        info!(
            mix = %mix_path.display(),
            manifest = %manifest_path.display(),
            "freestyle complete"
        );
        Ok(manifest)
    }
}
