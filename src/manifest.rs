//! The `freemix.v1` run manifest.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::types::StemName;
use crate::error::Result;
use crate::freestyle::Variation;

pub const MANIFEST_VERSION: &str = "freemix.v1";
pub const MANIFEST_FILE_NAME: &str = "freemix_manifest.json";
/// Recorded as `source` when the audio did not come from a file.
pub const IN_MEMORY_SOURCE: &str = "array_input";
/// Hex characters of the SHA-256 kept in `source_hash`.
const SOURCE_HASH_LEN: usize = 16;

/// Paths written by a freestyle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestOutput {
    pub freestyle_mix: PathBuf,
    pub stem_dir: PathBuf,
}

/// Provenance and variation list for one freestyle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub source: String,
    /// First 16 hex characters of the source file's SHA-256, empty for
    /// in-memory input.
    pub source_hash: String,
    pub sample_rate: u32,
    pub stems: Vec<StemName>,
    pub variations: Vec<Variation>,
    pub output: ManifestOutput,
}

impl Manifest {
    pub fn new(
        source: Option<&Path>,
        sample_rate: u32,
        stems: Vec<StemName>,
        variations: Vec<Variation>,
        output: ManifestOutput,
    ) -> Result<Self> {
        let (source, source_hash) = match source {
            Some(path) if path.exists() => (path.display().to_string(), source_hash(path)?),
            Some(path) => (path.display().to_string(), String::new()),
            None => (IN_MEMORY_SOURCE.to_string(), String::new()),
        };
        Ok(Self {
            version: MANIFEST_VERSION.to_string(),
            source,
            source_hash,
            sample_rate,
            stems,
            variations,
            output,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Truncated SHA-256 of a file's bytes.
pub fn source_hash<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(SOURCE_HASH_LEN);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freestyle::Mutation;

    fn output() -> ManifestOutput {
        ManifestOutput {
            freestyle_mix: PathBuf::from("out/freestyle_mix.wav"),
            stem_dir: PathBuf::from("out"),
        }
    }

    #[test]
    fn test_in_memory_source() {
        let m = Manifest::new(None, 44100, StemName::ALL.to_vec(), vec![], output()).unwrap();
        assert_eq!(m.version, "freemix.v1");
        assert_eq!(m.source, "array_input");
        assert!(m.source_hash.is_empty());
    }

    #[test]
    fn test_source_hash_of_known_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.bin");
        std::fs::write(&path, b"abc").unwrap();
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(source_hash(&path).unwrap(), "ba7816bf8f01cfea");
        let m = Manifest::new(Some(&path), 44100, vec![], vec![], output()).unwrap();
        assert_eq!(m.source_hash, "ba7816bf8f01cfea");
    }

    #[test]
    fn test_json_layout_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let variations = vec![Variation {
            variation: 1,
            bpm: 120.0,
            bars: 4,
            mutation: Mutation::Mute {
                stem: StemName::Bass,
            },
            duration_s: 8.0,
        }];
        let m = Manifest::new(None, 44100, StemName::ALL.to_vec(), variations, output()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();
        assert_eq!(value["stems"], serde_json::json!(["vocals", "drums", "bass", "other"]));
        assert_eq!(value["variations"][0]["mutation"]["type"], "mute");
        assert_eq!(value["output"]["stem_dir"], "out");

        let path = dir.path().join(MANIFEST_FILE_NAME);
        m.write_to(&path).unwrap();
        assert_eq!(Manifest::read_from(&path).unwrap(), m);
    }
}
