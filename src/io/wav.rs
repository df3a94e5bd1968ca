//! WAV decode/encode for the collaborator layer.
//!
//! Decoding accepts any channel count and 8–32 bit PCM or 32-bit float, then
//! down-mixes to mono by averaging channels. Encoding always writes mono
//! 32-bit float.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::core::resample::resample_to_rate;
use crate::core::types::{Sample, Signal};
use crate::error::{FreemixError, Result};

/// Decodes a WAV stream into a mono signal at the file's own rate.
pub fn read_wav<R: Read>(reader: R) -> Result<Signal> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(FreemixError::UnsupportedFormat("zero channels".to_string()));
    }

    let interleaved: Vec<Sample> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = 1.0 / (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
        (format, bits) => {
            return Err(FreemixError::UnsupportedFormat(format!(
                "{:?} at {} bits",
                format, bits
            )))
        }
    };

    let samples = downmix(&interleaved, spec.channels as usize);
    debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        frames = samples.len(),
        "decoded wav"
    );
    Ok(Signal::new(samples, spec.sample_rate))
}

/// Decodes a WAV file and resamples it to `target_rate` if needed.
pub fn read_wav_file<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Signal> {
    let file = std::io::BufReader::new(std::fs::File::open(path.as_ref())?);
    let signal = read_wav(file)?;
    Ok(to_rate(signal, target_rate))
}

/// Resamples a signal to `target_rate` (no-op when already there).
pub fn to_rate(signal: Signal, target_rate: u32) -> Signal {
    if signal.sample_rate == target_rate {
        return signal;
    }
    debug!(from = signal.sample_rate, to = target_rate, "resampling");
    let samples = resample_to_rate(&signal.samples, signal.sample_rate, target_rate);
    Signal::new(samples, target_rate)
}

/// Encodes a signal as mono 32-bit float WAV.
pub fn write_wav<W: Write + Seek>(writer: W, signal: &Signal) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::new(writer, spec)?;
    for &sample in &signal.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encodes a signal into an in-memory WAV file.
pub fn write_wav_bytes(signal: &Signal) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, signal)?;
    Ok(cursor.into_inner())
}

/// Writes a signal to disk as mono 32-bit float WAV.
pub fn write_wav_file<P: AsRef<Path>>(path: P, signal: &Signal) -> Result<()> {
    let file = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
    write_wav(file, signal)
}

/// Averages interleaved frames down to one channel.
fn downmix(interleaved: &[Sample], channels: usize) -> Vec<Sample> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut w = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                w.write_sample(s).unwrap();
            }
            w.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_float_round_trip() {
        let original = Signal::new(vec![0.0, 0.5, -0.5, 0.99, -1.0], 44100);
        let bytes = write_wav_bytes(&original).unwrap();
        let decoded = read_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_stereo_pcm16_downmix() {
        let bytes = encode_i16(&[16384, 0, -16384, -16384], 2, 48000);
        let decoded = read_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.len(), 2);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-6);
        assert!((decoded.samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_data() {
        assert!(matches!(
            read_wav(Cursor::new(Vec::<u8>::new())),
            Err(FreemixError::Wav(_))
        ));
        assert!(read_wav(Cursor::new(b"NOT_RIFF_HEADER_AT_ALL______________".to_vec())).is_err());
    }

    #[test]
    fn test_to_rate() {
        let s = Signal::new(vec![0.2; 22050], 22050);
        let up = to_rate(s.clone(), 44100);
        assert_eq!(up.sample_rate, 44100);
        assert_eq!(up.len(), 44100);
        assert_eq!(to_rate(s.clone(), 22050), s);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let original = Signal::new((0..1000).map(|i| (i as f32 * 0.01).sin() * 0.5).collect(), 44100);
        write_wav_file(&path, &original).unwrap();
        let decoded = read_wav_file(&path, 44100).unwrap();
        assert_eq!(decoded, original);
    }
}
