//! Audio file I/O.

pub mod wav;

pub use wav::{read_wav_file, write_wav_file};
