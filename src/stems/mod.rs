//! Stem separation.

pub mod separator;

pub use separator::{FrequencyMask, StemSeparator};
