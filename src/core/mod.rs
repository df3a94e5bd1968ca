//! Core types, configuration, window functions and resampling utilities.

pub mod config;
pub mod fft;
pub mod gain;
pub mod resample;
pub mod types;
pub mod window;

pub use config::{EngineConfig, FrequencyBand};
pub use types::*;
pub use window::{generate_window, WindowType};
