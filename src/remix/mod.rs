//! Stem processing and mixing.

pub mod engine;
pub mod processor;

pub use engine::RemixEngine;
pub use processor::StemProcessor;
