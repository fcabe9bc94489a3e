//! Configuration surface for SpiralMap.
//!
//! Presets mirror the published PT-MAP / LST-MAP hyperparameter tables;
//! determinism helpers derive per-component RNG seeds from one base seed so
//! batched experiments replay exactly.

pub mod determinism;
mod preset;
pub mod tracing;

pub use preset::{MapPreset, Normalization};
pub use tracing::init_tracing;
