pub mod config;
pub mod enums;
pub mod errors;

pub use config::{MelConfig, PitchConfig};
pub use enums::{DecoderMode, PitchAlgorithm};
pub use errors::{F0Error, Result};
