pub mod cache;
pub mod f0;
pub mod mel;
pub mod ndarray_ext;
pub mod pitch;
pub mod post;
pub mod resample;

#[cfg(test)]
mod tests;

pub use f0::{CentTable, SalienceModel};
pub use mel::MelExtractor;
pub use pitch::{PitchContour, PitchEstimator};
