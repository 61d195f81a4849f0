use serde::{Deserialize, Serialize};

use crate::{
    enums::{DecoderMode, PitchAlgorithm},
    errors::{F0Error, Result},
};

/// Largest accepted pitch-shift hypothesis, in semitones either way.
pub const MAX_KEY_SHIFT: f32 = 48.0;

/// Highest input sample rate accepted for resampling.
pub const MAX_SAMPLE_RATE: usize = 384_000;

/// Parameters of the log-mel front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelConfig {
    pub sample_rate: usize,
    pub n_mels: usize,
    pub n_fft: usize,
    pub win_length: usize,
    pub hop_length: usize,
    pub f_min: f64,
    pub f_max: f64,
    /// HTK mel formula instead of Slaney.
    pub htk: bool,
    /// Floor applied before the logarithm.
    pub clamp: f32,
    /// Added to `re² + im²` before the square root.
    pub magnitude_eps: f32,
    /// Emit the first `n_fft / 2` log-magnitude bins instead of projecting onto mels.
    #[serde(default)]
    pub linear_spectrum: bool,
}

impl MelConfig {
    pub fn rmvpe() -> Self {
        MelConfig {
            sample_rate: 16000,
            n_mels: 128,
            n_fft: 1024,
            win_length: 1024,
            hop_length: 160,
            f_min: 30.0,
            f_max: 8000.0,
            htk: true,
            clamp: 1e-5,
            magnitude_eps: 0.0,
            linear_spectrum: false,
        }
    }

    pub fn fcpe() -> Self {
        MelConfig {
            sample_rate: 16000,
            n_mels: 128,
            n_fft: 1024,
            win_length: 1024,
            hop_length: 160,
            f_min: 0.0,
            f_max: 8000.0,
            htk: false,
            clamp: 1e-5,
            magnitude_eps: 1e-9,
            linear_spectrum: false,
        }
    }

    pub fn for_algorithm(algorithm: PitchAlgorithm) -> Self {
        match algorithm {
            PitchAlgorithm::Rmvpe => Self::rmvpe(),
            PitchAlgorithm::Fcpe => Self::fcpe(),
        }
    }

    /// Width of one feature frame.
    pub fn feature_dim(&self) -> usize {
        if self.linear_spectrum {
            self.n_fft / 2
        } else {
            self.n_mels
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(F0Error::invalid_input("mel sample rate must be positive"));
        }
        if self.n_mels == 0 || self.n_fft == 0 || self.win_length == 0 || self.hop_length == 0 {
            return Err(F0Error::invalid_input(format!(
                "mel parameters must be positive (n_mels={}, n_fft={}, win_length={}, hop_length={})",
                self.n_mels, self.n_fft, self.win_length, self.hop_length
            )));
        }
        if self.win_length > self.n_fft {
            return Err(F0Error::invalid_input(format!(
                "win_length {} exceeds n_fft {}",
                self.win_length, self.n_fft
            )));
        }
        if !(self.f_min >= 0.0 && self.f_max > self.f_min) {
            return Err(F0Error::invalid_input(format!(
                "mel frequency range [{}, {}] is empty",
                self.f_min, self.f_max
            )));
        }
        if !(self.clamp > 0.0) {
            return Err(F0Error::invalid_input("log clamp must be positive"));
        }
        Ok(())
    }
}

impl Default for MelConfig {
    fn default() -> Self {
        Self::rmvpe()
    }
}

/// Caller-facing knobs of a single `estimate_pitch` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Resample the contour to this many frames; `None` keeps the natural count.
    pub target_frame_count: Option<usize>,
    pub f0_min: f32,
    /// Values above are clamped, not zeroed.
    pub f0_max: Option<f32>,
    /// Confidence at or below this marks a frame unvoiced.
    pub threshold: f32,
    pub decoder: DecoderMode,
    pub interpolate_unvoiced: bool,
    pub test_time_augmentation: bool,
    /// Pitch-shift hypotheses in semitones.
    pub shift_hypotheses: Vec<f32>,
    pub unvoiced_penalty: f32,
    /// Take the voiced/unvoiced decision from the unshifted hypothesis.
    pub use_origin_uv: bool,
    pub center: bool,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            target_frame_count: None,
            f0_min: 50.0,
            f0_max: Some(1100.0),
            threshold: 0.05,
            decoder: DecoderMode::Local,
            interpolate_unvoiced: false,
            test_time_augmentation: false,
            shift_hypotheses: vec![0.0, -12.0, 12.0],
            unvoiced_penalty: 12.0,
            use_origin_uv: false,
            center: true,
        }
    }
}

impl PitchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.f0_min >= 0.0) {
            return Err(F0Error::invalid_input(format!("f0_min {} must be non-negative", self.f0_min)));
        }
        if let Some(f0_max) = self.f0_max {
            if !(f0_max > 0.0) {
                return Err(F0Error::invalid_input(format!("f0_max {} must be positive", f0_max)));
            }
        }
        if !self.threshold.is_finite() {
            return Err(F0Error::invalid_input("threshold must be finite"));
        }
        if self.target_frame_count == Some(0) {
            return Err(F0Error::invalid_input("target frame count must be positive"));
        }
        if self.test_time_augmentation && self.shift_hypotheses.is_empty() {
            return Err(F0Error::invalid_input("test-time augmentation needs at least one shift"));
        }
        if let Some(shift) = self
            .shift_hypotheses
            .iter()
            .find(|shift| !(shift.abs() <= MAX_KEY_SHIFT))
        {
            return Err(F0Error::invalid_input(format!(
                "shift hypothesis {} is outside ±{} semitones",
                shift, MAX_KEY_SHIFT
            )));
        }
        Ok(())
    }
}
