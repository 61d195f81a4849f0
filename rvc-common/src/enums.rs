use std::cmp::PartialEq;

use serde::{Deserialize, Serialize};

/// Which salience network family the frames are prepared for.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchAlgorithm {
    Rmvpe,
    Fcpe,
}

/// How a salience distribution is collapsed into a single cent value.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderMode {
    /// Weighted average of the cent table over every bin.
    Global,
    /// Weighted average over the 9 bins around the argmax.
    #[default]
    Local,
}

impl From<PitchAlgorithm> for i64 {
    fn from(algorithm: PitchAlgorithm) -> Self {
        match algorithm {
            PitchAlgorithm::Rmvpe => 1,
            PitchAlgorithm::Fcpe => 2,
        }
    }
}

impl From<i64> for PitchAlgorithm {
    fn from(val: i64) -> Self {
        match val {
            2 => PitchAlgorithm::Fcpe,
            _ => PitchAlgorithm::Rmvpe,
        }
    }
}

impl From<&str> for PitchAlgorithm {
    fn from(val: &str) -> Self {
        match val {
            "fcpe" => PitchAlgorithm::Fcpe,
            _ => PitchAlgorithm::Rmvpe,
        }
    }
}

impl From<String> for PitchAlgorithm {
    fn from(val: String) -> Self {
        Self::from(val.as_str())
    }
}

impl ToString for PitchAlgorithm {
    fn to_string(&self) -> String {
        match self {
            PitchAlgorithm::Rmvpe => "rmvpe".to_string(),
            PitchAlgorithm::Fcpe => "fcpe".to_string(),
        }
    }
}

impl PitchAlgorithm {
    pub fn is_valid(val: i64) -> bool {
        matches!(val, 1 | 2)
    }
}

impl From<&str> for DecoderMode {
    fn from(val: &str) -> Self {
        match val {
            "argmax" | "global" => DecoderMode::Global,
            _ => DecoderMode::Local,
        }
    }
}

impl From<String> for DecoderMode {
    fn from(val: String) -> Self {
        Self::from(val.as_str())
    }
}

impl ToString for DecoderMode {
    fn to_string(&self) -> String {
        match self {
            DecoderMode::Global => "global".to_string(),
            DecoderMode::Local => "local_argmax".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_algorithm_conversions() {
        assert_eq!(PitchAlgorithm::from("fcpe"), PitchAlgorithm::Fcpe);
        assert_eq!(PitchAlgorithm::from("unknown"), PitchAlgorithm::Rmvpe);
        assert_eq!(PitchAlgorithm::from(i64::from(PitchAlgorithm::Fcpe)), PitchAlgorithm::Fcpe);
        assert!(PitchAlgorithm::is_valid(1));
        assert!(!PitchAlgorithm::is_valid(3));
    }

    #[test]
    fn test_decoder_mode_conversions() {
        assert_eq!(DecoderMode::from("argmax"), DecoderMode::Global);
        assert_eq!(DecoderMode::from("local_argmax"), DecoderMode::Local);
        assert_eq!(DecoderMode::from(DecoderMode::Global.to_string()), DecoderMode::Global);
        assert_eq!(DecoderMode::default(), DecoderMode::Local);
    }
}
