use thiserror::Error;

pub type Result<T> = std::result::Result<T, F0Error>;

#[derive(Debug, Error)]
pub enum F0Error {
    /// Empty or malformed waveform, or a non-positive rate/hop/window parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Arrays that have to stay aligned (frames, hypotheses, bins) disagree in size.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("resampler error: {0}")]
    Resample(String),
    #[error(transparent)]
    NdarrayShape(#[from] ndarray::ShapeError),
    #[cfg(feature = "onnx")]
    #[error(transparent)]
    Ort(#[from] ort::Error),
}

impl F0Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        F0Error::InvalidInput(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        F0Error::ShapeMismatch(msg.into())
    }
}
