use ndarray::{s, Array2, ArrayView2, Axis, Ix3};

use rvc_common::errors::{F0Error, Result};

use super::{SalienceModel, N_CLASS};

/// The network downsamples time five times by 2.
const FRAME_MULTIPLE: usize = 32;

/// RMVPE exported to ONNX: input `"input"` of shape `(1, n_mels, T)`, output
/// `"output"` of shape `(1, T, 360)`.
pub struct Rmvpe {
    session: ort::Session,
}

impl Rmvpe {
    pub fn new(session: ort::Session) -> Self {
        Rmvpe { session }
    }

    fn mel2hidden(&self, mel: Array2<f32>) -> Result<Array2<f32>> {
        let n_frames = mel.ncols();
        let n_pad = FRAME_MULTIPLE * ((n_frames.max(1) - 1) / FRAME_MULTIPLE + 1) - n_frames;
        let mel = if n_pad > 0 {
            let mut padded = Array2::zeros((mel.nrows(), n_frames + n_pad));
            padded.slice_mut(s![.., ..n_frames]).assign(&mel);
            padded
        } else {
            mel
        };

        let mel = mel.insert_axis(Axis(0));
        let output = self.session.run(ort::inputs!["input" => mel]?)?;
        let hidden = output["output"]
            .try_extract_tensor::<f32>()?
            .into_dimensionality::<Ix3>()?;

        if hidden.len_of(Axis(1)) < n_frames || hidden.len_of(Axis(2)) != N_CLASS {
            return Err(F0Error::shape_mismatch(format!(
                "model returned {:?} for {} frames",
                hidden.shape(),
                n_frames
            )));
        }
        Ok(hidden.slice(s![0, ..n_frames, ..]).to_owned())
    }
}

impl SalienceModel for Rmvpe {
    fn salience(&self, frames: ArrayView2<f32>) -> Result<Array2<f32>> {
        if frames.nrows() == 0 {
            return Ok(Array2::zeros((0, N_CLASS)));
        }
        self.mel2hidden(frames.t().as_standard_layout().into_owned())
    }
}
