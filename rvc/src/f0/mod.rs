use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use rvc_common::{
    enums::PitchAlgorithm,
    errors::{F0Error, Result},
};

pub mod decode;
pub mod ensemble;
#[cfg(feature = "onnx")]
pub mod rmvpe;

/// Number of pitch bins in a salience distribution.
pub const N_CLASS: usize = 360;

/// Frequency of cent 0.
pub const CENT_REFERENCE_HZ: f32 = 10.0;

pub fn f0_to_cent(f0: f32) -> f32 {
    1200.0 * (f0 / CENT_REFERENCE_HZ).log2()
}

pub fn cent_to_f0(cent: f32) -> f32 {
    CENT_REFERENCE_HZ * 2.0f32.powf(cent / 1200.0)
}

/// Pretrained network turning feature frames `(T, feature_dim)` into per-frame
/// salience `(T, n_class)`. Non-negative, not necessarily normalized.
pub trait SalienceModel {
    fn salience(&self, frames: ArrayView2<f32>) -> Result<Array2<f32>>;
}

impl<F> SalienceModel for F
where
    F: Fn(ArrayView2<f32>) -> Result<Array2<f32>>,
{
    fn salience(&self, frames: ArrayView2<f32>) -> Result<Array2<f32>> {
        self(frames)
    }
}

/// Strictly increasing cent value of every salience bin.
#[derive(Debug, Clone, PartialEq)]
pub struct CentTable {
    cents: Array1<f32>,
}

impl CentTable {
    /// `n_class` bins evenly spaced in cents between `f0_min` and `f0_max`.
    pub fn linspace(f0_min: f32, f0_max: f32, n_class: usize) -> Result<Self> {
        if !(f0_min > 0.0 && f0_max > f0_min) || n_class < 2 {
            return Err(F0Error::invalid_input(format!(
                "cannot build {} cent bins between {} Hz and {} Hz",
                n_class, f0_min, f0_max
            )));
        }
        Ok(CentTable {
            cents: Array1::linspace(f0_to_cent(f0_min), f0_to_cent(f0_max), n_class),
        })
    }

    /// 20-cent bins starting just under 32 Hz.
    pub fn rmvpe() -> Self {
        CentTable {
            cents: Array1::from_shape_fn(N_CLASS, |i| 20.0 * i as f32 + 1997.379_4),
        }
    }

    /// C1 (32.70 Hz) to B6 (1975.5 Hz).
    pub fn fcpe() -> Self {
        let first = f0_to_cent(32.70);
        let last = f0_to_cent(1975.5);
        CentTable {
            cents: Array1::linspace(first, last, N_CLASS),
        }
    }

    pub fn for_algorithm(algorithm: PitchAlgorithm) -> Self {
        match algorithm {
            PitchAlgorithm::Rmvpe => Self::rmvpe(),
            PitchAlgorithm::Fcpe => Self::fcpe(),
        }
    }

    pub fn len(&self) -> usize {
        self.cents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cents.is_empty()
    }

    pub fn view(&self) -> ArrayView1<f32> {
        self.cents.view()
    }
}

/// Quantizes Hz onto the 1..=255 mel-scale pitch tokens the synthesis model takes.
pub fn coarse_pitch(f0: ArrayView1<f32>, f0_min: f32, f0_max: f32) -> Array1<i32> {
    let to_mel = |x: f32| (x / 700.0 + 1.).ln() * 1127.;
    let f0_mel_min = to_mel(f0_min);
    let f0_mel_max = to_mel(f0_max);
    f0.mapv(to_mel)
        .mapv(|x| if x <= 0. { x } else { (x - f0_mel_min) * 254. / (f0_mel_max - f0_mel_min) + 1. })
        .mapv(|x| x.clamp(1., 255.).round() as i32)
}
