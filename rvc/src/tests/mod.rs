use ndarray::{s, Array1, Array2, ArrayView2};
use ndarray_stats::QuantileExt;

use rvc_common::{
    config::MelConfig,
    errors::{F0Error, Result},
};

use crate::{
    f0::{f0_to_cent, CentTable, SalienceModel},
    PitchEstimator,
};

mod pitch;

/// Log magnitude below which a frame counts as silent.
const SILENCE_LOG: f32 = -4.6;

/// Stands in for a trained network: reads the strongest linear-spectrum bin of each
/// frame and emits a Gaussian bump around its frequency on the cent grid.
struct LinearPeakSalience {
    sample_rate: f32,
    n_fft: usize,
    cent_table: CentTable,
}

impl SalienceModel for LinearPeakSalience {
    fn salience(&self, frames: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut out = Array2::zeros((frames.nrows(), self.cent_table.len()));
        for (frame, mut row) in frames.outer_iter().zip(out.outer_iter_mut()) {
            let k = frame
                .slice(s![1..])
                .argmax()
                .map_err(|e| F0Error::invalid_input(e.to_string()))?
                + 1;
            if frame[k] < SILENCE_LOG {
                continue;
            }
            let offset = if k + 1 < frame.len() {
                let (a, b, c) = (frame[k - 1], frame[k], frame[k + 1]);
                let curvature = a - 2.0 * b + c;
                if curvature < 0.0 {
                    0.5 * (a - c) / curvature
                } else {
                    0.0
                }
            } else {
                0.0
            };
            let hz = (k as f32 + offset) * self.sample_rate / self.n_fft as f32;
            let center = f0_to_cent(hz);
            row.assign(&self.cent_table.view().mapv(|c| (-(c - center).powi(2) / 1250.0).exp()));
        }
        Ok(out)
    }
}

fn sine(freq: f32, sample_rate: usize, len: usize) -> Array1<f32> {
    Array1::from_shape_fn(len, |i| {
        0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
    })
}

fn get_estimator() -> PitchEstimator<LinearPeakSalience> {
    let config = MelConfig {
        linear_spectrum: true,
        ..MelConfig::fcpe()
    };
    let model = LinearPeakSalience {
        sample_rate: config.sample_rate as f32,
        n_fft: config.n_fft,
        cent_table: CentTable::fcpe(),
    };
    PitchEstimator::with_parts(model, config, CentTable::fcpe()).unwrap()
}

fn fraction_within(f0: &Array1<f32>, target: f32, tolerance: f32) -> f32 {
    let hits = f0.iter().filter(|&&f| (f - target).abs() <= target * tolerance).count();
    hits as f32 / f0.len() as f32
}
