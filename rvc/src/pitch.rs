use std::cmp::Ordering;

use ndarray::{s, Array1, Array2, ArrayView1};

use rvc_common::{
    config::{MelConfig, PitchConfig},
    enums::PitchAlgorithm,
    errors::{F0Error, Result},
};

use crate::{
    f0::{coarse_pitch, decode::decode_f0, ensemble::ensemble_contour, CentTable, SalienceModel},
    mel::MelExtractor,
    post::post_process,
};

/// Final F0 in Hz (0 = unvoiced) with its voiced mask, frame for frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchContour {
    pub f0: Array1<f32>,
    pub voiced: Array1<bool>,
}

impl PitchContour {
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }

    /// Pitch tokens for the synthesis model.
    pub fn coarse(&self, f0_min: f32, f0_max: f32) -> Array1<i32> {
        coarse_pitch(self.f0.view(), f0_min, f0_max)
    }
}

/// Ordering of test-time shifts: ascending upward shifts, downward ones counted at half
/// weight. The unshifted hypothesis always comes first.
fn tta_order(shift: f32) -> f32 {
    if shift >= 0.0 {
        shift
    } else {
        -shift / 2.0
    }
}

pub struct PitchEstimator<M> {
    model: M,
    extractor: MelExtractor,
    cent_table: CentTable,
}

impl<M: SalienceModel> PitchEstimator<M> {
    /// Estimator with the mel front end and cent bins `algorithm` was trained on.
    pub fn new(model: M, algorithm: PitchAlgorithm) -> Result<Self> {
        Self::with_parts(
            model,
            MelConfig::for_algorithm(algorithm),
            CentTable::for_algorithm(algorithm),
        )
    }

    pub fn with_parts(model: M, mel_config: MelConfig, cent_table: CentTable) -> Result<Self> {
        Ok(PitchEstimator {
            model,
            extractor: MelExtractor::new(mel_config)?,
            cent_table,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn extractor(&self) -> &MelExtractor {
        &self.extractor
    }

    pub fn cent_table(&self) -> &CentTable {
        &self.cent_table
    }

    /// Salience `(T, n_class)` of `waveform` analysed `key_shift` semitones up.
    pub fn salience(
        &mut self,
        waveform: ArrayView1<f32>,
        sample_rate: usize,
        key_shift: f32,
        center: bool,
    ) -> Result<Array2<f32>> {
        let frames = self.extractor.extract(waveform, sample_rate, key_shift, center)?;
        let salience = self.model.salience(frames.view())?;
        if salience.nrows() != frames.nrows() {
            return Err(F0Error::shape_mismatch(format!(
                "salience model returned {} frames for {} feature frames",
                salience.nrows(),
                frames.nrows()
            )));
        }
        Ok(salience)
    }

    /// Decoded F0 of every key shift, as columns of a `(T, H)` matrix.
    pub fn infer_f0s(
        &mut self,
        waveform: ArrayView1<f32>,
        sample_rate: usize,
        key_shifts: &[f32],
        config: &PitchConfig,
    ) -> Result<Array2<f32>> {
        let mut f0s: Option<Array2<f32>> = None;
        for (h, &key_shift) in key_shifts.iter().enumerate() {
            let salience = self.salience(waveform, sample_rate, key_shift, config.center)?;
            let f0 = decode_f0(salience.view(), &self.cent_table, config.decoder, config.threshold)?;
            tracing::trace!(key_shift, frames = f0.len(), "decoded hypothesis");

            let f0s = f0s.get_or_insert_with(|| Array2::zeros((f0.len(), key_shifts.len())));
            if f0s.nrows() != f0.len() {
                return Err(F0Error::shape_mismatch(format!(
                    "hypothesis {} has {} frames, expected {}",
                    key_shift,
                    f0.len(),
                    f0s.nrows()
                )));
            }
            f0s.slice_mut(s![.., h]).assign(&f0);
        }
        f0s.ok_or_else(|| F0Error::invalid_input("no key shift to analyse"))
    }

    /// Runs the whole chain: features, salience, decoding, optional test-time
    /// ensembling and post-processing.
    pub fn estimate_pitch(
        &mut self,
        waveform: ArrayView1<f32>,
        sample_rate: usize,
        config: &PitchConfig,
    ) -> Result<PitchContour> {
        config.validate()?;

        let (f0, f0_for_uv) = if config.test_time_augmentation {
            let mut shifts = config.shift_hypotheses.clone();
            let origin_added = config.use_origin_uv && !shifts.contains(&0.0);
            if origin_added {
                shifts.push(0.0);
            }
            shifts.sort_by(|a, b| tta_order(*a).partial_cmp(&tta_order(*b)).unwrap_or(Ordering::Equal));
            tracing::debug!(?shifts, origin_added, "test-time augmentation");

            let f0s = self.infer_f0s(waveform, sample_rate, &shifts, config)?;
            let skip = usize::from(origin_added);
            let f0 = ensemble_contour(f0s.slice(s![.., skip..]), &shifts[skip..], config.unvoiced_penalty)?;
            let f0_for_uv = if config.use_origin_uv {
                f0s.column(0).to_owned()
            } else {
                f0.clone()
            };
            (f0, f0_for_uv)
        } else {
            let f0 = self.infer_f0s(waveform, sample_rate, &[0.0], config)?.column(0).to_owned();
            (f0.clone(), f0)
        };

        let (f0, voiced) = post_process(f0.view(), f0_for_uv.view(), config)?;
        tracing::debug!(
            frames = f0.len(),
            voiced = voiced.iter().filter(|&&v| v).count(),
            "pitch estimated"
        );
        Ok(PitchContour { f0, voiced })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tta_order() {
        let mut shifts = vec![12.0f32, -12.0, 0.0, -24.0, 6.0];
        shifts.sort_by(|a, b| tta_order(*a).partial_cmp(&tta_order(*b)).unwrap_or(Ordering::Equal));
        assert_eq!(shifts, vec![0.0, -12.0, 6.0, 12.0, -24.0]);
    }

    #[test]
    fn test_contour_coarse() {
        let contour = PitchContour {
            f0: ndarray::arr1(&[0.0f32, 1100.0]),
            voiced: ndarray::arr1(&[false, true]),
        };
        assert_eq!(contour.len(), 2);
        assert_eq!(contour.coarse(50.0, 1100.0), ndarray::arr1(&[1, 255]));
    }
}
