use ndarray::{Array1, ArrayView1};
use rubato::{FftFixedInOut, Resampler};

use rvc_common::{
    config::MAX_SAMPLE_RATE,
    errors::{F0Error, Result},
};

use crate::cache::{BoundedCache, DEFAULT_CAPACITY};

const CHUNK_SIZE: usize = 1024;

fn resample_error(err: impl std::fmt::Display) -> F0Error {
    F0Error::Resample(err.to_string())
}

/// Offline band-limited resampler with one FFT kernel per `(from, to)` rate pair.
pub struct ResampleCache {
    kernels: BoundedCache<(usize, usize), FftFixedInOut<f32>>,
}

impl ResampleCache {
    pub fn new(capacity: usize) -> Self {
        ResampleCache {
            kernels: BoundedCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Output has `ceil(len * to / from)` samples with the filter delay removed.
    pub fn resample(&mut self, input: ArrayView1<f32>, from: usize, to: usize) -> Result<Array1<f32>> {
        if from == 0 || to == 0 || from > MAX_SAMPLE_RATE || to > MAX_SAMPLE_RATE {
            return Err(F0Error::invalid_input(format!("cannot resample from {} Hz to {} Hz", from, to)));
        }
        if from == to {
            return Ok(input.to_owned());
        }

        let resampler = self.kernels.get_or_try_insert_with((from, to), || {
            tracing::debug!(from, to, "building resample kernel");
            FftFixedInOut::<f32>::new(from, to, CHUNK_SIZE, 1).map_err(resample_error)
        })?;
        resampler.reset();

        let samples = input.to_vec();
        let expected = ((samples.len() as u64 * to as u64 + from as u64 - 1) / from as u64) as usize;
        let delay = resampler.output_delay();
        let mut output: Vec<f32> = Vec::with_capacity(expected + delay + resampler.output_frames_max());

        let mut pos = 0;
        loop {
            let needed = resampler.input_frames_next();
            if pos + needed > samples.len() {
                break;
            }
            let chunk = resampler
                .process(&[&samples[pos..pos + needed]], None)
                .map_err(resample_error)?;
            output.extend_from_slice(&chunk[0]);
            pos += needed;
        }

        let tail = [&samples[pos..]];
        let chunk = resampler.process_partial(Some(&tail[..]), None).map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);

        while output.len() < expected + delay {
            let chunk = resampler
                .process_partial(None::<&[&[f32]]>, None)
                .map_err(resample_error)?;
            if chunk[0].is_empty() {
                break;
            }
            output.extend_from_slice(&chunk[0]);
        }

        let end = (expected + delay).min(output.len());
        let start = delay.min(end);
        let mut resampled = output[start..end].to_vec();
        resampled.resize(expected, 0.0);
        Ok(Array1::from(resampled))
    }
}

impl Default for ResampleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
