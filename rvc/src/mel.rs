use mel_spec::mel;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_complex::Complex32;
use rustfft::FftPlanner;

use rvc_common::{
    config::{MelConfig, MAX_KEY_SHIFT, MAX_SAMPLE_RATE},
    errors::{F0Error, Result},
};

use crate::{
    cache::{BoundedCache, DEFAULT_CAPACITY},
    ndarray_ext::{fit_rows, fits_reflect, pad_1d, PadMode},
    resample::ResampleCache,
};

/// Log-mel front end shared by every pitch-shift hypothesis.
///
/// Owns the resample kernels, the Hann windows (keyed by effective window length)
/// and the FFT plans, so one extractor must not be driven from several threads.
pub struct MelExtractor {
    config: MelConfig,
    mel_basis: Array2<f32>,
    hann_window_cache: BoundedCache<usize, Array1<f32>>,
    resample_cache: ResampleCache,
    planner: FftPlanner<f32>,
}

pub fn get_hann_window_periodic(window_length: usize) -> Array1<f32> {
    if window_length == 1 {
        return Array1::ones(1);
    }
    Array1::from_shape_fn(window_length, |i| {
        0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / window_length as f64).cos()) as f32
    })
}

/// Magnitude STFT, time-major: `(frames, fft_size / 2 + 1)`.
///
/// With `center` the signal is padded by `fft_size / 2` on both sides. Without it the
/// pad is `(win - hop) / 2` on the left and at least `(win - hop + 1) / 2` on the right,
/// grown so a short signal still fills one window.
fn stft_magnitude(
    planner: &mut FftPlanner<f32>,
    signal: ArrayView1<f32>,
    fft_size: usize,
    hop_length: usize,
    window: ArrayView1<f32>,
    center: bool,
    eps: f32,
) -> Array2<f32> {
    let len = signal.len();
    let win_length = window.len();

    let (left, right) = if center {
        (fft_size / 2, fft_size / 2)
    } else {
        let left = win_length.saturating_sub(hop_length) / 2;
        let right = ((win_length + 1).saturating_sub(hop_length) / 2)
            .max(win_length.saturating_sub(len + left));
        (left, right)
    };
    let mode = if fits_reflect(len, left, right) {
        PadMode::Reflect
    } else {
        PadMode::Constant
    };
    let mut padded = pad_1d(signal, left, right, mode);
    if padded.len() < fft_size {
        padded = pad_1d(padded.view(), 0, fft_size - padded.len(), PadMode::Constant);
    }

    let mut full_window = Array1::zeros(fft_size);
    let offset = (fft_size - win_length) / 2;
    full_window.slice_mut(s![offset..offset + win_length]).assign(&window);

    let n_frames = 1 + (padded.len() - fft_size) / hop_length;
    let n_bins = fft_size / 2 + 1;
    let fft = planner.plan_fft_forward(fft_size);

    let mut magnitude = Array2::zeros((n_frames, n_bins));
    let mut buffer = vec![Complex32::new(0.0, 0.0); fft_size];
    for (t, mut row) in magnitude.axis_iter_mut(Axis(0)).enumerate() {
        let frame = padded.slice(s![t * hop_length..t * hop_length + fft_size]);
        for ((slot, &x), &w) in buffer.iter_mut().zip(frame.iter()).zip(full_window.iter()) {
            *slot = Complex32::new(x * w, 0.0);
        }
        fft.process(&mut buffer);
        for (m, c) in row.iter_mut().zip(buffer.iter()) {
            *m = (c.norm_sqr() + eps).sqrt();
        }
    }

    magnitude
}

/// Crops or zero-pads the frequency axis to `n_bins` and rescales by `scale`.
fn match_bins(magnitude: ArrayView2<f32>, n_bins: usize, scale: f32) -> Array2<f32> {
    let available = magnitude.ncols().min(n_bins);
    let mut matched = Array2::zeros((magnitude.nrows(), n_bins));
    matched
        .slice_mut(s![.., ..available])
        .assign(&magnitude.slice(s![.., ..available]));
    matched.mapv_inplace(|x| x * scale);
    matched
}

impl MelExtractor {
    pub fn new(config: MelConfig) -> Result<Self> {
        config.validate()?;

        let basis = mel::mel(
            config.sample_rate as f64,
            config.n_fft,
            config.n_mels,
            Some(config.f_min),
            Some(config.f_max),
            config.htk,
            true,
        );
        let (rows, cols) = basis.dim();
        if rows != config.n_mels || cols != config.n_fft / 2 + 1 {
            return Err(F0Error::shape_mismatch(format!(
                "mel basis is {}x{}, expected {}x{}",
                rows,
                cols,
                config.n_mels,
                config.n_fft / 2 + 1
            )));
        }
        let mel_basis = Array2::from_shape_vec((rows, cols), basis.iter().map(|&x| x as f32).collect())?;

        Ok(MelExtractor {
            config,
            mel_basis,
            hann_window_cache: BoundedCache::new(DEFAULT_CAPACITY),
            resample_cache: ResampleCache::new(DEFAULT_CAPACITY),
            planner: FftPlanner::new(),
        })
    }

    pub fn config(&self) -> &MelConfig {
        &self.config
    }

    pub fn mel_basis(&self) -> ArrayView2<f32> {
        self.mel_basis.view()
    }

    pub fn window_cache_len(&self) -> usize {
        self.hann_window_cache.len()
    }

    pub fn resample_cache_len(&self) -> usize {
        self.resample_cache.len()
    }

    /// Frames produced for `n_samples` at the extractor's own sample rate.
    pub fn n_frames(&self, n_samples: usize) -> usize {
        n_samples / self.config.hop_length + 1
    }

    /// Log-mel frames `(n_frames, feature_dim)` of `waveform`.
    ///
    /// The frame count only depends on the resampled length, never on `key_shift`,
    /// so frames of different shift hypotheses stay aligned. It is counted at
    /// `config.sample_rate`: one second of 44.1 kHz audio gives the same frames as one
    /// second at 16 kHz, not `44100 / hop + 1`.
    pub fn extract(
        &mut self,
        waveform: ArrayView1<f32>,
        sample_rate: usize,
        key_shift: f32,
        center: bool,
    ) -> Result<Array2<f32>> {
        if waveform.is_empty() {
            return Err(F0Error::invalid_input("waveform is empty"));
        }
        if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
            return Err(F0Error::invalid_input(format!(
                "sample rate {} is outside 1..={}",
                sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if !(key_shift.abs() <= MAX_KEY_SHIFT) {
            return Err(F0Error::invalid_input(format!(
                "key shift {} is outside ±{} semitones",
                key_shift, MAX_KEY_SHIFT
            )));
        }
        if waveform.iter().any(|x| !x.is_finite()) {
            return Err(F0Error::invalid_input("waveform contains non-finite samples"));
        }

        let audio = self
            .resample_cache
            .resample(waveform, sample_rate, self.config.sample_rate)?;

        let factor = 2.0f64.powf(key_shift as f64 / 12.0);
        let fft_size = (self.config.n_fft as f64 * factor).round() as usize;
        let win_length = (self.config.win_length as f64 * factor).round() as usize;
        let max_size = self.config.n_fft << 4;
        if fft_size < 2 || win_length == 0 || fft_size > max_size || win_length > max_size {
            return Err(F0Error::invalid_input(format!(
                "key shift {} leaves no analysis window",
                key_shift
            )));
        }

        let window = self.hann_window_cache.get_or_insert_with(win_length, || {
            tracing::trace!(win_length, "building hann window");
            get_hann_window_periodic(win_length)
        });

        let mut magnitude = stft_magnitude(
            &mut self.planner,
            audio.view(),
            fft_size,
            self.config.hop_length,
            window.view(),
            center,
            self.config.magnitude_eps,
        );

        if key_shift != 0.0 {
            let scale = self.config.win_length as f32 / win_length as f32;
            magnitude = match_bins(magnitude.view(), self.config.n_fft / 2 + 1, scale);
        }

        let features = if self.config.linear_spectrum {
            magnitude.slice(s![.., ..self.config.n_fft / 2]).to_owned()
        } else {
            magnitude.dot(&self.mel_basis.t())
        };
        let clamp = self.config.clamp;
        let features = features.mapv(|x| x.max(clamp).ln());

        let n_frames = self.n_frames(audio.len());
        tracing::trace!(n_frames, fft_size, win_length, key_shift, "extracted features");
        Ok(fit_rows(features.view(), n_frames))
    }
}
