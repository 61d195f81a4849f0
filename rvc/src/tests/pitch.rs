#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, ArrayView2};

    use rvc_common::{
        config::PitchConfig,
        enums::{DecoderMode, PitchAlgorithm},
        errors::{F0Error, Result},
    };

    use crate::{
        f0::N_CLASS,
        tests::{fraction_within, get_estimator, sine},
        PitchEstimator,
    };

    #[test]
    fn test_pitch_sine_220() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 16000);

        let contour = estimator.estimate_pitch(input.view(), 16000, &PitchConfig::default()).unwrap();
        assert_eq!(contour.len(), 101);
        assert!(fraction_within(&contour.f0, 220.0, 0.02) >= 0.9);

        let voiced = contour.voiced.iter().filter(|&&v| v).count();
        assert!(voiced as f32 >= 0.95 * contour.len() as f32);
        for (&f, &v) in contour.f0.iter().zip(contour.voiced.iter()) {
            assert_eq!(v, f > 0.0);
        }
    }

    #[test]
    fn test_pitch_global_decoder() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 16000);
        let config = PitchConfig {
            decoder: DecoderMode::Global,
            ..Default::default()
        };
        let contour = estimator.estimate_pitch(input.view(), 16000, &config).unwrap();
        assert!(fraction_within(&contour.f0, 220.0, 0.02) >= 0.9);
    }

    #[test]
    fn test_pitch_silence() {
        let mut estimator = get_estimator();
        let input = Array1::zeros(16000);
        let contour = estimator.estimate_pitch(input.view(), 16000, &PitchConfig::default()).unwrap();
        assert_eq!(contour.f0, Array1::<f32>::zeros(101));
        assert!(contour.voiced.iter().all(|&v| !v));

        // nothing to interpolate from either
        let config = PitchConfig {
            interpolate_unvoiced: true,
            ..Default::default()
        };
        let contour = estimator.estimate_pitch(input.view(), 16000, &config).unwrap();
        assert_eq!(contour.f0, Array1::<f32>::zeros(101));
    }

    #[test]
    fn test_pitch_target_length() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 16000);
        let config = PitchConfig {
            target_frame_count: Some(250),
            ..Default::default()
        };
        let contour = estimator.estimate_pitch(input.view(), 16000, &config).unwrap();
        assert_eq!(contour.f0.len(), 250);
        assert_eq!(contour.voiced.len(), 250);
        assert!(fraction_within(&contour.f0, 220.0, 0.02) >= 0.9);
    }

    #[test]
    fn test_pitch_resampled_input() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 44100, 44100);
        let contour = estimator.estimate_pitch(input.view(), 44100, &PitchConfig::default()).unwrap();
        assert_eq!(contour.len(), 101);
        assert!(fraction_within(&contour.f0, 220.0, 0.02) >= 0.9);
    }

    #[test]
    fn test_pitch_clamped_to_f0_max() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 16000);
        let config = PitchConfig {
            f0_max: Some(200.0),
            ..Default::default()
        };
        let contour = estimator.estimate_pitch(input.view(), 16000, &config).unwrap();
        assert!(contour.f0.iter().all(|&f| f <= 200.0));
        assert!(fraction_within(&contour.f0, 200.0, 1e-6) >= 0.9);
    }

    #[test]
    fn test_infer_f0s_hypotheses_aligned() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 12345);
        let f0s = estimator
            .infer_f0s(input.view(), 16000, &[0.0, -12.0, 12.0], &PitchConfig::default())
            .unwrap();
        assert_eq!(f0s.dim(), (12345 / 160 + 1, 3));
        // shifted analyses read the tone an octave off
        assert!(fraction_within(&f0s.column(1).to_owned(), 110.0, 0.02) >= 0.9);
        assert!(fraction_within(&f0s.column(2).to_owned(), 440.0, 0.02) >= 0.9);
    }

    #[test]
    fn test_model_frame_mismatch() {
        let model = |frames: ArrayView2<f32>| -> Result<Array2<f32>> {
            Ok(Array2::zeros((frames.nrows() + 1, N_CLASS)))
        };
        let mut estimator = PitchEstimator::new(model, PitchAlgorithm::Rmvpe).unwrap();
        let input = sine(220.0, 16000, 1600);
        assert!(matches!(
            estimator.estimate_pitch(input.view(), 16000, &PitchConfig::default()),
            Err(F0Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_model_bin_mismatch() {
        let model = |frames: ArrayView2<f32>| -> Result<Array2<f32>> { Ok(Array2::zeros((frames.nrows(), 64))) };
        let mut estimator = PitchEstimator::new(model, PitchAlgorithm::Fcpe).unwrap();
        let input = sine(220.0, 16000, 1600);
        assert!(matches!(
            estimator.estimate_pitch(input.view(), 16000, &PitchConfig::default()),
            Err(F0Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 1600);
        let config = PitchConfig {
            target_frame_count: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            estimator.estimate_pitch(input.view(), 16000, &config),
            Err(F0Error::InvalidInput(_))
        ));
        assert!(estimator
            .estimate_pitch(Array1::zeros(0).view(), 16000, &PitchConfig::default())
            .is_err());
    }

    #[test]
    fn test_extreme_shift_and_rate_rejected() {
        let mut estimator = get_estimator();
        let input = sine(220.0, 16000, 1600);
        let config = PitchConfig {
            test_time_augmentation: true,
            shift_hypotheses: vec![0.0, 1000.0],
            ..Default::default()
        };
        assert!(matches!(
            estimator.estimate_pitch(input.view(), 16000, &config),
            Err(F0Error::InvalidInput(_))
        ));
        assert!(matches!(
            estimator.estimate_pitch(input.view(), 4_294_967_291, &PitchConfig::default()),
            Err(F0Error::InvalidInput(_))
        ));
    }
}
