use ndarray::{Array1, ArrayView1, ArrayView2, Axis, Zip};
use ndarray_stats::QuantileExt;

use rvc_common::{
    enums::DecoderMode,
    errors::{F0Error, Result},
};

use super::{cent_to_f0, CentTable, CENT_REFERENCE_HZ};

/// Bins taken on each side of the argmax by the local decoder.
const LOCAL_HALF_WIDTH: usize = 4;

/// Cents emitted for an unvoiced frame; maps to exactly the reference frequency.
pub const UNVOICED_CENTS: f32 = 0.0;

fn weighted_cents(salience: ArrayView1<f32>, cents: ArrayView1<f32>) -> f32 {
    let weight_sum = salience.sum();
    if weight_sum > 0.0 {
        salience.dot(&cents) / weight_sum
    } else {
        UNVOICED_CENTS
    }
}

fn to_global_average_cents(salience: ArrayView1<f32>, cents_mapping: ArrayView1<f32>) -> f32 {
    weighted_cents(salience, cents_mapping)
}

fn to_local_average_cents(salience: ArrayView1<f32>, cents_mapping: ArrayView1<f32>, center: usize) -> f32 {
    let start = center.saturating_sub(LOCAL_HALF_WIDTH);
    let end = (center + LOCAL_HALF_WIDTH + 1).min(salience.len());
    weighted_cents(
        salience.slice(ndarray::s![start..end]),
        cents_mapping.slice(ndarray::s![start..end]),
    )
}

/// Per-frame `(cents, confidence)` of a `(T, n_class)` salience matrix.
///
/// Confidence is the frame maximum. Frames whose confidence is `<= threshold` get
/// [`UNVOICED_CENTS`] whatever their weighted average.
pub fn decode(
    salience: ArrayView2<f32>,
    cent_table: &CentTable,
    mode: DecoderMode,
    threshold: f32,
) -> Result<(Array1<f32>, Array1<f32>)> {
    if salience.ncols() != cent_table.len() {
        return Err(F0Error::shape_mismatch(format!(
            "salience has {} bins, cent table has {}",
            salience.ncols(),
            cent_table.len()
        )));
    }

    let n_frames = salience.nrows();
    let mut cents = Array1::zeros(n_frames);
    let mut confidence = Array1::zeros(n_frames);

    for (t, row) in salience.axis_iter(Axis(0)).enumerate() {
        let center = row
            .argmax()
            .map_err(|e| F0Error::invalid_input(format!("salience frame {}: {}", t, e)))?;
        confidence[t] = row[center];
        cents[t] = match mode {
            DecoderMode::Global => to_global_average_cents(row, cent_table.view()),
            DecoderMode::Local => to_local_average_cents(row, cent_table.view(), center),
        };
    }

    Zip::from(&mut cents).and(&confidence).for_each(|c, &conf| {
        if conf <= threshold {
            *c = UNVOICED_CENTS;
        }
    });
    Ok((cents, confidence))
}

/// Cents to Hz, with the reference frequency itself meaning unvoiced (0 Hz).
pub fn cents_to_hz(cents: ArrayView1<f32>) -> Array1<f32> {
    cents.mapv(|c| {
        let f0 = cent_to_f0(c);
        if f0 == CENT_REFERENCE_HZ {
            0.0
        } else {
            f0
        }
    })
}

/// [`decode`] followed by [`cents_to_hz`].
pub fn decode_f0(
    salience: ArrayView2<f32>,
    cent_table: &CentTable,
    mode: DecoderMode,
    threshold: f32,
) -> Result<Array1<f32>> {
    let (cents, _) = decode(salience, cent_table, mode, threshold)?;
    Ok(cents_to_hz(cents.view()))
}
