use ndarray::{Array1, ArrayView1, Zip};

use rvc_common::{
    config::PitchConfig,
    errors::{F0Error, Result},
};

/// `true` where `f0_for_uv` is below `f0_min` (or not a number).
pub fn unvoiced_mask(f0_for_uv: ArrayView1<f32>, f0_min: f32) -> Array1<bool> {
    f0_for_uv.mapv(|f| !(f >= f0_min))
}

/// Replaces unvoiced frames by linear interpolation between the surrounding voiced
/// frames. Frames before the first or after the last voiced frame take that frame's
/// value. With no voiced frame at all the result is all zeros.
pub fn interpolate_unvoiced(f0: ArrayView1<f32>, uv: ArrayView1<bool>) -> Array1<f32> {
    let voiced: Vec<usize> = uv.iter().enumerate().filter(|(_, &u)| !u).map(|(i, _)| i).collect();
    let (first, last) = match (voiced.first(), voiced.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            tracing::debug!(frames = f0.len(), "no voiced frame to interpolate from");
            return Array1::zeros(f0.len());
        }
    };

    let mut out = f0.to_owned();
    for (i, value) in out.iter_mut().enumerate() {
        if !uv[i] {
            continue;
        }
        *value = if i < first {
            f0[first]
        } else if i > last {
            f0[last]
        } else {
            let next = voiced.partition_point(|&v| v < i);
            let (left, right) = (voiced[next - 1], voiced[next]);
            let frac = (i - left) as f32 / (right - left) as f32;
            f0[left] + frac * (f0[right] - f0[left])
        };
    }
    out
}

/// Linear resampling to `size` frames using pixel-centre alignment
/// (`src = (i + 0.5) * in / out - 0.5`, floored at 0). Zeros are treated as gaps:
/// any output touching one comes back as zero.
pub fn resample_to_length(f0: ArrayView1<f32>, size: usize) -> Array1<f32> {
    let len = f0.len();
    if len == 0 {
        return Array1::zeros(size);
    }
    let gapped = f0.mapv(|f| if f == 0.0 { f32::NAN } else { f });
    let scale = len as f32 / size as f32;

    let mut output = Array1::zeros(size);
    Zip::indexed(output.view_mut()).for_each(|idx, val| {
        let src = ((idx as f32 + 0.5) * scale - 0.5).max(0.0);
        let idx_floor = usize::min(src.floor() as usize, len - 1);
        let idx_ceil = usize::min(idx_floor + 1, len - 1);
        let frac = src - idx_floor as f32;
        *val = gapped[idx_floor] * (1.0 - frac) + gapped[idx_ceil] * frac;
    });
    output.mapv_inplace(|f| if f.is_nan() { 0.0 } else { f });
    output
}

/// Nearest-neighbour resampling of a frame mask (`src = floor(i * in / out)`).
pub fn resample_mask_nearest(mask: ArrayView1<bool>, size: usize) -> Array1<bool> {
    let len = mask.len();
    if len == 0 {
        return Array1::from_elem(size, true);
    }
    let scale = len as f64 / size as f64;
    Array1::from_shape_fn(size, |i| mask[usize::min((i as f64 * scale).floor() as usize, len - 1)])
}

/// Gates, optionally interpolates, clamps and resamples a decoded contour.
///
/// `f0_for_uv` supplies the voicing decision and is usually `f0` itself. Returns the
/// contour and its voiced mask, both of the target length when one is configured.
pub fn post_process(
    f0: ArrayView1<f32>,
    f0_for_uv: ArrayView1<f32>,
    config: &PitchConfig,
) -> Result<(Array1<f32>, Array1<bool>)> {
    if f0.len() != f0_for_uv.len() {
        return Err(F0Error::shape_mismatch(format!(
            "contour has {} frames, voicing source has {}",
            f0.len(),
            f0_for_uv.len()
        )));
    }

    let uv = unvoiced_mask(f0_for_uv, config.f0_min);
    let mut f0 = f0.to_owned();
    Zip::from(&mut f0).and(&uv).for_each(|f, &u| {
        if u {
            *f = 0.0;
        }
    });

    if config.interpolate_unvoiced {
        f0 = interpolate_unvoiced(f0.view(), uv.view());
    }
    if let Some(f0_max) = config.f0_max {
        f0.mapv_inplace(|f| if f > f0_max { f0_max } else { f });
    }

    let (f0, uv) = match config.target_frame_count {
        Some(size) if size != f0.len() => (
            resample_to_length(f0.view(), size),
            resample_mask_nearest(uv.view(), size),
        ),
        _ => (f0, uv),
    };
    Ok((f0, uv.mapv(|u| !u)))
}
