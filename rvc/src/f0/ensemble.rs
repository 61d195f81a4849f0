//! Viterbi-style selection of one F0 hypothesis per frame.
//!
//! Every frame offers `H` candidate contours, one per key shift the audio was
//! analysed at. The chosen path minimizes the sum of an unvoiced penalty, a
//! squared note jump between voiced frames, and a larger penalty for switching
//! from an unvoiced to a voiced candidate.

use ndarray::{s, Array1, Array2, ArrayView2, ArrayView3, Axis};

use rvc_common::errors::{F0Error, Result};

/// Semitone jumps smaller than this (squared) cost nothing.
const NOTE_JUMP_TOLERANCE: f32 = 0.5;

fn hz_to_note(f0: f32) -> f32 {
    let note = 12.0 * (f0 / 440.0).log2() + 69.0;
    if note.is_nan() || note < 0.0 {
        0.0
    } else {
        note
    }
}

/// Cost of moving from a candidate with note `prev` to one with note `cur`.
/// A note of zero is unvoiced.
fn transition_cost(prev: f32, cur: f32, uv_penalty: f32) -> f32 {
    let prev_uv = prev <= 0.0;
    let cur_uv = cur <= 0.0;
    let mut cost = 0.0;
    if cur_uv {
        cost += uv_penalty;
    }
    if !prev_uv && !cur_uv {
        let jump = (prev - cur).powi(2) - NOTE_JUMP_TOLERANCE;
        cost += jump.max(0.0);
    }
    if prev_uv && !cur_uv {
        cost += 2.0 * uv_penalty;
    }
    cost
}

/// Ensembles a single `(T, H)` contour. See [`ensemble_f0`].
pub fn ensemble_contour(f0s: ArrayView2<f32>, key_shifts: &[f32], unvoiced_penalty: f32) -> Result<Array1<f32>> {
    let (n_frames, n_hyp) = f0s.dim();
    if n_hyp != key_shifts.len() {
        return Err(F0Error::shape_mismatch(format!(
            "{} hypotheses for {} key shifts",
            n_hyp,
            key_shifts.len()
        )));
    }
    if n_hyp == 0 {
        return Err(F0Error::invalid_input("at least one hypothesis is required"));
    }
    if n_frames == 0 {
        return Ok(Array1::zeros(0));
    }

    let mut corrected = f0s.to_owned();
    for (mut column, &shift) in corrected.axis_iter_mut(Axis(1)).zip(key_shifts) {
        let factor = 2.0f32.powf(shift / 12.0);
        column.mapv_inplace(|f| f / factor);
    }
    let notes = corrected.mapv(hz_to_note);
    let uv_penalty = unvoiced_penalty * unvoiced_penalty;

    let mut cost = notes.row(0).mapv(|n| if n <= 0.0 { uv_penalty } else { 0.0 });
    let mut backtrack = Array2::<usize>::zeros((n_frames, n_hyp));

    for t in 1..n_frames {
        let prev_notes = notes.row(t - 1);
        let mut next = Array1::<f32>::zeros(n_hyp);
        for (j, &cur) in notes.row(t).iter().enumerate() {
            let mut best = f32::INFINITY;
            let mut best_i = 0;
            for (i, &prev) in prev_notes.iter().enumerate() {
                let candidate = cost[i] + transition_cost(prev, cur, uv_penalty);
                // strict comparison keeps the lowest index on ties
                if candidate < best {
                    best = candidate;
                    best_i = i;
                }
            }
            next[j] = best;
            backtrack[[t, j]] = best_i;
        }
        cost = next;
    }

    let mut state = cost
        .iter()
        .enumerate()
        .fold((0, f32::INFINITY), |(bi, bv), (i, &v)| if v < bv { (i, v) } else { (bi, bv) })
        .0;
    let mut result = Array1::zeros(n_frames);
    for t in (0..n_frames).rev() {
        result[t] = corrected[[t, state]];
        state = backtrack[[t, state]];
    }
    Ok(result)
}

/// Picks, for each batch item, the lowest-cost path through the `(B, T, H)`
/// hypotheses and returns the `(B, T)` shift-corrected F0 along it.
///
/// Hypothesis `h` was produced by analysing audio shifted by `key_shifts[h]`
/// semitones, so its values are divided by `2^(key_shifts[h] / 12)` first.
pub fn ensemble_f0(f0s: ArrayView3<f32>, key_shifts: &[f32], unvoiced_penalty: f32) -> Result<Array2<f32>> {
    let (batch, n_frames, _) = f0s.dim();
    let mut out = Array2::zeros((batch, n_frames));
    for (b, item) in f0s.outer_iter().enumerate() {
        let contour = ensemble_contour(item, key_shifts, unvoiced_penalty)?;
        out.slice_mut(s![b, ..]).assign(&contour);
    }
    Ok(out)
}
