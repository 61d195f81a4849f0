use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    Reflect,
    Constant,
}

/// Pads `arr` with `left` and `right` samples.
///
/// Reflect mode mirrors around the edge samples without repeating them, like
/// `numpy.pad(mode="reflect")`. It needs both pads shorter than the input; callers
/// check [`fits_reflect`] first.
pub fn pad_1d(arr: ArrayView1<f32>, left: usize, right: usize, mode: PadMode) -> Array1<f32> {
    let len = arr.len();
    let mut padded = Array1::zeros(len + left + right);
    padded.slice_mut(s![left..left + len]).assign(&arr);

    if mode == PadMode::Reflect {
        for i in 0..left {
            padded[left - i - 1] = arr[i + 1];
        }
        for i in 0..right {
            padded[len + left + i] = arr[len - i - 2];
        }
    }

    padded
}

pub fn fits_reflect(len: usize, left: usize, right: usize) -> bool {
    left < len && right < len
}

/// Repeats the last row or drops trailing rows so the result has exactly `n_rows`.
pub fn fit_rows(frames: ArrayView2<f32>, n_rows: usize) -> Array2<f32> {
    let current = frames.nrows();
    if current >= n_rows || current == 0 {
        return frames.slice(s![..n_rows.min(current), ..]).to_owned();
    }

    let last = frames.row(current - 1);
    let mut fitted = Array2::zeros((n_rows, frames.ncols()));
    fitted.slice_mut(s![..current, ..]).assign(&frames);
    for mut row in fitted.axis_iter_mut(Axis(0)).skip(current) {
        row.assign(&last);
    }
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_reflect() {
        let input = ndarray::arr1(&[1.0, 2.0, 3.0]);
        let output = pad_1d(input.view(), 2, 2, PadMode::Reflect);
        assert_eq!(output, ndarray::arr1(&[3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0]));

        let input = ndarray::arr1(&[4.0, 5.0]);
        let output = pad_1d(input.view(), 1, 1, PadMode::Reflect);
        assert_eq!(output, ndarray::arr1(&[5.0, 4.0, 5.0, 4.0]));
    }

    #[test]
    fn test_pad_reflect_asymmetric() {
        let input = ndarray::arr1(&[1.0, 2.0, 3.0, 4.0]);
        let output = pad_1d(input.view(), 1, 3, PadMode::Reflect);
        assert_eq!(output, ndarray::arr1(&[2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_pad_constant() {
        let input = ndarray::arr1(&[1.0, 2.0, 3.0]);
        let output = pad_1d(input.view(), 2, 1, PadMode::Constant);
        assert_eq!(output, ndarray::arr1(&[0.0, 0.0, 1.0, 2.0, 3.0, 0.0]));
    }

    #[test]
    fn test_fits_reflect() {
        assert!(fits_reflect(3, 2, 2));
        assert!(!fits_reflect(3, 3, 0));
        assert!(!fits_reflect(0, 0, 0));
    }

    #[test]
    fn test_fit_rows() {
        let frames = ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(fit_rows(frames.view(), 4), ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0], [3.0, 4.0], [3.0, 4.0]]));
        assert_eq!(fit_rows(frames.view(), 1), ndarray::arr2(&[[1.0, 2.0]]));
        assert_eq!(fit_rows(frames.view(), 2), frames);
    }
}
