//! 1D cuts through 2D arrays.

use crate::error::{invalid, Result};
use crate::fft2::{fft, fft_shift_inplace};
use crate::grid::Axis1D;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use num_complex::Complex;

/// A slice of a 2D array together with the coordinates of each sample.
#[derive(Clone, Debug)]
pub struct Profile1D {
    pub values: Array1<f64>,
    pub axis: Axis1D,
}

/// Copy of row `row` (default: the centre row, `H/2`).
pub fn row_profile(arr: ArrayView2<f64>, row: Option<usize>) -> Result<Array1<f64>> {
    lane(arr, Axis(0), row)
}

/// Copy of column `col` (default: the centre column, `W/2`).
pub fn col_profile(arr: ArrayView2<f64>, col: Option<usize>) -> Result<Array1<f64>> {
    lane(arr, Axis(1), col)
}

fn lane(arr: ArrayView2<f64>, axis: Axis, index: Option<usize>) -> Result<Array1<f64>> {
    let len = arr.len_of(axis);
    let index = index.unwrap_or(len / 2);
    if index >= len {
        return invalid(format!(
            "index {} is outside an axis of length {}",
            index, len
        ));
    }
    Ok(arr.index_axis(axis, index).to_owned())
}

/// Magnitude of the 1D DFT of a profile, zero frequency moved to `len/2`.
pub fn spectrum_1d(profile: ArrayView1<f64>) -> Array1<f64> {
    let input: Vec<Complex<f64>> = profile.iter().map(|&v| Complex::new(v, 0.0)).collect();
    let mut spectrum = fft(&input);
    fft_shift_inplace(spectrum.view_mut());
    spectrum.mapv(|v| v.norm())
}

#[cfg(test)]
mod tests {
    use super::{col_profile, row_profile, spectrum_1d};
    use crate::error::Error;
    use ndarray::{arr1, Array2};

    #[test]
    fn centre_slices() {
        let arr = Array2::from_shape_fn((4, 5), |(i, j)| (i * 10 + j) as f64);
        assert_eq!(row_profile(arr.view(), None).unwrap().to_vec(), vec![20., 21., 22., 23., 24.]);
        assert_eq!(col_profile(arr.view(), None).unwrap().to_vec(), vec![2., 12., 22., 32.]);
        assert_eq!(row_profile(arr.view(), Some(0)).unwrap()[4], 4.0);
        assert_eq!(col_profile(arr.view(), Some(4)).unwrap()[3], 34.0);
    }

    #[test]
    fn out_of_range_index() {
        let arr = Array2::<f64>::zeros((4, 5));
        assert!(matches!(
            row_profile(arr.view(), Some(4)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(col_profile(arr.view(), Some(5)).is_err());
        assert!(col_profile(arr.view(), Some(4)).is_ok());
    }

    #[test]
    fn spectrum_of_a_box() {
        // 4 open samples out of 16: |sin(πk/4) / sin(πk/16)|, zeros every 4 bins
        let mut profile = arr1(&[0.0; 16]);
        for i in 6..10 {
            profile[i] = 1.0;
        }
        let spectrum = spectrum_1d(profile.view());
        assert_eq!(spectrum.len(), 16);
        assert!((spectrum[8] - 4.0).abs() < 1e-9);
        for &k in &[0usize, 4, 12] {
            assert!(spectrum[k] < 1e-9, "{}: {}", k, spectrum[k]);
        }
        // magnitude is even about the centre
        for k in 1..8 {
            assert!((spectrum[8 + k] - spectrum[8 - k]).abs() < 1e-9);
        }
    }

    #[test]
    fn spectrum_of_odd_length() {
        let spectrum = spectrum_1d(arr1(&[1.0, 1.0, 1.0, 1.0, 1.0]).view());
        assert!((spectrum[2] - 5.0).abs() < 1e-9);
        assert!(spectrum.iter().enumerate().all(|(i, &v)| i == 2 || v < 1e-9));
    }
}
