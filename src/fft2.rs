use ndarray::parallel::prelude::{IntoParallelIterator, ParallelIterator};
use ndarray::{Array1, Array2, ArrayViewMut1, ArrayViewMut2, Axis, Zip};
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// Unnormalised forward 2D DFT, the same convention as numpy's `fft2`.
///
/// Any shape is accepted; rustfft picks mixed radix or Bluestein plans for awkward lengths.
pub fn fft2(mut input: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft(input.shape()[1], FftDirection::Forward);
    let fft_col = planner.plan_fft(input.shape()[0], FftDirection::Forward);

    fft_lanes(input.view_mut(), Axis(1), &fft_row);
    fft_lanes(input.view_mut(), Axis(0), &fft_col);
    input
}

/// Unnormalised forward 1D DFT.
pub fn fft(input: &[Complex<f64>]) -> Array1<Complex<f64>> {
    let mut buffer = input.to_vec();
    if !buffer.is_empty() {
        let mut planner = FftPlanner::new();
        planner
            .plan_fft(buffer.len(), FftDirection::Forward)
            .process(&mut buffer);
    }
    Array1::from(buffer)
}

// Transforms every lane along `axis`. Lanes are copied through a buffer so strided columns
// and rows take the same path.
fn fft_lanes(mut input: ArrayViewMut2<Complex<f64>>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let len = input.len_of(axis);
    Zip::from(input.lanes_mut(axis)).into_par_iter().for_each_init(
        || {
            (
                vec![Zero::zero(); len],
                vec![Zero::zero(); fft.get_inplace_scratch_len()],
            )
        },
        |(buffer, scratch), mut lane| {
            debug_assert_eq!(lane.0.len(), buffer.len());
            for (b, &e) in buffer.iter_mut().zip(lane.0.iter()) {
                *b = e;
            }
            fft.process_with_scratch(buffer, scratch);
            for (e, &b) in lane.0.iter_mut().zip(buffer.iter()) {
                *e = b;
            }
        },
    );
}

/// Moves the origin (0, 0) to the "center" of the array (H/2, W/2)
///
/// Swaps the quadrants diagonally. Matches numpy's `fftshift` for both even and odd shapes.
pub fn fft2_shift_inplace<T: Copy + Send + Sync>(mut input: ArrayViewMut2<T>) {
    Zip::from(input.lanes_mut(Axis(1))).par_for_each(|row| {
        fft_shift_inplace(row);
    });

    Zip::from(input.lanes_mut(Axis(0))).par_for_each(|col| {
        fft_shift_inplace(col);
    });
}

/// Moves the origin (0) to the "center" of the array (N/2)
///
/// For even array lengths, which have no center value, this moves the value to the next value after the center
pub fn fft_shift_inplace<T: Copy>(mut input: ArrayViewMut1<T>) {
    if input.len() % 2 == 0 {
        return fft_shift_even(input);
    }

    let half = input.len() / 2;

    let mut i = input.len();
    let mut j = half;
    let mut temp = input[half];
    for _ in 0..half {
        i -= 1;
        j -= 1;
        std::mem::swap(&mut temp, &mut input[i]);

        std::mem::swap(&mut temp, &mut input[j]);
    }
    input[half] = temp;
}

fn fft_shift_even<T: Copy>(mut input: ArrayViewMut1<T>) {
    let half = input.len() / 2;
    for i in 0..half {
        input.swap(i, i + half);
    }
}
