//! Reflect-padded FIR smoothing.
//!
//! The signal is extended with `window_len − 1` mirrored samples on each
//! side (the edge sample itself is not repeated), then convolved in `valid`
//! mode with the unit-sum window.  The output is therefore
//! `len + window_len − 1` samples long; trimming back to the input length
//! is left to the caller.
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Dimension};
use rustfft::{num_complex::Complex, FftPlanner};

use super::window::Window;
use crate::error::{invalid, Result};

/// Smooth a 1-D signal with the requested window.
///
/// `x` may have any dimensionality so that passing a matrix is reported as
/// an error instead of being rejected at compile time.
///
/// # Errors
///
/// * `x` is not one-dimensional.
/// * `x` is shorter than `window_len`.
///
/// A `window_len` below 3 returns the input unchanged.
///
/// # Examples
///
/// ```
/// use ndarray::Array1;
/// use putils::{smooth, Window};
///
/// let x = Array1::linspace(0.0, 1.0, 50);
/// let y = smooth(&x, 11, Window::Hanning).unwrap();
/// assert_eq!(y.len(), 50 + 11 - 1);
/// ```
pub fn smooth<S, D>(x: &ArrayBase<S, D>, window_len: usize, window: Window) -> Result<Array1<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if x.ndim() != 1 {
        invalid!("smooth only accepts 1-D arrays, got {} dimensions", x.ndim());
    }
    let x: Vec<f64> = x.iter().copied().collect();
    if x.len() < window_len {
        invalid!(
            "input length {} is smaller than the window length {window_len}",
            x.len()
        );
    }
    if window_len < 3 {
        return Ok(Array1::from(x));
    }

    let padded = reflect_pad(&x, window_len - 1);
    let mut w = window.coefficients(window_len);
    let sum: f64 = w.iter().sum();
    w.iter_mut().for_each(|v| *v /= sum);

    Ok(Array1::from(convolve_valid(&padded, &w)))
}

/// Smooth every column of `x` independently.
///
/// The result has `x.nrows() + window_len − 1` rows (or `x.nrows()` when
/// `window_len < 3`) and the same column order.
pub fn smooth_array(x: ArrayView2<'_, f64>, window_len: usize, window: Window) -> Result<Array2<f64>> {
    let n_cols = x.ncols();
    let n_out = if window_len < 3 { x.nrows() } else { x.nrows() + window_len - 1 };

    let mut out = Array2::<f64>::zeros((n_out, n_cols));
    for (j, col) in x.columns().into_iter().enumerate() {
        let smoothed = smooth(&col, window_len, window)?;
        out.column_mut(j).assign(&smoothed);
    }
    Ok(out)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Mirror `n_edge` samples around each end, excluding the end sample.
///
/// Left:  `x[n_edge], …, x[1]`
/// Right: `x[len−2], …, x[len−1−n_edge]`
///
/// Requires `n_edge < x.len()`.
fn reflect_pad(x: &[f64], n_edge: usize) -> Vec<f64> {
    let n = x.len();
    let mut out = Vec::with_capacity(n + 2 * n_edge);
    out.extend((1..=n_edge).rev().map(|i| x[i]));
    out.extend_from_slice(x);
    out.extend((1..=n_edge).map(|i| x[n - 1 - i]));
    out
}

/// Linear convolution of `s` with `w`, keeping only the samples where the
/// kernel fully overlaps the signal (`s.len() − w.len() + 1` of them).
pub(crate) fn convolve_valid(s: &[f64], w: &[f64]) -> Vec<f64> {
    let n_full = s.len() + w.len() - 1;
    let n_fft = n_full.next_power_of_two();

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);

    let mut s_buf = zero_padded(s, n_fft);
    let mut w_buf = zero_padded(w, n_fft);
    fft_fwd.process(&mut s_buf);
    fft_fwd.process(&mut w_buf);

    for (a, &b) in s_buf.iter_mut().zip(w_buf.iter()) {
        *a *= b;
    }
    fft_inv.process(&mut s_buf);

    let inv_scale = 1.0 / n_fft as f64;
    s_buf[w.len() - 1..s.len()]
        .iter()
        .map(|c| c.re * inv_scale)
        .collect()
}

/// Copy `x` into a complex buffer of length `n`, zero-filling the tail.
pub(crate) fn zero_padded(x: &[f64], n: usize) -> Vec<Complex<f64>> {
    x.iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n)
        .collect()
}
