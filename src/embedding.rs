//! Temporal embedding driven by autocovariance lags.
//!
//! Pipeline ([`temporal_embedding`]):
//!   1. [`autocovariance`] — biased sample autocovariance of every column up
//!      to `nlags`, computed through an FFT of the demeaned, zero-padded
//!      column.
//!   2. [`get_lags`] — per column, the lag at which the autocovariance curve
//!      first turns upward (a rough characteristic timescale).
//!   3. [`embed`] — append to every row the value each feature had `lag`
//!      rows earlier, dropping the first `max(lag)` rows.
use ndarray::{s, Array2, ArrayView2};
use rustfft::FftPlanner;
use tracing::{debug, warn};

use crate::error::{invalid, Result};
use crate::smooth::apply::zero_padded;
use crate::temporal::check_aligned;

/// Biased autocovariance of each column for lags `0..=nlags`.
///
/// `acov[k, j] = Σ_{t < n−k} (x[t, j] − m_j)(x[t+k, j] − m_j) / n`, where the
/// normalisation is the full sample count `n` for every lag.  Row 0 is the
/// population variance of the column.
///
/// # Errors
///
/// `nlags` must be smaller than the number of rows.
pub fn autocovariance(x: ArrayView2<'_, f64>, nlags: usize) -> Result<Array2<f64>> {
    let n = x.nrows();
    if nlags >= n {
        invalid!("nlags ({nlags}) must be smaller than the number of samples ({n})");
    }

    let n_fft = (2 * n - 1).next_power_of_two();
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);
    let scale = 1.0 / (n_fft as f64 * n as f64);

    let mut acov = Array2::<f64>::zeros((nlags + 1, x.ncols()));
    for (j, col) in x.columns().into_iter().enumerate() {
        let mean = col.sum() / n as f64;
        let demeaned: Vec<f64> = col.iter().map(|&v| v - mean).collect();

        let mut buf = zero_padded(&demeaned, n_fft);
        fft_fwd.process(&mut buf);
        // Power spectrum → circular autocorrelation; the 2n−1 padding makes
        // it equal to the linear one for lags < n.
        for b in buf.iter_mut() {
            *b = *b * b.conj();
        }
        fft_inv.process(&mut buf);

        for k in 0..=nlags {
            acov[[k, j]] = buf[k].re * scale;
        }
    }
    Ok(acov)
}

/// Pick one lag per column of an autocovariance matrix.
///
/// Scanning `j = 0, 1, …`: a decrease (`c[j+1] < c[j]`) makes `j + 1` the
/// running candidate; the first increase (`c[j+1] > c[j]`) selects `j` and
/// stops.  A curve that only decreases keeps the last decreasing lag.
///
/// A column whose curve never moves keeps lag 0; this usually means the
/// column is constant, and a warning is emitted for it.  Columns containing
/// NaN also keep lag 0, with their own warning, and with a single lag
/// (`nlags == 0`) every lag is 0.
pub fn get_lags(acov: ArrayView2<'_, f64>) -> Vec<usize> {
    let mut lags = vec![0usize; acov.ncols()];
    for (i, c) in acov.columns().into_iter().enumerate() {
        if c.iter().any(|v| v.is_nan()) {
            warn!(column = i, "autocovariance contains NaN, lag defaults to 0");
            continue;
        }
        if c.len() < 2 {
            continue;
        }
        let mut moved = false;
        for j in 0..c.len().saturating_sub(1) {
            if c[j + 1] < c[j] {
                lags[i] = j + 1;
                moved = true;
            }
            if c[j + 1] > c[j] {
                lags[i] = j;
                moved = true;
                break;
            }
        }
        if !moved {
            warn!(column = i, "flat autocovariance curve, lag defaults to 0");
        }
    }
    lags
}

/// Append lagged copies of each feature.
///
/// With `L = max(lags)`, output row `i − L` (for `i ≥ L`) is
/// `[x[i, 0], …, x[i, D−1], x[i − lags[0], 0], …, x[i − lags[D−1], D−1]]`.
/// The result has shape `(R − L, 2D)`; it is empty when `L ≥ R`.
pub fn embed(x: ArrayView2<'_, f64>, lags: &[usize]) -> Result<Array2<f64>> {
    let (n_rows, d) = x.dim();
    if lags.len() != d {
        invalid!("expected one lag per column ({d}), got {}", lags.len());
    }
    let max_lag = lags.iter().copied().max().unwrap_or(0);
    let n_out = n_rows.saturating_sub(max_lag);

    let mut out = Array2::<f64>::zeros((n_out, 2 * d));
    if n_out == 0 {
        return Ok(out);
    }
    out.slice_mut(s![.., ..d]).assign(&x.slice(s![max_lag.., ..]));
    for (j, &lag) in lags.iter().enumerate() {
        for r in 0..n_out {
            out[[r, d + j]] = x[[r + max_lag - lag, j]];
        }
    }
    Ok(out)
}

/// Autocovariance → lag selection → embedding, with labels trimmed to match.
///
/// The returned labels are the last `Xe.nrows()` entries of `y`, so row `k`
/// of the embedding still carries the label of the row it was built from.
pub fn temporal_embedding<T: Clone>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    nlags: usize,
) -> Result<(Array2<f64>, Vec<T>)> {
    let (xe, ye, _lags) = temporal_embedding_with_lags(x, y, nlags)?;
    Ok((xe, ye))
}

/// Same as [`temporal_embedding`] but also returns the selected lags.
pub fn temporal_embedding_with_lags<T: Clone>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    nlags: usize,
) -> Result<(Array2<f64>, Vec<T>, Vec<usize>)> {
    check_aligned(x, y)?;
    let acov = autocovariance(x, nlags)?;
    let lags = get_lags(acov.view());
    debug!(?lags, "selected embedding lags");

    let xe = embed(x, &lags)?;
    let ye = y[y.len() - xe.nrows()..].to_vec();
    Ok((xe, ye, lags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    /// Direct O(n·nlags) estimator used as reference.
    fn acov_direct(x: &[f64], nlags: usize) -> Vec<f64> {
        let n = x.len() as f64;
        let m = x.iter().sum::<f64>() / n;
        (0..=nlags)
            .map(|k| {
                (0..x.len() - k)
                    .map(|t| (x[t] - m) * (x[t + k] - m))
                    .sum::<f64>()
                    / n
            })
            .collect()
    }

    #[test]
    fn fft_autocovariance_matches_direct_sum() {
        let col: Vec<f64> = (0..97).map(|i| (i as f64 * 0.37).sin() + 0.01 * i as f64).collect();
        let x = Array2::from_shape_vec((97, 1), col.clone()).unwrap();
        let acov = autocovariance(x.view(), 20).unwrap();
        let expected = acov_direct(&col, 20);
        for k in 0..=20 {
            approx::assert_abs_diff_eq!(acov[[k, 0]], expected[k], epsilon = 1e-10);
        }
    }

    #[test]
    fn lag_zero_is_population_variance() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let acov = autocovariance(x.view(), 2).unwrap();
        approx::assert_abs_diff_eq!(acov[[0, 0]], 1.25, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(acov[[0, 1]], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn nlags_must_be_below_sample_count() {
        let x = Array2::<f64>::zeros((5, 1));
        assert!(autocovariance(x.view(), 5).is_err());
        assert!(autocovariance(x.view(), 4).is_ok());
    }

    #[test]
    fn lag_is_minimum_of_dip() {
        let curve = array![[5.0], [3.0], [1.5], [0.5], [1.0], [2.0]];
        assert_eq!(get_lags(curve.view()), vec![3]);
    }

    #[test]
    fn monotone_curve_keeps_last_decrease() {
        let curve = array![[4.0], [3.0], [2.0], [2.0], [1.0]];
        assert_eq!(get_lags(curve.view()), vec![4]);
    }

    #[test]
    fn flat_curve_defaults_to_zero() {
        let curve = Array2::from_elem((6, 2), 1.0);
        assert_eq!(get_lags(curve.view()), vec![0, 0]);
    }

    #[test]
    fn nan_column_and_single_lag_default_to_zero() {
        // The NaN sits after the dip of column 0, which must not matter.
        let curve = array![[5.0, 5.0], [3.0, 3.0], [1.0, 2.0], [2.0, f64::NAN]];
        assert_eq!(get_lags(curve.view()), vec![2, 0]);

        let x = Array2::from_shape_fn((12, 2), |(i, j)| (i * (j + 1)) as f64);
        let acov = autocovariance(x.view(), 0).unwrap();
        assert_eq!(get_lags(acov.view()), vec![0, 0]);
    }

    #[test]
    fn embed_shape_and_lagged_block() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i * 100 + j) as f64);
        let xe = embed(x.view(), &[2, 3]).unwrap();
        assert_eq!(xe.dim(), (7, 4));
        // Row 0 corresponds to input row 3.
        assert_eq!(xe.row(0).to_vec(), vec![300.0, 301.0, 100.0, 1.0]);
        let lagged: Array1<f64> = xe.column(2).to_owned();
        for r in 0..7 {
            assert_eq!(lagged[r], x[[r + 1, 0]]);
        }
    }

    #[test]
    fn embed_rejects_wrong_lag_count() {
        let x = Array2::<f64>::zeros((10, 3));
        assert!(embed(x.view(), &[1, 2]).is_err());
    }

    #[test]
    fn embedding_trims_labels_from_front() {
        let x = Array2::from_shape_fn((200, 2), |(i, j)| {
            (i as f64 * 0.2 * (j + 1) as f64).sin()
        });
        let y: Vec<usize> = (0..200).collect();
        let (xe, ye, lags) = temporal_embedding_with_lags(x.view(), &y, 30).unwrap();
        let max_lag = *lags.iter().max().unwrap();
        assert_eq!(xe.nrows(), 200 - max_lag);
        assert_eq!(ye.len(), xe.nrows());
        assert_eq!(ye[0], max_lag);
    }
}
