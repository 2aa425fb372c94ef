//! Windowed resampling of aligned feature/label sequences.
//!
//! Each resampler slides a window of `n` rows over `x` (rows in temporal
//! order) and `y`, and emits one derived row per valid window placement:
//!
//! - [`temporal_smoothing`]  — centred window, mean row, centre label.
//! - [`temporal_average`]    — non-overlapping windows, mean row, kept only
//!   when the window's labels all agree.
//! - [`temporal_expansion`]  — centred window, rows concatenated side by side.
use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array2, ArrayView2, Axis};

use crate::error::{invalid, Error, Result};

/// Resampler selected by [`temporal_processing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalMode {
    Smooth,
    Average,
    Expand,
    /// Reserved name; selecting it yields [`Error::Unsupported`].
    WeightedSmooth,
}

impl TemporalMode {
    pub const ALL: [TemporalMode; 4] = [
        TemporalMode::Smooth,
        TemporalMode::Average,
        TemporalMode::Expand,
        TemporalMode::WeightedSmooth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemporalMode::Smooth => "smooth",
            TemporalMode::Average => "average",
            TemporalMode::Expand => "expand",
            TemporalMode::WeightedSmooth => "weighted_smooth",
        }
    }
}

impl fmt::Display for TemporalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemporalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TemporalMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = TemporalMode::ALL.iter().map(|m| m.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown processing mode '{s}', expected one of {}",
                    names.join(", ")
                ))
            })
    }
}

/// Run the resampler named by `mode`.
pub fn temporal_processing<T: Clone + PartialEq>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    mode: TemporalMode,
    n: usize,
) -> Result<(Array2<f64>, Vec<T>)> {
    match mode {
        TemporalMode::Smooth => temporal_smoothing(x, y, n),
        TemporalMode::Average => temporal_average(x, y, n),
        TemporalMode::Expand => temporal_expansion(x, y, n),
        TemporalMode::WeightedSmooth => Err(Error::Unsupported(
            "temporal processing mode 'weighted_smooth' is not implemented".into(),
        )),
    }
}

/// Centred moving average of width `n` (odd).
///
/// Output row `k` is the mean of rows `k..k+n` and carries the label of row
/// `k + (n−1)/2`.  The output has `x.nrows() − (n−1)` rows.
pub fn temporal_smoothing<T: Clone>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    n: usize,
) -> Result<(Array2<f64>, Vec<T>)> {
    check_aligned(x, y)?;
    check_odd(n, "sliding window size")?;

    let margin = (n - 1) / 2;
    let n_out = x.nrows().saturating_sub(n - 1);
    let mut xn = Array2::<f64>::zeros((n_out, x.ncols()));
    let mut yn = Vec::with_capacity(n_out);

    for k in 0..n_out {
        let window = x.slice(s![k..k + n, ..]);
        xn.row_mut(k).assign(&window.sum_axis(Axis(0)));
        yn.push(y[k + margin].clone());
    }
    xn.mapv_inplace(|v| v / n as f64);
    Ok((xn, yn))
}

/// Mean of non-overlapping windows of `n` rows starting at row 0.
///
/// A window is emitted only when all of its labels are identical; mixed
/// windows are dropped.  Trailing rows that do not fill a window are
/// discarded.
pub fn temporal_average<T: Clone + PartialEq>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    n: usize,
) -> Result<(Array2<f64>, Vec<T>)> {
    check_aligned(x, y)?;
    if n == 0 {
        invalid!("window size n must be positive");
    }

    let n_windows = x.nrows() / n;
    let mut rows: Vec<f64> = Vec::with_capacity(n_windows * x.ncols());
    let mut yn = Vec::with_capacity(n_windows);

    for w in 0..n_windows {
        let start = w * n;
        let labels = &y[start..start + n];
        if labels.iter().any(|l| l != &labels[0]) {
            continue;
        }
        let mean = x.slice(s![start..start + n, ..]).sum_axis(Axis(0)) / n as f64;
        rows.extend(mean.iter());
        yn.push(labels[0].clone());
    }

    let xn = Array2::from_shape_vec((yn.len(), x.ncols()), rows)
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    Ok((xn, yn))
}

/// Concatenate each centred window of `n` rows (odd) into one wide row.
///
/// Output width is `n · x.ncols()`; row `k` holds rows `k..k+n` side by
/// side and carries the label of row `k + (n−1)/2`.
pub fn temporal_expansion<T: Clone>(
    x: ArrayView2<'_, f64>,
    y: &[T],
    n: usize,
) -> Result<(Array2<f64>, Vec<T>)> {
    check_aligned(x, y)?;
    check_odd(n, "embedding dimension")?;

    let d = x.ncols();
    let margin = (n - 1) / 2;
    let n_out = x.nrows().saturating_sub(n - 1);
    let mut xn = Array2::<f64>::zeros((n_out, n * d));
    let mut yn = Vec::with_capacity(n_out);

    for k in 0..n_out {
        for (offset, row) in x.slice(s![k..k + n, ..]).rows().into_iter().enumerate() {
            xn.slice_mut(s![k, offset * d..(offset + 1) * d]).assign(&row);
        }
        yn.push(y[k + margin].clone());
    }
    Ok((xn, yn))
}

// ── Validation ───────────────────────────────────────────────────────────────

pub(crate) fn check_aligned<T>(x: ArrayView2<'_, f64>, y: &[T]) -> Result<()> {
    if x.nrows() != y.len() {
        invalid!(
            "feature rows ({}) and labels ({}) must have the same length",
            x.nrows(),
            y.len()
        );
    }
    Ok(())
}

fn check_odd(n: usize, what: &str) -> Result<()> {
    if n % 2 == 0 {
        invalid!("the {what} n must be an odd number of frames, got {n}");
    }
    Ok(())
}
