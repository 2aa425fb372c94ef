//! Paired (dependent-sample) t-tests across repeated measurements.
//!
//! For matched observations `a`, `b` with differences `d = a − b`:
//!   t  = mean(d) / (sd(d, ddof=1) / √n),   df = n − 1
//!   p  = 2 · P(T_df > |t|)
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{invalid, Error, Result};

/// What to do with NaN observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Any NaN makes the statistic and p-value NaN.
    #[default]
    Propagate,
    /// Drop every pair in which either side is NaN.
    Omit,
    /// Fail with an invalid-argument error.
    Raise,
}

impl NanPolicy {
    pub fn name(self) -> &'static str {
        match self {
            NanPolicy::Propagate => "propagate",
            NanPolicy::Omit => "omit",
            NanPolicy::Raise => "raise",
        }
    }
}

impl fmt::Display for NanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NanPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "propagate" => Ok(NanPolicy::Propagate),
            "omit" => Ok(NanPolicy::Omit),
            "raise" => Ok(NanPolicy::Raise),
            other => Err(Error::InvalidArgument(format!(
                "unknown nan policy '{other}', expected propagate, omit or raise"
            ))),
        }
    }
}

/// Result of one paired t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedTest {
    pub statistic: f64,
    pub pvalue: f64,
    /// Degrees of freedom (`n − 1` after NaN handling).
    pub df: f64,
}

impl PairedTest {
    fn nan(df: f64) -> Self {
        Self { statistic: f64::NAN, pvalue: f64::NAN, df }
    }
}

/// Nested map `tests[i][j]` over all column pairs `i ≠ j`.
pub type PairwiseTests = BTreeMap<usize, BTreeMap<usize, PairedTest>>;

/// Paired t-test of `a` against `b`.
///
/// Fewer than two usable pairs give a NaN result.  Zero variance of the
/// differences gives an infinite statistic (p = 0) or, if the mean
/// difference is also zero, NaN.
pub fn ttest_rel(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, policy: NanPolicy) -> Result<PairedTest> {
    if a.len() != b.len() {
        invalid!("paired samples differ in length: {} vs {}", a.len(), b.len());
    }

    let has_nan = a.iter().chain(b.iter()).any(|v| v.is_nan());
    let diffs: Vec<f64> = match (policy, has_nan) {
        (NanPolicy::Propagate, true) => {
            return Ok(PairedTest::nan(a.len() as f64 - 1.0));
        }
        (NanPolicy::Raise, true) => invalid!("the input contains NaN values"),
        _ => a
            .iter()
            .zip(b.iter())
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .map(|(x, y)| x - y)
            .collect(),
    };

    let n = diffs.len() as f64;
    let df = n - 1.0;
    if diffs.len() < 2 {
        return Ok(PairedTest::nan(df));
    }

    let mean = diffs.iter().sum::<f64>() / n;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / df;
    let statistic = mean / (var / n).sqrt();

    let pvalue = if statistic.is_nan() {
        f64::NAN
    } else if statistic.is_infinite() {
        0.0
    } else {
        let t = StudentsT::new(0.0, 1.0, df).map_err(|e| Error::Numerical(e.to_string()))?;
        (2.0 * t.sf(statistic.abs())).min(1.0)
    };

    Ok(PairedTest { statistic, pvalue, df })
}

/// Paired t-tests between every pair of columns of `x` (`[N, M]`).
///
/// `tests[i][j]` and `tests[j][i]` hold the same result (the statistic of
/// column `i` against column `j`, with `i < j`); the diagonal is absent.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use putils::{paired_t_test_all_comparisons, NanPolicy};
///
/// let x = array![[1.0, 2.0, 2.5], [2.0, 2.9, 4.1], [3.0, 4.2, 5.0], [4.0, 5.1, 6.2]];
/// let res = paired_t_test_all_comparisons(x.view(), NanPolicy::Propagate).unwrap();
/// assert_eq!(res[&0][&1], res[&1][&0]);
/// assert!(!res[&2].contains_key(&2));
/// ```
pub fn paired_t_test_all_comparisons(x: ArrayView2<'_, f64>, policy: NanPolicy) -> Result<PairwiseTests> {
    let m = x.ncols();
    let mut res: PairwiseTests = (0..m).map(|i| (i, BTreeMap::new())).collect();

    for i in 0..m {
        for j in i + 1..m {
            let test = ttest_rel(x.column(i), x.column(j), policy)?;
            if let Some(row) = res.get_mut(&i) {
                row.insert(j, test);
            }
            if let Some(row) = res.get_mut(&j) {
                row.insert(i, test);
            }
        }
    }
    Ok(res)
}
