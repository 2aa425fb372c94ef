//! Two-class linear discriminant analysis and separability scoring.
//!
//! The fit follows the SVD solver of the usual LDA implementations:
//!   1. centre every sample on its class mean and scale each feature by the
//!      pooled within-class standard deviation (`ddof = 0`, zero → 1);
//!   2. singular directions of `M = √(1/(N−2)) · Xc / σ`, taken from the
//!      eigen-decomposition of `MᵀM`; singular values ≤ `1e-4` are dropped,
//!      and the remaining directions whiten the within-class covariance;
//!   3. the discriminant axis is the whitened class-mean difference, scaled
//!      to unit length in the whitened space.
//!
//! Projections therefore have unit within-class variance, and the
//! separability score `|mean(z | y=0) − mean(z | y=1)|` is the Mahalanobis
//! distance between the class means.
use std::collections::BTreeSet;

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::info;

use crate::classify::Classifier;
use crate::error::{invalid, Error, Result};
use crate::temporal::check_aligned;
use crate::Label;

/// Singular values at or below this are treated as rank-deficient.
const RANK_TOL: f64 = 1e-4;

/// A fitted two-class discriminant.
#[derive(Debug, Clone)]
pub struct LinearDiscriminant {
    /// Prior-weighted mean of the class means (projection origin).
    pub xbar: Array1<f64>,
    /// Discriminant direction in feature space.
    pub axis: Array1<f64>,
    /// Projected class means `[class 0, class 1]`.
    pub projected_means: [f64; 2],
    /// Class priors `[class 0, class 1]`.
    pub priors: [f64; 2],
}

impl LinearDiscriminant {
    /// Fit on `x` (`[N, D]`) with labels drawn from exactly `{0, 1}`.
    ///
    /// # Errors
    ///
    /// * `x` and `y` differ in length.
    /// * The label set is not exactly `{0, 1}`.
    /// * `N ≤ 2` (the within-class covariance is undefined).
    pub fn fit(x: ArrayView2<'_, f64>, y: &[Label]) -> Result<Self> {
        check_aligned(x, y)?;
        check_binary_labels(y)?;
        let (n, d) = x.dim();
        if n <= 2 {
            invalid!("LDA needs more than two samples, got {n}");
        }
        if d == 0 {
            invalid!("LDA needs at least one feature column");
        }

        let idx0: Vec<usize> = (0..n).filter(|&i| y[i] == 0).collect();
        let idx1: Vec<usize> = (0..n).filter(|&i| y[i] == 1).collect();
        let mu0 = class_mean(x, &idx0);
        let mu1 = class_mean(x, &idx1);
        let priors = [idx0.len() as f64 / n as f64, idx1.len() as f64 / n as f64];
        let xbar = &mu0 * priors[0] + &mu1 * priors[1];

        // Within-class centred data and pooled per-feature std.
        let mut xc = x.to_owned();
        for (i, mut row) in xc.rows_mut().into_iter().enumerate() {
            row -= if y[i] == 0 { &mu0 } else { &mu1 };
        }
        let std = xc.mapv(|v| v * v).mean_axis(Axis(0)).map(|m| m.mapv(f64::sqrt));
        let std = std
            .ok_or_else(|| Error::Numerical("empty feature matrix".into()))?
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        let fac = (1.0 / (n - 2) as f64).sqrt();
        let m = DMatrix::from_fn(n, d, |i, f| fac * xc[[i, f]] / std[f]);
        // Eigen-decomposition of MᵀM: eigenvectors are the right singular
        // vectors of M and √λ its singular values.
        let eig = SymmetricEigen::try_new(m.transpose() * &m, f64::EPSILON, 0)
            .ok_or_else(|| Error::Numerical("eigen-decomposition of within-class scatter did not converge".into()))?;
        let v = eig.eigenvectors;

        // Whitened mean difference z = Wᵀ (μ1 − μ0), W[f, k] = V[f, k] / σ_f / s_k.
        let diff = &mu1 - &mu0;
        let kept: Vec<(usize, f64)> = eig
            .eigenvalues
            .iter()
            .map(|&l| l.max(0.0).sqrt())
            .enumerate()
            .filter(|&(_, s)| s > RANK_TOL)
            .collect();
        let scaling = |f: usize, k: usize, s: f64| v[(f, k)] / std[f] / s;
        let z: Vec<f64> = kept
            .iter()
            .map(|&(k, s)| (0..d).map(|f| scaling(f, k, s) * diff[f]).sum())
            .collect();
        let norm = z.iter().map(|v| v * v).sum::<f64>().sqrt();

        let mut axis = Array1::<f64>::zeros(d);
        if norm > 0.0 {
            for (f, a) in axis.iter_mut().enumerate() {
                *a = kept
                    .iter()
                    .zip(&z)
                    .map(|(&(k, s), zk)| scaling(f, k, s) * zk)
                    .sum::<f64>()
                    / norm;
            }
        }

        let projected_means = [(&mu0 - &xbar).dot(&axis), (&mu1 - &xbar).dot(&axis)];
        Ok(Self { xbar, axis, projected_means, priors })
    }

    /// Project every row of `x` onto the discriminant axis.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.axis.len() {
            invalid!(
                "expected {} features, got {}",
                self.axis.len(),
                x.ncols()
            );
        }
        Ok((&x - &self.xbar).dot(&self.axis))
    }

    /// Assign each row to the class with the larger posterior.
    ///
    /// Along the axis both classes have unit variance, so the log-likelihood
    /// ratio is `(m1 − m0)(z − (m0 + m1)/2) + ln(p1/p0)`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Label>> {
        let [m0, m1] = self.projected_means;
        let log_prior = (self.priors[1] / self.priors[0]).ln();
        let z = self.transform(x)?;
        Ok(z
            .iter()
            .map(|&t| Label::from((m1 - m0) * (t - 0.5 * (m0 + m1)) + log_prior > 0.0))
            .collect())
    }
}

/// LDA separability: absolute difference of the class-mean projections.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use putils::lda_score;
///
/// let x = array![[0.0, 0.1], [0.2, 0.0], [0.1, 0.2], [5.0, 5.1], [5.2, 5.0], [5.1, 4.9]];
/// let score = lda_score(x.view(), &[0, 0, 0, 1, 1, 1]).unwrap();
/// assert!(score > 10.0);
///
/// assert!(lda_score(x.view(), &[0, 1, 2, 0, 1, 2]).is_err());
/// ```
pub fn lda_score(x: ArrayView2<'_, f64>, y: &[Label]) -> Result<f64> {
    let lda = LinearDiscriminant::fit(x, y)?;
    let z = lda.transform(x)?;

    let (mut s0, mut n0, mut s1, mut n1) = (0.0, 0usize, 0.0, 0usize);
    for (&zi, &yi) in z.iter().zip(y) {
        if yi == 0 {
            s0 += zi;
            n0 += 1;
        } else {
            s1 += zi;
            n1 += 1;
        }
    }
    Ok((s0 / n0 as f64 - s1 / n1 as f64).abs())
}

/// [`Classifier`] adapter around [`LinearDiscriminant`].
#[derive(Debug, Clone, Default)]
pub struct LdaClassifier {
    fitted: Option<LinearDiscriminant>,
}

impl LdaClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&LinearDiscriminant> {
        self.fitted.as_ref()
    }
}

impl Classifier for LdaClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[Label]) -> Result<()> {
        self.fitted = Some(LinearDiscriminant::fit(x, y)?);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Label>> {
        match &self.fitted {
            Some(lda) => lda.predict(x),
            None => invalid!("LDA classifier used before fit"),
        }
    }
}

// ── Per-trial scoring ────────────────────────────────────────────────────────

/// Samples of a multi-trial recording, one row per time bin.
#[derive(Debug, Clone)]
pub struct TrialTable {
    /// `[N, D]` features (e.g. one column per neuron).
    pub x: Array2<f64>,
    /// Trial id of every row.
    pub trial: Vec<i64>,
    /// Trial outcome of every row (constant within a trial).
    pub outcome: Vec<i64>,
    /// Binary contrast label of every row.
    pub labels: Vec<Label>,
}

impl TrialTable {
    pub fn new(x: Array2<f64>, trial: Vec<i64>, outcome: Vec<i64>, labels: Vec<Label>) -> Result<Self> {
        let n = x.nrows();
        if trial.len() != n || outcome.len() != n || labels.len() != n {
            invalid!(
                "trial table columns differ in length: x={n} trial={} outcome={} labels={}",
                trial.len(),
                outcome.len(),
                labels.len()
            );
        }
        Ok(Self { x, trial, outcome, labels })
    }

    /// Distinct trial ids in order of first appearance.
    pub fn trial_ids(&self) -> Vec<i64> {
        let mut seen = BTreeSet::new();
        self.trial.iter().copied().filter(|t| seen.insert(*t)).collect()
    }
}

/// Score every trial separately with [`lda_score`].
///
/// `features` optionally restricts the columns used.  Returns the per-trial
/// scores and each trial's outcome, both in order of first appearance.
pub fn lda_score_within_trials(
    table: &TrialTable,
    features: Option<&[usize]>,
) -> Result<(Vec<f64>, Vec<i64>)> {
    if let Some(cols) = features {
        if cols.is_empty() {
            invalid!("the feature subset is empty");
        }
        if let Some(&bad) = cols.iter().find(|&&c| c >= table.x.ncols()) {
            invalid!("feature index {bad} out of range for {} columns", table.x.ncols());
        }
    }

    let trials = table.trial_ids();
    let mut scores = Vec::with_capacity(trials.len());
    let mut outcomes = Vec::with_capacity(trials.len());

    for (t, &trial) in trials.iter().enumerate() {
        let rows: Vec<usize> = (0..table.trial.len()).filter(|&i| table.trial[i] == trial).collect();
        let mut x = table.x.select(Axis(0), &rows);
        if let Some(cols) = features {
            x = x.select(Axis(1), cols);
        }
        let y: Vec<Label> = rows.iter().map(|&i| table.labels[i]).collect();

        let score = lda_score(x.view(), &y)?;
        info!(trial = t, n_samples = x.nrows(), score, "lda score");
        scores.push(score);
        outcomes.push(table.outcome[rows[0]]);
    }
    Ok((scores, outcomes))
}

fn check_binary_labels(y: &[Label]) -> Result<()> {
    let set: BTreeSet<Label> = y.iter().copied().collect();
    if set != BTreeSet::from([0, 1]) {
        invalid!("the label vector y should contain only 0 and 1, and both, got {set:?}");
    }
    Ok(())
}

fn class_mean(x: ArrayView2<'_, f64>, rows: &[usize]) -> Array1<f64> {
    x.select(Axis(0), rows).sum_axis(Axis(0)) / rows.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> (Array2<f64>, Vec<Label>) {
        let x = array![
            [0.0, 1.0],
            [1.0, 0.0],
            [0.5, 0.7],
            [0.2, 0.3],
            [4.0, 5.0],
            [5.0, 4.0],
            [4.5, 4.7],
            [4.2, 4.3],
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn rejects_non_binary_labels() {
        let x = Array2::<f64>::zeros((3, 2));
        assert!(matches!(lda_score(x.view(), &[0, 1, 2]), Err(Error::InvalidArgument(_))));
        assert!(matches!(lda_score(x.view(), &[1, 1, 1]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn score_equals_mahalanobis_distance_1d() {
        // One feature: class 0 = {0, 2}, class 1 = {4, 6}.
        // Pooled within-class variance with N−2 = 2: (1+1+1+1)/2 = 2.
        // Mahalanobis distance = 4 / √2.
        let x = array![[0.0], [2.0], [4.0], [6.0]];
        let s = lda_score(x.view(), &[0, 0, 1, 1]).unwrap();
        approx::assert_abs_diff_eq!(s, 4.0 / 2f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn projection_has_unit_within_class_variance() {
        let (x, y) = two_blobs();
        let lda = LinearDiscriminant::fit(x.view(), &y).unwrap();
        let z = lda.transform(x.view()).unwrap();
        let [m0, m1] = lda.projected_means;
        let ss: f64 = z
            .iter()
            .zip(&y)
            .map(|(&zi, &yi)| {
                let m = if yi == 0 { m0 } else { m1 };
                (zi - m).powi(2)
            })
            .sum();
        approx::assert_abs_diff_eq!(ss / (x.nrows() - 2) as f64, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn predicts_training_blobs() {
        let (x, y) = two_blobs();
        let mut clf = LdaClassifier::new();
        clf.fit(x.view(), &y).unwrap();
        assert_eq!(clf.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn unfitted_classifier_errors() {
        let clf = LdaClassifier::new();
        assert!(clf.predict(Array2::<f64>::zeros((1, 2)).view()).is_err());
    }

    #[test]
    fn constant_feature_does_not_break_fit() {
        let x = array![[0.0, 1.0], [1.0, 1.0], [5.0, 1.0], [6.0, 1.0]];
        let s = lda_score(x.view(), &[0, 0, 1, 1]).unwrap();
        assert!(s.is_finite() && s > 1.0);
    }

    #[test]
    fn within_trials_scores_each_trial() {
        let (x, y) = two_blobs();
        let x = ndarray::concatenate![Axis(0), x, x];
        let labels: Vec<Label> = y.iter().chain(&y).copied().collect();
        let trial = vec![7, 7, 7, 7, 7, 7, 7, 7, 3, 3, 3, 3, 3, 3, 3, 3];
        let outcome = vec![1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        let table = TrialTable::new(x, trial, outcome, labels).unwrap();

        let (scores, outcomes) = lda_score_within_trials(&table, None).unwrap();
        assert_eq!(outcomes, vec![1, 0]);
        assert_eq!(scores.len(), 2);
        approx::assert_abs_diff_eq!(scores[0], scores[1], epsilon = 1e-9);

        let (sub, _) = lda_score_within_trials(&table, Some([0].as_slice())).unwrap();
        assert!(sub[0] > 0.0);
        assert!(lda_score_within_trials(&table, Some([2].as_slice())).is_err());
    }

    #[test]
    fn zero_feature_columns_rejected() {
        let x = Array2::<f64>::zeros((6, 0));
        assert!(matches!(
            lda_score(x.view(), &[0, 1, 0, 1, 0, 1]),
            Err(Error::InvalidArgument(_))
        ));

        let (x, y) = two_blobs();
        let table = TrialTable::new(x, vec![1; 8], vec![0; 8], y).unwrap();
        assert!(matches!(
            lda_score_within_trials(&table, Some([].as_slice())),
            Err(Error::InvalidArgument(_))
        ));
    }
}
