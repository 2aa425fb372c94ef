//! Classifier seam and k-fold cross-validated accuracy.
use std::collections::BTreeMap;

use ndarray::{ArrayView2, Axis};
use tracing::debug;

use crate::error::{invalid, Result};
use crate::temporal::check_aligned;
use crate::Label;

/// A supervised classifier that can be refitted on each fold.
pub trait Classifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[Label]) -> Result<()>;
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Label>>;
}

/// Fraction of positions where `pred` equals `truth`.
pub fn accuracy(pred: &[Label], truth: &[Label]) -> f64 {
    if truth.is_empty() {
        return f64::NAN;
    }
    let hits = pred.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f64 / truth.len() as f64
}

/// Assign every sample to one of `k` folds, stratified by label.
///
/// Within each class the samples keep their order and are split into `k`
/// contiguous, near-equal chunks, so each fold sees every class in roughly
/// its overall proportion.
pub fn stratified_folds(y: &[Label], k: usize) -> Vec<usize> {
    let mut by_class: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut fold_of = vec![0usize; y.len()];
    for members in by_class.values() {
        let c = members.len();
        for (m, &i) in members.iter().enumerate() {
            fold_of[i] = m * k / c;
        }
    }
    fold_of
}

/// Mean accuracy of `classifier` over `folds` stratified folds.
///
/// A fresh clone of `classifier` is fitted on each training split.
pub fn cross_val_score<C: Classifier + Clone>(
    classifier: &C,
    x: ArrayView2<'_, f64>,
    y: &[Label],
    folds: usize,
) -> Result<f64> {
    check_aligned(x, y)?;
    if folds < 2 {
        invalid!("cross-validation needs at least 2 folds, got {folds}");
    }
    if folds > y.len() {
        invalid!("cannot split {} samples into {folds} folds", y.len());
    }

    let fold_of = stratified_folds(y, folds);
    let mut scores = Vec::with_capacity(folds);
    for f in 0..folds {
        let (test, train): (Vec<usize>, Vec<usize>) = (0..y.len()).partition(|&i| fold_of[i] == f);
        if test.is_empty() {
            continue;
        }
        let x_train = x.select(Axis(0), &train);
        let y_train: Vec<Label> = train.iter().map(|&i| y[i]).collect();
        let x_test = x.select(Axis(0), &test);
        let y_test: Vec<Label> = test.iter().map(|&i| y[i]).collect();

        let mut clf = classifier.clone();
        clf.fit(x_train.view(), &y_train)?;
        let acc = accuracy(&clf.predict(x_test.view())?, &y_test);
        debug!(fold = f, n_test = test.len(), acc, "cross-validation fold");
        scores.push(acc);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}
