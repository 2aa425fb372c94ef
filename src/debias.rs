//! Permutation-based chance level of a score.
//!
//! A score is computed once on the real labels and then again on
//! `n_surrogates` independent uniform permutations of the labels (features
//! untouched).  The surrogate mean estimates what the score looks like when
//! the features carry no class information.
use ndarray::ArrayView2;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::classify::{cross_val_score, Classifier};
use crate::config::{CrossValConfig, DebiasConfig, ForestConfig};
use crate::error::{invalid, Error, Result};
use crate::forest::RandomForest;
use crate::lda::lda_score;
use crate::temporal::check_aligned;
use crate::Label;

/// Any statistic of `(x, y)` that permutation debiasing can wrap.
pub trait Scorer {
    fn score<R: Rng + ?Sized>(&self, x: ArrayView2<'_, f64>, y: &[Label], rng: &mut R) -> Result<f64>;
}

/// [`lda_score`] as a [`Scorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LdaScorer;

impl Scorer for LdaScorer {
    fn score<R: Rng + ?Sized>(&self, x: ArrayView2<'_, f64>, y: &[Label], _rng: &mut R) -> Result<f64> {
        lda_score(x, y)
    }
}

/// Out-of-bag accuracy of a freshly grown [`RandomForest`].
#[derive(Debug, Clone, Default)]
pub struct OobScorer {
    pub config: ForestConfig,
}

impl Scorer for OobScorer {
    fn score<R: Rng + ?Sized>(&self, x: ArrayView2<'_, f64>, y: &[Label], rng: &mut R) -> Result<f64> {
        let mut forest = RandomForest::new(self.config.clone(), rng.gen());
        forest.fit(x, y)?;
        forest
            .oob_score()
            .ok_or_else(|| Error::Numerical("forest produced no OOB estimate".into()))
    }
}

/// Mean k-fold accuracy of a [`Classifier`].
#[derive(Debug, Clone)]
pub struct CrossValScorer<C> {
    pub classifier: C,
    pub folds: usize,
}

impl<C: Classifier + Clone> Scorer for CrossValScorer<C> {
    fn score<R: Rng + ?Sized>(&self, x: ArrayView2<'_, f64>, y: &[Label], _rng: &mut R) -> Result<f64> {
        cross_val_score(&self.classifier, x, y, self.folds)
    }
}

/// Observed score together with its permutation null distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DebiasedScore {
    /// Score on the real labels.
    pub score: f64,
    /// Mean of [`surrogates`](Self::surrogates).
    pub surrogate_mean: f64,
    /// One score per label permutation.
    pub surrogates: Vec<f64>,
}

impl DebiasedScore {
    /// Observed score minus the chance level.
    pub fn debiased(&self) -> f64 {
        self.score - self.surrogate_mean
    }
}

/// Score `(x, y)` and `n_surrogates` label permutations with `scorer`.
pub fn debias<S: Scorer, R: Rng + ?Sized>(
    scorer: &S,
    x: ArrayView2<'_, f64>,
    y: &[Label],
    n_surrogates: usize,
    rng: &mut R,
) -> Result<DebiasedScore> {
    check_aligned(x, y)?;
    if n_surrogates == 0 {
        invalid!("at least one surrogate is needed to estimate the chance level");
    }

    let score = scorer.score(x, y, rng)?;
    let mut surrogates = Vec::with_capacity(n_surrogates);
    let mut ys = y.to_vec();
    for s in 0..n_surrogates {
        ys.copy_from_slice(y);
        ys.shuffle(rng);
        let sc = scorer.score(x, &ys, rng)?;
        debug!(surrogate = s, score = sc, "permutation score");
        surrogates.push(sc);
    }
    let surrogate_mean = surrogates.iter().sum::<f64>() / n_surrogates as f64;
    Ok(DebiasedScore { score, surrogate_mean, surrogates })
}

/// [`debias`] with [`LdaScorer`].
pub fn lda_debiased(x: ArrayView2<'_, f64>, y: &[Label], cfg: &DebiasConfig) -> Result<DebiasedScore> {
    debias(&LdaScorer, x, y, cfg.n_surrogates, &mut cfg.rng())
}

/// [`debias`] with [`OobScorer`].
pub fn oob_debiased(
    x: ArrayView2<'_, f64>,
    y: &[Label],
    forest: &ForestConfig,
    cfg: &DebiasConfig,
) -> Result<DebiasedScore> {
    let scorer = OobScorer { config: forest.clone() };
    debias(&scorer, x, y, cfg.n_surrogates, &mut cfg.rng())
}

/// [`debias`] with [`CrossValScorer`].
pub fn cv_debiased<C: Classifier + Clone>(
    classifier: &C,
    x: ArrayView2<'_, f64>,
    y: &[Label],
    cv: &CrossValConfig,
    cfg: &DebiasConfig,
) -> Result<DebiasedScore> {
    let scorer = CrossValScorer { classifier: classifier.clone(), folds: cv.folds };
    debias(&scorer, x, y, cfg.n_surrogates, &mut cfg.rng())
}
