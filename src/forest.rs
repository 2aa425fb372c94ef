//! Random forest classifier with out-of-bag accuracy.
//!
//! CART trees split on Gini impurity over a random subset of features at
//! every node; each tree is grown on a bootstrap sample.  Rows left out of a
//! tree's bootstrap are scored by that tree, and averaging those
//! class-probability votes gives the out-of-bag (OOB) accuracy estimate.
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::classify::Classifier;
use crate::config::ForestConfig;
use crate::error::{invalid, Result};
use crate::temporal::check_aligned;
use crate::Label;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Class frequencies at the leaf, indexed like `RandomForest::classes`.
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single CART tree over class indices `0..n_classes`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
    n_classes: usize,
}

/// Training context shared by every node of one tree.
struct Grower<'a, 'x, 'r, R: Rng> {
    x: ArrayView2<'x, f64>,
    y: &'a [usize],
    n_classes: usize,
    max_features: usize,
    config: &'a ForestConfig,
    rng: &'r mut R,
}

impl DecisionTree {
    /// Grow a tree on `samples` (row indices, repeats allowed).
    ///
    /// `y` holds class indices in `0..n_classes`.
    pub fn grow<R: Rng>(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        samples: &[usize],
        config: &ForestConfig,
        rng: &mut R,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            n_classes,
            max_features: config.max_features.resolve(x.ncols()),
            config,
            rng,
        };
        let mut samples = samples.to_vec();
        let root = grower.node(&mut samples, 0);
        Self { root, n_classes }
    }

    /// Class-frequency vector of the leaf reached by `row`.
    pub fn predict_proba(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { proba } => return proba,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn depth(&self) -> usize {
        fn walk(n: &Node) -> usize {
            match n {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

impl<R: Rng> Grower<'_, '_, '_, R> {
    fn counts(&self, samples: &[usize]) -> Vec<f64> {
        let mut c = vec![0.0; self.n_classes];
        for &i in samples {
            c[self.y[i]] += 1.0;
        }
        c
    }

    fn leaf(&self, samples: &[usize]) -> Node {
        let total = samples.len().max(1) as f64;
        let proba = self.counts(samples).into_iter().map(|c| c / total).collect();
        Node::Leaf { proba }
    }

    fn node(&mut self, samples: &mut [usize], depth: usize) -> Node {
        let counts = self.counts(samples);
        let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;
        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || samples.len() < self.config.min_samples_split {
            return self.leaf(samples);
        }

        let Some((feature, threshold)) = self.best_split(samples, &counts) else {
            return self.leaf(samples);
        };

        let x = self.x;
        let (mut left, mut right): (Vec<usize>, Vec<usize>) =
            samples.iter().copied().partition(|&i| x[[i, feature]] <= threshold);
        Node::Split {
            feature,
            threshold,
            left: Box::new(self.node(&mut left, depth + 1)),
            right: Box::new(self.node(&mut right, depth + 1)),
        }
    }

    /// Lowest weighted Gini impurity over a random feature subset.
    fn best_split(&mut self, samples: &mut [usize], counts: &[f64]) -> Option<(usize, f64)> {
        let n = samples.len() as f64;
        let features = rand::seq::index::sample(&mut *self.rng, self.x.ncols(), self.max_features);

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in features.iter() {
            let col = self.x.column(feature);
            samples.sort_by(|&a, &b| col[a].total_cmp(&col[b]));

            let mut left = vec![0.0; self.n_classes];
            for k in 0..samples.len() - 1 {
                left[self.y[samples[k]]] += 1.0;
                let (v, v_next) = (col[samples[k]], col[samples[k + 1]]);
                if v == v_next {
                    continue;
                }
                let n_left = (k + 1) as f64;
                let n_right = n - n_left;
                let gini_left = gini(left.iter().copied(), n_left);
                let gini_right = gini(counts.iter().zip(&left).map(|(c, l)| c - l), n_right);
                let impurity = (n_left * gini_left + n_right * gini_right) / n;
                if best.map_or(true, |(b, _, _)| impurity < b) {
                    best = Some((impurity, feature, 0.5 * (v + v_next)));
                }
            }
        }
        best.map(|(_, f, t)| (f, t))
    }
}

fn gini(counts: impl Iterator<Item = f64>, total: f64) -> f64 {
    1.0 - counts.map(|c| (c / total).powi(2)).sum::<f64>()
}

/// Bagged ensemble of [`DecisionTree`]s.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    seed: u64,
    classes: Vec<Label>,
    trees: Vec<DecisionTree>,
    oob_score: Option<f64>,
}

impl RandomForest {
    /// An unfitted forest; `seed` fixes the bootstrap and feature draws.
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self { config, seed, classes: vec![], trees: vec![], oob_score: None }
    }

    /// Out-of-bag accuracy of the last fit.
    ///
    /// `Some(NaN)` when no row was ever left out of a bootstrap sample.
    pub fn oob_score(&self) -> Option<f64> {
        self.oob_score
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities of every row.
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Vec<Vec<f64>> {
        x.rows()
            .into_iter()
            .map(|row| {
                let mut acc = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.predict_proba(row)) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= self.trees.len() as f64);
                acc
            })
            .collect()
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[Label]) -> Result<()> {
        check_aligned(x, y)?;
        if y.is_empty() {
            invalid!("cannot fit a forest on zero samples");
        }
        if self.config.n_trees == 0 {
            invalid!("a forest needs at least one tree");
        }
        if x.ncols() == 0 {
            invalid!("cannot fit a forest without features");
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let y_idx: Vec<usize> = y
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        let n = y.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.config.n_trees);
        let mut oob_votes = vec![vec![0.0; classes.len()]; n];
        let mut oob_seen = vec![false; n];

        for _ in 0..self.config.n_trees {
            let samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut in_bag = vec![false; n];
            samples.iter().for_each(|&i| in_bag[i] = true);

            let tree = DecisionTree::grow(x, &y_idx, classes.len(), &samples, &self.config, &mut rng);
            for i in (0..n).filter(|&i| !in_bag[i]) {
                for (v, p) in oob_votes[i].iter_mut().zip(tree.predict_proba(x.row(i))) {
                    *v += p;
                }
                oob_seen[i] = true;
            }
            trees.push(tree);
        }

        let scored: Vec<usize> = (0..n).filter(|&i| oob_seen[i]).collect();
        if scored.len() < n {
            warn!(
                missing = n - scored.len(),
                "some samples were never out of bag; OOB estimate uses the rest"
            );
        }
        let hits = scored
            .iter()
            .filter(|&&i| argmax(&oob_votes[i]) == y_idx[i])
            .count();
        let oob = hits as f64 / scored.len() as f64;
        debug!(n_trees = trees.len(), oob, "random forest fitted");

        self.classes = classes;
        self.trees = trees;
        self.oob_score = Some(oob);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Label>> {
        if self.trees.is_empty() {
            invalid!("random forest used before fit");
        }
        Ok(self
            .predict_proba(x)
            .iter()
            .map(|p| self.classes[argmax(p)])
            .collect())
    }
}

/// Index of the largest entry; ties go to the lowest index.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &x)| if x > bv { (i, x) } else { (bi, bv) })
        .0
}
