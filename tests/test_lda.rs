mod common;
use nalgebra::{DMatrix, DVector};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use putils::{
    cross_val_score, lda_score, lda_score_within_trials, Classifier, Error, LdaClassifier,
    LinearDiscriminant, TrialTable,
};

/// Mahalanobis distance of the class means under the pooled within-class
/// covariance (`1/(N−2)` normalisation), using a pseudo-inverse so that
/// rank-deficient features are handled.
fn mahalanobis(x: ArrayView2<'_, f64>, y: &[i64]) -> f64 {
    let (n, d) = x.dim();
    let mean_of = |c: i64| {
        let rows: Vec<usize> = (0..n).filter(|&i| y[i] == c).collect();
        x.select(Axis(0), &rows).mean_axis(Axis(0)).unwrap()
    };
    let (mu0, mu1) = (mean_of(0), mean_of(1));
    let xc = DMatrix::from_fn(n, d, |i, f| {
        x[[i, f]] - if y[i] == 0 { mu0[f] } else { mu1[f] }
    });
    let cov = xc.transpose() * &xc / (n - 2) as f64;
    let pinv = cov.pseudo_inverse(1e-10).unwrap();
    let diff = DVector::from_fn(d, |f, _| mu1[f] - mu0[f]);
    (diff.transpose() * pinv * &diff)[(0, 0)].sqrt()
}

#[test]
fn score_matches_mahalanobis_distance_in_several_dimensions() {
    for (d, shift, seed) in [(2, 0.5, 20), (3, 1.0, 21), (5, 0.3, 22)] {
        let (mut x, y) = common::two_clusters(60, d, shift, seed);
        // Correlate the features so the whitening matters.
        for i in 0..x.nrows() {
            x[[i, 1]] += 0.8 * x[[i, 0]];
        }
        let score = lda_score(x.view(), &y).unwrap();
        approx::assert_abs_diff_eq!(score, mahalanobis(x.view(), &y), epsilon = 1e-8);
    }
}

#[test]
fn collinear_features_match_pseudo_inverse_distance() {
    let (x, y) = common::two_clusters(80, 3, 1.0, 23);
    let xr = concatenate![Axis(1), x, (&x.column(0) * 2.0 - &x.column(2)).insert_axis(Axis(1))];
    let score = lda_score(xr.view(), &y).unwrap();
    approx::assert_abs_diff_eq!(score, mahalanobis(xr.view(), &y), epsilon = 1e-6);
    approx::assert_abs_diff_eq!(score, lda_score(x.view(), &y).unwrap(), epsilon = 1e-6);
}

#[test]
fn separated_clusters_score_high() {
    let (x, y) = common::two_clusters(200, 3, 3.0, 1);
    let score = lda_score(x.view(), &y).unwrap();
    // Mahalanobis distance of the true means is 3·√3 ≈ 5.2.
    assert!(score > 4.0, "score {score}");
}

#[test]
fn identical_distributions_score_near_zero() {
    let (x, y) = common::two_clusters(200, 3, 0.0, 2);
    let score = lda_score(x.view(), &y).unwrap();
    assert!(score < 0.5, "score {score}");
}

#[test]
fn score_is_invariant_to_feature_scaling() {
    let (x, y) = common::two_clusters(100, 2, 1.0, 3);
    let mut scaled = x.clone();
    scaled.column_mut(0).mapv_inplace(|v| v * 1000.0);
    scaled.column_mut(1).mapv_inplace(|v| v * 0.01 + 7.0);
    let a = lda_score(x.view(), &y).unwrap();
    let b = lda_score(scaled.view(), &y).unwrap();
    approx::assert_abs_diff_eq!(a, b, epsilon = 1e-8);
}

#[test]
fn label_set_must_be_binary() {
    let (x, _) = common::two_clusters(10, 2, 1.0, 4);
    let y3: Vec<i64> = (0..20).map(|i| i % 3).collect();
    assert!(matches!(lda_score(x.view(), &y3), Err(Error::InvalidArgument(_))));
    let only0 = vec![0i64; 20];
    assert!(matches!(lda_score(x.view(), &only0), Err(Error::InvalidArgument(_))));
}

#[test]
fn duplicated_feature_is_handled_by_rank_truncation() {
    let (x, y) = common::two_clusters(100, 2, 2.0, 5);
    let dup = concatenate![Axis(1), x, x.column(0).insert_axis(Axis(1))];
    let a = lda_score(x.view(), &y).unwrap();
    let b = lda_score(dup.view(), &y).unwrap();
    approx::assert_abs_diff_eq!(a, b, epsilon = 1e-6);
}

#[test]
fn classifier_predicts_clusters() {
    let (x, y) = common::two_clusters(100, 2, 4.0, 6);
    let mut clf = LdaClassifier::new();
    clf.fit(x.view(), &y).unwrap();
    let pred = clf.predict(x.view()).unwrap();
    assert!(putils::accuracy(&pred, &y) > 0.95);

    let lda = LinearDiscriminant::fit(x.view(), &y).unwrap();
    assert_eq!(lda.predict(x.view()).unwrap(), pred);
}

#[test]
fn cross_validated_lda_accuracy() {
    let (x, y) = common::two_clusters(100, 2, 4.0, 7);
    let acc = cross_val_score(&LdaClassifier::new(), x.view(), &y, 5).unwrap();
    assert!(acc > 0.9, "accuracy {acc}");
    assert!(cross_val_score(&LdaClassifier::new(), x.view(), &y, 1).is_err());
}

#[test]
fn per_trial_scores_follow_trial_order() {
    // Trial 7: well separated; trial 3: no signal.
    let (xa, ya) = common::two_clusters(50, 2, 4.0, 8);
    let (xb, yb) = common::two_clusters(50, 2, 0.0, 9);
    let x: Array2<f64> = concatenate![Axis(0), xa, xb];
    let trial: Vec<i64> = std::iter::repeat(7).take(100).chain(std::iter::repeat(3).take(100)).collect();
    let outcome: Vec<i64> = std::iter::repeat(1).take(100).chain(std::iter::repeat(0).take(100)).collect();
    let labels: Vec<i64> = ya.into_iter().chain(yb).collect();

    let table = TrialTable::new(x, trial, outcome, labels).unwrap();
    let (scores, outcomes) = lda_score_within_trials(&table, None).unwrap();
    assert_eq!(outcomes, vec![1, 0]);
    assert!(scores[0] > 3.0 && scores[1] < 1.0, "{scores:?}");

    let (one_col, _) = lda_score_within_trials(&table, Some([1].as_slice())).unwrap();
    assert_eq!(one_col.len(), 2);
    assert!(lda_score_within_trials(&table, Some([2].as_slice())).is_err());
}
