mod common;
use putils::{
    cv_debiased, debias, lda_debiased, oob_debiased, Classifier, CrossValConfig, DebiasConfig,
    ForestConfig, LdaClassifier, LdaScorer, RandomForest,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn lda_noise_features_are_at_chance() {
    let (x, y) = common::noise_features(400, 3, 10);
    let cfg = DebiasConfig { n_surrogates: 40, seed: Some(10) };
    let res = lda_debiased(x.view(), &y, &cfg).unwrap();
    assert_eq!(res.surrogates.len(), 40);
    assert!(res.surrogates.iter().all(|&s| s >= 0.0));
    assert!(res.debiased().abs() < 0.5, "score {} vs chance {}", res.score, res.surrogate_mean);
}

#[test]
fn lda_separated_clusters_beat_chance() {
    let (x, y) = common::two_clusters(150, 3, 2.0, 11);
    let cfg = DebiasConfig { n_surrogates: 20, seed: Some(11) };
    let res = lda_debiased(x.view(), &y, &cfg).unwrap();
    assert!(res.debiased() > 2.0, "score {} vs chance {}", res.score, res.surrogate_mean);
    assert!(res.surrogates.iter().all(|&s| s < res.score));
}

#[test]
fn debias_with_explicit_rng_matches_config() {
    let (x, y) = common::noise_features(60, 2, 12);
    let cfg = DebiasConfig { n_surrogates: 5, seed: Some(77) };
    let a = lda_debiased(x.view(), &y, &cfg).unwrap();
    let b = debias(&LdaScorer, x.view(), &y, 5, &mut StdRng::seed_from_u64(77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn forest_oob_accuracy_against_chance() {
    let (x, y) = common::two_clusters(100, 2, 3.0, 13);
    let forest = ForestConfig { n_trees: 25, ..ForestConfig::default() };
    let cfg = DebiasConfig { n_surrogates: 8, seed: Some(13) };
    let res = oob_debiased(x.view(), &y, &forest, &cfg).unwrap();
    assert!(res.score > 0.85, "oob accuracy {}", res.score);
    assert!((res.surrogate_mean - 0.5).abs() < 0.15, "chance {}", res.surrogate_mean);
}

#[test]
fn forest_fits_and_predicts() {
    let (x, y) = common::two_clusters(80, 2, 4.0, 14);
    let mut rf = RandomForest::new(ForestConfig { n_trees: 15, ..ForestConfig::default() }, 1);
    rf.fit(x.view(), &y).unwrap();
    assert_eq!(rf.n_trees(), 15);
    assert_eq!(rf.classes(), &[0, 1]);
    let pred = rf.predict(x.view()).unwrap();
    assert!(putils::accuracy(&pred, &y) > 0.95);
    for p in rf.predict_proba(x.view()) {
        approx::assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn cross_validated_accuracy_against_chance() {
    let (x, y) = common::two_clusters(100, 2, 3.0, 15);
    let cfg = DebiasConfig { n_surrogates: 10, seed: Some(15) };
    let res = cv_debiased(&LdaClassifier::new(), x.view(), &y, &CrossValConfig::default(), &cfg).unwrap();
    assert!(res.score > 0.9, "cv accuracy {}", res.score);
    assert!(res.surrogate_mean < 0.7, "chance {}", res.surrogate_mean);
}
