/// Shared helpers for synthetic test data.
use ndarray::Array2;
use putils::Label;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

#[allow(unused)]
/// Two Gaussian clusters in `d` dimensions, `n_per_class` rows each.
/// Class 1 is shifted by `shift` along every axis; rows alternate 0, 1, 0, …
pub fn two_clusters(n_per_class: usize, d: usize, shift: f64, seed: u64) -> (Array2<f64>, Vec<Label>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let n = 2 * n_per_class;
    let y: Vec<Label> = (0..n).map(|i| (i % 2) as Label).collect();
    let x = Array2::from_shape_fn((n, d), |(i, _)| {
        noise.sample(&mut rng) + if y[i] == 1 { shift } else { 0.0 }
    });
    (x, y)
}

#[allow(unused)]
/// `d` independent AR(1) series of length `n` with coefficient `phi`.
pub fn ar1(n: usize, d: usize, phi: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut x = Array2::<f64>::zeros((n, d));
    for j in 0..d {
        let mut prev = 0.0;
        for t in 0..n {
            prev = phi * prev + noise.sample(&mut rng);
            x[[t, j]] = prev;
        }
    }
    x
}

#[allow(unused)]
/// Pure noise features with balanced labels in random order.
pub fn noise_features(n: usize, d: usize, seed: u64) -> (Array2<f64>, Vec<Label>) {
    use rand::seq::SliceRandom;
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let x = Array2::from_shape_fn((n, d), |_| noise.sample(&mut rng));
    let mut y: Vec<Label> = (0..n).map(|i| (i % 2) as Label).collect();
    y.shuffle(&mut rng);
    (x, y)
}

#[allow(unused)]
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "length mismatch");
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0_f64, f64::max)
}
