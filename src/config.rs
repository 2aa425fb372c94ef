//! Analysis configuration.
//!
//! Each operation family has a small parameter struct whose [`Default`]
//! matches the defaults of the analysis scripts these helpers were written
//! for.  All fields are `pub` so you can use struct-update syntax:
//!
//! ```
//! use putils::{DebiasConfig, SmoothConfig, Window};
//!
//! let smooth = SmoothConfig { window: Window::Blackman, ..SmoothConfig::default() };
//! let debias = DebiasConfig { n_surrogates: 200, seed: Some(7) };
//! assert_eq!(smooth.window_len, 11);
//! assert_eq!(debias.n_surrogates, 200);
//! ```
use crate::smooth::Window;
use crate::temporal::TemporalMode;

/// Parameters of the FIR smoother ([`smooth`](crate::smooth::smooth)).
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothConfig {
    /// Number of taps.  Values below 3 disable smoothing.
    ///
    /// Default: `11`.
    pub window_len: usize,

    /// Taper applied to the kernel.
    ///
    /// Default: [`Window::Hanning`].
    pub window: Window,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { window_len: 11, window: Window::Hanning }
    }
}

/// Parameters of the windowed resamplers ([`temporal_processing`](crate::temporal::temporal_processing)).
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalConfig {
    /// Which resampler to run.
    ///
    /// Default: [`TemporalMode::Smooth`].
    pub mode: TemporalMode,

    /// Window width in rows.  Must be odd for `Smooth` and `Expand`.
    ///
    /// Default: `3`.
    pub n: usize,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self { mode: TemporalMode::Smooth, n: 3 }
    }
}

/// Parameters of the temporal embedding ([`temporal_embedding`](crate::embedding::temporal_embedding)).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Largest autocovariance lag inspected when choosing per-column lags.
    /// Must be smaller than the number of rows.
    ///
    /// Default: `50`.
    pub nlags: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { nlags: 50 }
    }
}

/// Parameters of the permutation debiaser ([`debias`](crate::debias::debias)).
#[derive(Debug, Clone, PartialEq)]
pub struct DebiasConfig {
    /// Number of label permutations scored to estimate the chance level.
    ///
    /// Default: `50`.
    pub n_surrogates: usize,

    /// RNG seed.  `None` seeds from OS entropy, so repeated runs differ.
    ///
    /// Default: `None`.
    pub seed: Option<u64>,
}

impl Default for DebiasConfig {
    fn default() -> Self {
        Self { n_surrogates: 50, seed: None }
    }
}

impl DebiasConfig {
    /// Build the RNG described by [`seed`](Self::seed).
    pub fn rng(&self) -> rand::rngs::StdRng {
        use rand::SeedableRng;
        match self.seed {
            Some(s) => rand::rngs::StdRng::seed_from_u64(s),
            None => rand::rngs::StdRng::from_entropy(),
        }
    }
}

/// How many candidate features a tree node considers per split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))` (at least 1), the usual classification default.
    Sqrt,
    /// Every feature (plain bagged trees).
    All,
    /// A fixed count, clamped to `1..=n_features`.
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Parameters of the random forest used for out-of-bag scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    /// Number of bootstrap trees.
    ///
    /// Default: `100`.
    pub n_trees: usize,

    /// Depth limit; `None` grows until leaves are pure.
    ///
    /// Default: `None`.
    pub max_depth: Option<usize>,

    /// A node with fewer samples than this becomes a leaf.
    ///
    /// Default: `2`.
    pub min_samples_split: usize,

    /// Features considered per split.
    ///
    /// Default: [`MaxFeatures::Sqrt`].
    pub max_features: MaxFeatures,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

/// Parameters of k-fold cross-validated scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValConfig {
    /// Number of stratified folds.
    ///
    /// Default: `5`.
    pub folds: usize,
}

impl Default for CrossValConfig {
    fn default() -> Self {
        Self { folds: 5 }
    }
}
