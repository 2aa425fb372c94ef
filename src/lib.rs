//! # putils — analysis helpers for neuroscience experiment data
//!
//! `putils` collects the small numeric routines that sit between recorded
//! population activity and a figure: how separable two conditions are, how
//! far that is above chance, whether repeated measurements differ, and how
//! to prepare time series before asking either question.
//!
//! Every function is a pure transformation over [`ndarray`] arrays; rows are
//! observations (in temporal order where that matters) and columns are
//! features (e.g. neurons).
//!
//! ## Overview
//!
//! ```text
//! X [N, D], y [N]
//!   │
//!   ├─ smooth::smooth_array()          FIR smoothing per column (flat/hanning/…)
//!   ├─ temporal::temporal_processing() windowed smooth / average / expand
//!   ├─ embedding::temporal_embedding() autocovariance → lags → lagged features
//!   │
//!   ├─ lda::lda_score()                |Δ mean| along the discriminant axis
//!   ├─ debias::debias()                score vs. label-permutation chance level
//!   │     (LDA score, forest OOB accuracy, k-fold CV accuracy)
//!   └─ stats::paired_t_test_all_comparisons()
//! ```
//!
//! ## Quick start
//!
//! ```
//! use ndarray::Array2;
//! use putils::{lda_debiased, temporal_embedding, DebiasConfig};
//!
//! let x = Array2::from_shape_fn((120, 3), |(t, j)| ((t * (j + 2)) as f64 * 0.15).sin());
//! let y: Vec<i64> = (0..120).map(|t| ((t / 30) % 2) as i64).collect();
//!
//! // Append each feature's value one characteristic timescale earlier.
//! let (xe, ye) = temporal_embedding(x.view(), &y, 20).unwrap();
//! assert_eq!(xe.ncols(), 6);
//!
//! // Separability and its permutation chance level.
//! let cfg = DebiasConfig { n_surrogates: 10, seed: Some(1) };
//! let res = lda_debiased(xe.view(), &ye, &cfg).unwrap();
//! assert!(res.score >= 0.0 && res.surrogate_mean >= 0.0);
//! ```
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (per-trial LDA scores at `info`,
//! selected lags and permutation scores at `debug`, flat autocovariance
//! columns at `warn`).  Install a subscriber to see them; the `putils`
//! binary does so on startup.

pub mod classify;
pub mod config;
pub mod debias;
pub mod embedding;
pub mod error;
pub mod forest;
pub mod io;
pub mod lda;
pub mod smooth;
pub mod stats;
pub mod temporal;

/// Class label type used by the classifiers and scorers.
pub type Label = i64;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use error::{Error, Result};

// config
pub use config::{
    CrossValConfig, DebiasConfig, EmbeddingConfig, ForestConfig, MaxFeatures, SmoothConfig,
    TemporalConfig,
};

// smoothing
pub use smooth::{smooth, smooth_array, Window};

// windowed resamplers
pub use temporal::{
    temporal_average, temporal_expansion, temporal_processing, temporal_smoothing, TemporalMode,
};

// embedding
pub use embedding::{
    autocovariance, embed, get_lags, temporal_embedding, temporal_embedding_with_lags,
};

// LDA + classifiers
pub use classify::{accuracy, cross_val_score, stratified_folds, Classifier};
pub use forest::{DecisionTree, RandomForest};
pub use lda::{
    lda_score, lda_score_within_trials, LdaClassifier, LinearDiscriminant, TrialTable,
};

// permutation debiasing
pub use debias::{
    cv_debiased, debias, lda_debiased, oob_debiased, CrossValScorer, DebiasedScore, LdaScorer,
    OobScorer, Scorer,
};

// paired tests
pub use stats::{paired_t_test_all_comparisons, ttest_rel, NanPolicy, PairedTest, PairwiseTests};

// io
pub use io::{Dataset, StWriter};
