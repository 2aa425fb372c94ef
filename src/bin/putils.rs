use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use putils::io::{Dataset, StWriter};
use putils::{
    lda_debiased, oob_debiased, paired_t_test_all_comparisons, smooth_array,
    temporal_embedding_with_lags, temporal_processing, DebiasConfig, DebiasedScore,
    EmbeddingConfig, ForestConfig, NanPolicy, SmoothConfig, TemporalConfig, TemporalMode, Window,
};

#[derive(Parser)]
#[command(name = "putils", about = "Separability scores and time-series preparation for population recordings")]
struct Args {
    /// input.safetensors with `x` [N, D] and optionally `y` [N]
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// output.safetensors path
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// FIR-smooth every column of `x`
    Smooth {
        #[arg(long, default_value_t = SmoothConfig::default().window_len)]
        window_len: usize,
        /// flat, hanning, hamming, bartlett or blackman
        #[arg(long, default_value_t = SmoothConfig::default().window)]
        window: Window,
    },
    /// Windowed smooth / average / expand of `x` and `y`
    Temporal {
        /// smooth, average, expand or weighted_smooth
        #[arg(long, default_value_t = TemporalConfig::default().mode)]
        mode: TemporalMode,
        #[arg(long, default_value_t = TemporalConfig::default().n)]
        n: usize,
    },
    /// Append autocovariance-lagged copies of every column
    Embed {
        #[arg(long, default_value_t = EmbeddingConfig::default().nlags)]
        nlags: usize,
    },
    /// LDA separability score and its permutation chance level
    Lda {
        #[arg(long, default_value_t = DebiasConfig::default().n_surrogates)]
        surrogates: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Random-forest OOB accuracy and its permutation chance level
    Forest {
        #[arg(long, default_value_t = ForestConfig::default().n_trees)]
        n_trees: usize,
        #[arg(long, default_value_t = DebiasConfig::default().n_surrogates)]
        surrogates: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Paired t-tests between every pair of columns of `x`
    Ttest {
        /// propagate, omit or raise
        #[arg(long, default_value_t = NanPolicy::default())]
        nan_policy: NanPolicy,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "putils=debug" } else { "putils=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_score(w: &mut StWriter, res: &DebiasedScore) {
    w.add_f64("score", &[res.score], &[1]);
    w.add_f64("surrogate_mean", &[res.surrogate_mean], &[1]);
    w.add_f64("surrogates", &res.surrogates, &[res.surrogates.len()]);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let input = args.input.context("--input is required")?;
    let output = args.output.context("--output is required")?;

    let ds = Dataset::load(&input)?;
    info!(rows = ds.x.nrows(), cols = ds.x.ncols(), labels = ds.y.is_some(), "loaded {}", input.display());

    let mut w = StWriter::new();
    match args.command {
        Command::Smooth { window_len, window } => {
            let xs = smooth_array(ds.x.view(), window_len, window)?;
            w.add_f64_arr2("x", &xs);
        }
        Command::Temporal { mode, n } => {
            let y = ds.labels("temporal")?;
            let (xt, yt) = temporal_processing(ds.x.view(), y, mode, n)?;
            w.add_f64_arr2("x", &xt);
            w.add_i64("y", &yt, &[yt.len()]);
        }
        Command::Embed { nlags } => {
            let y = ds.labels("embed")?;
            let (xe, ye, lags) = temporal_embedding_with_lags(ds.x.view(), y, nlags)?;
            let lags: Vec<i64> = lags.iter().map(|&l| l as i64).collect();
            w.add_f64_arr2("x", &xe);
            w.add_i64("y", &ye, &[ye.len()]);
            w.add_i64("lags", &lags, &[lags.len()]);
        }
        Command::Lda { surrogates, seed } => {
            let y = ds.labels("lda")?;
            let cfg = DebiasConfig { n_surrogates: surrogates, seed };
            let res = lda_debiased(ds.x.view(), y, &cfg)?;
            info!(score = res.score, chance = res.surrogate_mean, "lda");
            write_score(&mut w, &res);
        }
        Command::Forest { n_trees, surrogates, seed } => {
            let y = ds.labels("forest")?;
            let forest = ForestConfig { n_trees, ..ForestConfig::default() };
            let cfg = DebiasConfig { n_surrogates: surrogates, seed };
            let res = oob_debiased(ds.x.view(), y, &forest, &cfg)?;
            info!(score = res.score, chance = res.surrogate_mean, "oob accuracy");
            write_score(&mut w, &res);
        }
        Command::Ttest { nan_policy } => {
            let d = ds.x.ncols();
            let tests = paired_t_test_all_comparisons(ds.x.view(), nan_policy)?;
            let mut stat = vec![f64::NAN; d * d];
            let mut pval = vec![f64::NAN; d * d];
            for (&i, row) in &tests {
                for (&j, t) in row {
                    stat[i * d + j] = t.statistic;
                    pval[i * d + j] = t.pvalue;
                }
            }
            w.add_f64("statistic", &stat, &[d, d]);
            w.add_f64("pvalue", &pval, &[d, d]);
        }
    }

    w.write(&output)?;
    info!("written → {}", output.display());
    Ok(())
}
