use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use kf_cli::calibration::{brier_score, calibration_buckets, load_predictions_dir};

#[derive(Parser)]
#[command(name = "kfolio")]
#[command(about = "kfolio operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlay)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Score prediction files (Brier + calibration table)
    Calibration {
        /// Directory of prediction markdown files
        #[arg(long, default_value = "content/predictions")]
        dir: PathBuf,

        /// Number of probability buckets in the table
        #[arg(long, default_value_t = 10)]
        buckets: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::ConfigHash { paths } => config_hash(&paths),
        Commands::Calibration { dir, buckets } => calibration(&dir, buckets),
    }
}

fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = kf_config::load_layered_yaml(&path_refs)?;
    println!("config_hash: {}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

fn calibration(dir: &Path, buckets: usize) -> Result<()> {
    let predictions = load_predictions_dir(dir)?;
    let resolved = predictions.iter().filter(|p| p.is_resolved()).count();

    println!(
        "{} predictions loaded, {} resolved, {} pending",
        predictions.len(),
        resolved,
        predictions.len() - resolved
    );

    match brier_score(&predictions) {
        Some(score) => println!("brier score: {score:.4} (0 = perfect, 0.25 = coin flip)"),
        None => {
            println!("no resolved predictions yet; nothing to score");
            return Ok(());
        }
    }

    println!();
    println!("{:>12}  {:>5}  {:>9}  {:>8}", "bucket", "n", "predicted", "observed");
    for b in calibration_buckets(&predictions, buckets) {
        if b.count == 0 {
            continue;
        }
        println!(
            "{:>5.0}%-{:<4.0}%  {:>5}  {:>8.1}%  {:>7.1}%",
            b.lo * 100.0,
            b.hi * 100.0,
            b.count,
            b.predicted_mean * 100.0,
            b.observed_rate * 100.0
        );
    }
    Ok(())
}
