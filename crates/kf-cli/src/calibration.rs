//! Prediction calibration scoring.
//!
//! Predictions live as markdown files with YAML front-matter (`title`,
//! `probability` in [0, 1], optional `outcome` once resolved). The Brier
//! score and the per-bucket calibration table are computed over resolved
//! predictions only.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use kf_commentary::split_front_matter;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One operator prediction. `outcome` is `None` until the market resolves.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub title: String,
    pub probability: f64,
    pub outcome: Option<bool>,
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}

/// One row of the calibration table: predictions whose probability fell in
/// `[lo, hi)` versus how often they actually resolved YES.
#[derive(Debug, Clone)]
pub struct CalibrationBucket {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    pub predicted_mean: f64,
    pub observed_rate: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Mean squared error between stated probability and outcome, over resolved
/// predictions. 0 is perfect; 0.25 matches always saying 50%. `None` when
/// nothing has resolved.
pub fn brier_score(predictions: &[Prediction]) -> Option<f64> {
    let resolved: Vec<_> = predictions.iter().filter(|p| p.is_resolved()).collect();
    if resolved.is_empty() {
        return None;
    }
    let sum: f64 = resolved
        .iter()
        .map(|p| {
            let outcome = if p.outcome == Some(true) { 1.0 } else { 0.0 };
            (p.probability - outcome).powi(2)
        })
        .sum();
    Some(sum / resolved.len() as f64)
}

/// Bucket resolved predictions into `n` equal probability ranges.
///
/// Empty buckets are kept (count 0) so the table always covers [0, 1]. The
/// final bucket is closed on the right so probability 1.0 lands in it.
pub fn calibration_buckets(predictions: &[Prediction], n: usize) -> Vec<CalibrationBucket> {
    if n == 0 {
        return Vec::new();
    }
    let width = 1.0 / n as f64;

    let mut buckets: Vec<CalibrationBucket> = (0..n)
        .map(|i| CalibrationBucket {
            lo: i as f64 * width,
            hi: (i + 1) as f64 * width,
            count: 0,
            predicted_mean: 0.0,
            observed_rate: 0.0,
        })
        .collect();

    for p in predictions.iter().filter(|p| p.is_resolved()) {
        let idx = ((p.probability / width) as usize).min(n - 1);
        let bucket = &mut buckets[idx];
        bucket.count += 1;
        bucket.predicted_mean += p.probability;
        if p.outcome == Some(true) {
            bucket.observed_rate += 1.0;
        }
    }

    for bucket in &mut buckets {
        if bucket.count > 0 {
            bucket.predicted_mean /= bucket.count as f64;
            bucket.observed_rate /= bucket.count as f64;
        }
    }
    buckets
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PredictionFrontMatter {
    #[serde(default)]
    title: Option<String>,
    probability: f64,
    #[serde(default)]
    outcome: Option<bool>,
}

/// Parse one prediction document.
pub fn parse_prediction(raw: &str) -> Result<Prediction> {
    let Some((yaml, _body)) = split_front_matter(raw) else {
        bail!("missing front-matter block");
    };
    let fm: PredictionFrontMatter =
        serde_yaml::from_str(yaml).context("invalid prediction front-matter")?;
    if !(0.0..=1.0).contains(&fm.probability) {
        bail!("probability {} outside [0, 1]", fm.probability);
    }
    Ok(Prediction {
        title: fm.title.unwrap_or_else(|| "(untitled)".to_string()),
        probability: fm.probability,
        outcome: fm.outcome,
    })
}

/// Load every `*.md` prediction under `dir`. Strict: a corrupt file fails
/// the run, naming the file.
pub fn load_predictions_dir(dir: &Path) -> Result<Vec<Prediction>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read predictions dir: {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read prediction file: {}", path.display()))?;
        let prediction = parse_prediction(&raw)
            .with_context(|| format!("failed to parse prediction file: {}", path.display()))?;
        out.push(prediction);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
