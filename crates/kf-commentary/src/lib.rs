//! Operator commentary ingestion.
//!
//! Commentary lives as markdown files in a configured directory, one file per
//! ticker, with YAML front-matter (`ticker`, optional `title` / `position` /
//! `side` / `theme` / `tags` / `thesis`) followed by a freeform body. Files
//! are read-only input; nothing here writes.
//!
//! [`load_dir`] degrades any read or parse failure to an empty map: a broken
//! commentary directory costs the thesis column, never the portfolio view.
//! The failure is logged; a single corrupt file empties the whole load (the
//! strict loader is exposed for callers that want the error).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;

use kf_schemas::Commentary;

// ---------------------------------------------------------------------------
// Front-matter parsing
// ---------------------------------------------------------------------------

/// Split a document into (front-matter YAML, body).
///
/// The document must open with a `---` line; the front-matter runs to the
/// next `---` line. Returns `None` when there is no front-matter block.
pub fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    // Find the closing delimiter on its own line.
    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse one commentary document (front-matter + body).
pub fn parse_commentary(raw: &str) -> Result<Commentary> {
    let Some((yaml, body)) = split_front_matter(raw) else {
        bail!("missing front-matter block");
    };

    let mut commentary: Commentary =
        serde_yaml::from_str(yaml).context("invalid commentary front-matter")?;

    if commentary.ticker.trim().is_empty() {
        bail!("front-matter has no ticker");
    }
    commentary.ticker = commentary.ticker.trim().to_string();
    commentary.body = body.trim().to_string();
    Ok(commentary)
}

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

/// Load every `*.md` file under `dir` into a `ticker → Commentary` map.
///
/// Any failure (unreadable directory, unreadable file, bad front-matter)
/// fails the whole load. A later duplicate ticker replaces an earlier one.
pub fn load_dir_strict(dir: &Path) -> Result<HashMap<String, Commentary>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read commentary dir: {}", dir.display()))?;

    let mut out = HashMap::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read commentary file: {}", path.display()))?;
        let commentary = parse_commentary(&raw)
            .with_context(|| format!("failed to parse commentary file: {}", path.display()))?;
        out.insert(commentary.ticker.clone(), commentary);
    }
    Ok(out)
}

/// Degrading wrapper around [`load_dir_strict`]: on any failure, log and
/// return an empty map.
pub fn load_dir(dir: &Path) -> HashMap<String, Commentary> {
    match load_dir_strict(dir) {
        Ok(map) => map,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "commentary load failed; serving empty map");
            HashMap::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
