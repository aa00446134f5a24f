//! Request and response types for all kf-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum and decoded by tests. The aggregate response keeps the camelCase
//! field names its consumers already depend on; upstream passthrough
//! payloads keep the exchange's snake_case. No business logic lives here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kf_portfolio::PortfolioStats;
use kf_schemas::{Balance, Commentary, EnrichedMarketData, Fill, Order, Position};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

/// Serialize-only: the static strings point into the binary.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /api/kalshi
// ---------------------------------------------------------------------------

/// Which layers of the response were served from cache, and how old the
/// underlying snapshot is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// `true` when the portfolio snapshot was served without upstream calls.
    pub portfolio_cache_hit: bool,
    /// Wall-clock time the portfolio snapshot was fetched upstream.
    pub portfolio_fetched_at: DateTime<Utc>,
    pub commentary_cache_hit: bool,
    /// Event tickers served from the per-event cache.
    pub events_cached: usize,
    /// Event tickers fetched upstream during this request.
    pub events_fetched: usize,
    /// Event fetches that failed; their tickers degrade to ticker-only
    /// enrichment.
    pub events_failed: usize,
}

/// The full aggregate served by `GET /api/kalshi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KalshiApiResponse {
    pub balance: Balance,
    pub positions: Vec<Position>,
    pub fills: Vec<Fill>,
    pub orders: Vec<Order>,
    /// Display-ready metadata per market ticker; always fully populated.
    pub market_details: HashMap<String, EnrichedMarketData>,
    /// Operator commentary keyed by ticker.
    pub commentaries: HashMap<String, Commentary>,
    pub portfolio_stats: PortfolioStats,
    /// Timestamp of the underlying portfolio snapshot.
    pub last_updated: DateTime<Utc>,
    pub cache_metadata: CacheMetadata,
}

/// Body returned with 5xx responses when the upstream fetch failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
