//! Shared wire and domain schema types for kfolio.
//!
//! Upstream payloads (balance / positions / fills / orders / events) keep the
//! exchange's snake_case field names and integer-cent money. Display-facing
//! derived types (`EnrichedMarketData`, `Commentary`) serialize camelCase to
//! match the public response surface. No business logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sides and actions
// ---------------------------------------------------------------------------

/// Contract side of a binary market. A YES position profits as the price
/// rises; a NO position profits as it falls.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSide {
    Yes,
    No,
}

impl std::fmt::Display for MarketSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketSide::Yes => write!(f, "yes"),
            MarketSide::No => write!(f, "no"),
        }
    }
}

/// BUY or SELL for fills.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillAction {
    Buy,
    Sell,
}

// ---------------------------------------------------------------------------
// Account payloads
// ---------------------------------------------------------------------------

/// Account balance snapshot. All amounts are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub balance: i64,
    #[serde(default)]
    pub payout: i64,
    #[serde(default)]
    pub updated_ts: Option<DateTime<Utc>>,
}

/// A live market position. `position` is a signed contract count:
/// positive = YES (long), negative = NO (short).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub position: i64,
    pub market_exposure: i64,
    pub fees_paid: i64,
    pub realized_pnl: i64,
    pub total_traded: i64,
    #[serde(default)]
    pub last_updated_ts: Option<DateTime<Utc>>,
}

/// An immutable trade execution record. `price` is cents per contract for
/// the side that was traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub ticker: String,
    pub fill_id: String,
    pub action: FillAction,
    pub side: MarketSide,
    pub count: i64,
    pub price: i64,
    pub created_time: DateTime<Utc>,
}

/// A resting or historical order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub ticker: String,
    pub action: FillAction,
    pub side: MarketSide,
    pub status: String,
    pub yes_price: i64,
    pub no_price: i64,
    pub remaining_count: i64,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Event / market metadata
// ---------------------------------------------------------------------------

/// One tradable market inside an event. Prices are cents (0–100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub last_price: Option<i64>,
    #[serde(default)]
    pub yes_bid: Option<i64>,
    #[serde(default)]
    pub no_bid: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Event metadata grouping related markets, as returned by the events
/// resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub event_ticker: String,
    #[serde(default)]
    pub series_ticker: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl EventData {
    /// Find the market record for a specific market ticker, if the event
    /// payload carried it.
    pub fn market(&self, ticker: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.ticker == ticker)
    }
}

// ---------------------------------------------------------------------------
// Operator commentary
// ---------------------------------------------------------------------------

/// Operator-authored thesis for one ticker, parsed from a markdown file's
/// YAML front-matter plus body. File-backed, never mutated by the program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commentary {
    pub ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thesis: Option<String>,
    /// Freeform markdown body below the front-matter.
    #[serde(default)]
    pub body: String,
}

// ---------------------------------------------------------------------------
// Enriched market view
// ---------------------------------------------------------------------------

/// Display-ready join of a ticker's event metadata and operator commentary.
///
/// Always fully populated: when the event fetch failed or the payload is
/// incomplete, fields degrade to the raw ticker / "Unknown" / empty rather
/// than being absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMarketData {
    pub ticker: String,
    pub event_ticker: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub series_ticker: Option<String>,
    #[serde(default)]
    pub last_price: Option<i64>,
    #[serde(default)]
    pub yes_bid: Option<i64>,
    #[serde(default)]
    pub no_bid: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub thesis: Option<String>,
}
