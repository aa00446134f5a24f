//! kf-portfolio
//!
//! Portfolio mathematics for the aggregation daemon:
//! - integer-cent money behind a newtype
//! - event-ticker derivation and display enrichment
//! - open/closed P&L statistics over positions + fills
//!
//! Pure deterministic logic. No IO, no time, no network wiring.

mod cents;
mod enrich;
mod stats;

pub use cents::Cents;
pub use enrich::{derive_event_ticker, enrich_market};
pub use stats::{compute_stats, ClosedPosition, OpenPosition, PortfolioStats};
