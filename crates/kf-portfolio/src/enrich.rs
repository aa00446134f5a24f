//! Market display enrichment.
//!
//! Joins a market ticker to its event metadata and optional operator
//! commentary. This layer never fails: an event fetch that came back empty
//! degrades to ticker-only output so the portfolio view always renders.

use kf_schemas::{Commentary, EnrichedMarketData, EventData};

/// Derive the event ticker from a market ticker by keeping the first two
/// hyphen-delimited segments (`KXFOO-26-BAR` → `KXFOO-26`). Tickers with
/// fewer than two segments map to themselves.
pub fn derive_event_ticker(ticker: &str) -> String {
    let mut parts = ticker.splitn(3, '-');
    match (parts.next(), parts.next()) {
        (Some(series), Some(period)) => format!("{series}-{period}"),
        _ => ticker.to_string(),
    }
}

/// Build the display-ready record for one market ticker.
///
/// Title priority: commentary title, then event title, then the raw ticker.
/// Category falls back to `"Unknown"`. Price fields come from the event's
/// market record when present.
pub fn enrich_market(
    ticker: &str,
    event: Option<&EventData>,
    commentary: Option<&Commentary>,
) -> EnrichedMarketData {
    let market = event.and_then(|e| e.market(ticker));

    let title = commentary
        .and_then(|c| c.title.clone())
        .or_else(|| event.and_then(|e| e.title.clone()))
        .unwrap_or_else(|| ticker.to_string());

    let category = event
        .and_then(|e| e.category.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    EnrichedMarketData {
        ticker: ticker.to_string(),
        event_ticker: event
            .map(|e| e.event_ticker.clone())
            .unwrap_or_else(|| derive_event_ticker(ticker)),
        title,
        category,
        series_ticker: event.and_then(|e| e.series_ticker.clone()),
        last_price: market.and_then(|m| m.last_price),
        yes_bid: market.and_then(|m| m.yes_bid),
        no_bid: market.and_then(|m| m.no_bid),
        status: market.and_then(|m| m.status.clone()),
        thesis: commentary.and_then(|c| c.thesis.clone()),
    }
}
