//! Open/closed P&L statistics.
//!
//! `compute_stats` is the whole contract: positions + fills + enriched
//! market data in, [`PortfolioStats`] out. Recomputed on every request,
//! never persisted.
//!
//! Accounting rules:
//! - Average entry price is fill-count weighted over all of a ticker's fills.
//! - Side comes from the sign of the live position (+YES, −NO).
//! - Current price resolves `last_price`, then the side's bid, then the
//!   average entry price; zero prices count as missing.
//! - A NO position profits as the price falls, so its unrealized P&L is
//!   basis minus value.
//! - Tickers with fills but no live position are closed: realized P&L is
//!   sell value minus buy value.
//! - Every division is zero-guarded; percent fields are 0, never NaN.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use kf_schemas::{EnrichedMarketData, Fill, FillAction, MarketSide, Position};

use crate::cents::{clamp_i128, Cents};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// P&L view of one currently-open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub ticker: String,
    pub side: MarketSide,
    /// Absolute contract count.
    pub quantity: i64,
    /// Weighted average entry price in cents (fractional).
    pub avg_entry_price: f64,
    /// Resolved mark price in cents.
    pub current_price: Cents,
    pub cost_basis: Cents,
    pub current_value: Cents,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: Cents,
    #[serde(rename = "unrealizedPnLPercent")]
    pub unrealized_pnl_percent: f64,
    pub fees_paid: Cents,
}

/// P&L view of one fully-closed ticker (fills, no live position).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPosition {
    pub ticker: String,
    pub buy_value: Cents,
    pub sell_value: Cents,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: Cents,
    #[serde(rename = "realizedPnLPercent")]
    pub realized_pnl_percent: f64,
    pub fill_count: usize,
}

/// Derived portfolio statistics for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub open_positions: Vec<OpenPosition>,
    pub closed_positions: Vec<ClosedPosition>,
    pub total_invested: Cents,
    pub total_value: Cents,
    #[serde(rename = "totalUnrealizedPnL")]
    pub total_unrealized_pnl: Cents,
    #[serde(rename = "totalRealizedPnL")]
    pub total_realized_pnl: Cents,
}

// ---------------------------------------------------------------------------
// Fill aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FillAgg {
    count: i128,
    value: i128,
    buy_value: i128,
    sell_value: i128,
    fills: usize,
}

fn group_fills(fills: &[Fill]) -> BTreeMap<String, FillAgg> {
    let mut groups: BTreeMap<String, FillAgg> = BTreeMap::new();
    for f in fills {
        let agg = groups.entry(f.ticker.clone()).or_default();
        let notional = (f.count as i128) * (f.price as i128);
        agg.count += f.count as i128;
        agg.value += notional;
        match f.action {
            FillAction::Buy => agg.buy_value += notional,
            FillAction::Sell => agg.sell_value += notional,
        }
        agg.fills += 1;
    }
    groups
}

// ---------------------------------------------------------------------------
// compute_stats
// ---------------------------------------------------------------------------

/// Compute portfolio statistics from live positions, fill history, and
/// enriched market data.
///
/// For any ticker, the open and closed lists are mutually exclusive: a live
/// (nonzero) position puts it in `open_positions`; otherwise its fills put
/// it in `closed_positions`. Zero-fill tickers produce zeroed averages and
/// percentages rather than NaN.
pub fn compute_stats(
    positions: &[Position],
    fills: &[Fill],
    markets: &HashMap<String, EnrichedMarketData>,
) -> PortfolioStats {
    let groups = group_fills(fills);

    let mut open_positions = Vec::new();
    let mut open_tickers: HashSet<&str> = HashSet::new();

    for p in positions {
        if p.position == 0 {
            continue;
        }
        open_tickers.insert(p.ticker.as_str());

        let side = if p.position > 0 {
            MarketSide::Yes
        } else {
            MarketSide::No
        };
        let quantity = p.position.abs();

        let (sum_count, sum_value) = groups
            .get(&p.ticker)
            .map(|a| (a.count, a.value))
            .unwrap_or((0, 0));

        let (avg_entry_price, avg_entry_cents, cost_basis) = if sum_count > 0 {
            (
                sum_value as f64 / sum_count as f64,
                Cents::new(clamp_i128(sum_value / sum_count)),
                Cents::new(clamp_i128((quantity as i128) * sum_value / sum_count)),
            )
        } else {
            (0.0, Cents::ZERO, Cents::ZERO)
        };

        let current_price = resolve_price(markets.get(&p.ticker), side, avg_entry_cents);
        let current_value = current_price.mul_qty(quantity);

        let unrealized_pnl = match side {
            MarketSide::Yes => current_value.saturating_sub(cost_basis),
            MarketSide::No => cost_basis.saturating_sub(current_value),
        };
        let unrealized_pnl_percent = percent(unrealized_pnl, cost_basis);

        open_positions.push(OpenPosition {
            ticker: p.ticker.clone(),
            side,
            quantity,
            avg_entry_price,
            current_price,
            cost_basis,
            current_value,
            unrealized_pnl,
            unrealized_pnl_percent,
            fees_paid: Cents::new(p.fees_paid),
        });
    }

    let mut closed_positions = Vec::new();
    for (ticker, agg) in &groups {
        if open_tickers.contains(ticker.as_str()) {
            continue;
        }
        let buy_value = Cents::new(clamp_i128(agg.buy_value));
        let sell_value = Cents::new(clamp_i128(agg.sell_value));
        let realized_pnl = sell_value.saturating_sub(buy_value);

        closed_positions.push(ClosedPosition {
            ticker: ticker.clone(),
            buy_value,
            sell_value,
            realized_pnl,
            realized_pnl_percent: percent(realized_pnl, buy_value),
            fill_count: agg.fills,
        });
    }

    let mut total_invested = Cents::ZERO;
    let mut total_value = Cents::ZERO;
    let mut total_unrealized_pnl = Cents::ZERO;
    for o in &open_positions {
        total_invested = total_invested.saturating_add(o.cost_basis);
        total_value = total_value.saturating_add(o.current_value);
        total_unrealized_pnl = total_unrealized_pnl.saturating_add(o.unrealized_pnl);
    }
    let mut total_realized_pnl = Cents::ZERO;
    for c in &closed_positions {
        total_realized_pnl = total_realized_pnl.saturating_add(c.realized_pnl);
    }

    PortfolioStats {
        open_positions,
        closed_positions,
        total_invested,
        total_value,
        total_unrealized_pnl,
        total_realized_pnl,
    }
}

/// Mark-price fallback chain: last trade, then the side's bid, then the
/// average entry price. Zero is treated as missing at every step.
fn resolve_price(
    market: Option<&EnrichedMarketData>,
    side: MarketSide,
    avg_entry: Cents,
) -> Cents {
    let traded = market.and_then(|m| m.last_price).filter(|p| *p > 0);
    let bid = market
        .and_then(|m| match side {
            MarketSide::Yes => m.yes_bid,
            MarketSide::No => m.no_bid,
        })
        .filter(|p| *p > 0);

    traded.or(bid).map(Cents::new).unwrap_or(avg_entry)
}

fn percent(pnl: Cents, basis: Cents) -> f64 {
    if basis.is_zero() {
        0.0
    } else {
        pnl.as_f64() / basis.as_f64() * 100.0
    }
}

// ---------------------------------------------------------------------------
// Unit tests (price resolution and guards; scenario tests live in tests/)
// ---------------------------------------------------------------------------
