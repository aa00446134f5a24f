//! Request orchestration: upstream fetches, caching, enrichment, stats.
//!
//! The aggregator owns the three TTL caches (portfolio 2 min, per-event
//! 60 min, commentary 10 min by default) and an upstream client behind the
//! [`KalshiApi`] trait. Derived P&L is cheap and recomputed on every request
//! even when every layer hits cache.
//!
//! Failure semantics:
//! - balance / positions / fills / orders are fetched together and fail
//!   together; the error carries the upstream message.
//! - per-event fetches are isolated: a failed event logs and degrades that
//!   ticker's enrichment to ticker-only.
//! - a failed commentary load degrades to an empty map inside kf-commentary.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use kf_cache::{TtlCell, TtlMap};
use kf_client::{ClientError, KalshiApi};
use kf_portfolio::{compute_stats, derive_event_ticker, enrich_market};
use kf_schemas::{Balance, Commentary, EventData, Fill, Order, Position};

use crate::api_types::{CacheMetadata, KalshiApiResponse};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Cache TTLs and the commentary directory for one aggregator instance.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub commentary_dir: PathBuf,
    pub portfolio_ttl: Duration,
    pub events_ttl: Duration,
    pub commentary_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            commentary_dir: PathBuf::from("content/kalshi"),
            portfolio_ttl: Duration::from_secs(120),
            events_ttl: Duration::from_secs(3600),
            commentary_ttl: Duration::from_secs(600),
        }
    }
}

/// One whole-account upstream snapshot; cached as a unit.
#[derive(Debug, Clone)]
pub struct PortfolioData {
    pub balance: Balance,
    pub positions: Vec<Position>,
    pub fills: Vec<Fill>,
    pub orders: Vec<Order>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Owns the caches and upstream client; one instance lives in `AppState`.
pub struct PortfolioAggregator {
    api: Arc<dyn KalshiApi>,
    commentary_dir: PathBuf,
    portfolio_cache: TtlCell<PortfolioData>,
    events_cache: TtlMap<EventData>,
    commentary_cache: TtlCell<HashMap<String, Commentary>>,
}

impl PortfolioAggregator {
    pub fn new(api: Arc<dyn KalshiApi>, config: AggregatorConfig) -> Self {
        Self {
            api,
            commentary_dir: config.commentary_dir,
            portfolio_cache: TtlCell::new(config.portfolio_ttl),
            events_cache: TtlMap::new(config.events_ttl),
            commentary_cache: TtlCell::new(config.commentary_ttl),
        }
    }

    /// Build the full aggregate response for one request.
    pub async fn snapshot(&self) -> Result<KalshiApiResponse, ClientError> {
        let portfolio = self
            .portfolio_cache
            .get_or_refresh(self.fetch_portfolio())
            .await?;
        debug!(
            cache_hit = portfolio.hit,
            positions = portfolio.value.positions.len(),
            fills = portfolio.value.fills.len(),
            "portfolio snapshot ready"
        );

        // Every ticker that will appear in stats needs enrichment: live
        // positions plus anything in the fill history.
        let mut market_tickers: BTreeSet<String> = BTreeSet::new();
        for p in &portfolio.value.positions {
            if p.position != 0 {
                market_tickers.insert(p.ticker.clone());
            }
        }
        for f in &portfolio.value.fills {
            market_tickers.insert(f.ticker.clone());
        }

        let (events, events_cached, events_fetched, events_failed) =
            self.resolve_events(&market_tickers).await;

        let commentary = self
            .commentary_cache
            .get_or_refresh(async {
                Ok::<_, ClientError>(kf_commentary::load_dir(&self.commentary_dir))
            })
            .await?;

        let mut market_details = HashMap::new();
        for ticker in &market_tickers {
            let event = events.get(&derive_event_ticker(ticker));
            let note = commentary.value.get(ticker);
            market_details.insert(ticker.clone(), enrich_market(ticker, event, note));
        }

        let portfolio_stats = compute_stats(
            &portfolio.value.positions,
            &portfolio.value.fills,
            &market_details,
        );

        let PortfolioData {
            balance,
            positions,
            fills,
            orders,
        } = portfolio.value;

        Ok(KalshiApiResponse {
            balance,
            positions,
            fills,
            orders,
            market_details,
            commentaries: commentary.value,
            portfolio_stats,
            last_updated: portfolio.fetched_at,
            cache_metadata: CacheMetadata {
                portfolio_cache_hit: portfolio.hit,
                portfolio_fetched_at: portfolio.fetched_at,
                commentary_cache_hit: commentary.hit,
                events_cached,
                events_fetched,
                events_failed,
            },
        })
    }

    /// Fetch the four account resources concurrently. All-or-nothing: a
    /// single failure aborts the refresh and the cache keeps its previous
    /// entry (if any).
    async fn fetch_portfolio(&self) -> Result<PortfolioData, ClientError> {
        let (balance, positions, fills, orders) = tokio::try_join!(
            self.api.balance(),
            self.api.positions(),
            self.api.fills(),
            self.api.orders(),
        )?;
        Ok(PortfolioData {
            balance,
            positions,
            fills,
            orders,
        })
    }

    /// Resolve event metadata for the given market tickers: reuse fresh
    /// cache entries, fetch the rest concurrently, isolate per-event
    /// failures.
    async fn resolve_events(
        &self,
        market_tickers: &BTreeSet<String>,
    ) -> (HashMap<String, EventData>, usize, usize, usize) {
        let event_tickers: Vec<String> = market_tickers
            .iter()
            .map(|t| derive_event_ticker(t))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (mut events, cold) = self.events_cache.split_fresh(&event_tickers).await;
        let events_cached = events.len();

        let results = join_all(cold.iter().map(|event_ticker| {
            let event_ticker = event_ticker.clone();
            async move {
                let result = self.api.event(&event_ticker).await;
                (event_ticker, result)
            }
        }))
        .await;

        let mut events_failed = 0;
        for (event_ticker, result) in results {
            match result {
                Ok(event) => {
                    self.events_cache.insert(&event_ticker, event.clone()).await;
                    events.insert(event_ticker, event);
                }
                Err(e) => {
                    events_failed += 1;
                    warn!(
                        event_ticker = %event_ticker,
                        error = %e,
                        "event fetch failed; enrichment degraded for its tickers"
                    );
                }
            }
        }

        let events_fetched = cold.len() - events_failed;
        (events, events_cached, events_fetched, events_failed)
    }
}
