//! Shared test support: an in-process mock upstream with call counting,
//! canned payload builders, and router helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use kf_client::{ClientError, KalshiApi};
use kf_daemon::aggregator::AggregatorConfig;
use kf_daemon::state::AppState;
use kf_schemas::{Balance, EventData, Fill, FillAction, Market, MarketSide, Order, Position};

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

/// Canned upstream with per-resource call counters. Event tickers absent
/// from `events` fail their fetch with a 404-style error.
pub struct MockApi {
    pub balance: Balance,
    pub positions: Vec<Position>,
    pub fills: Vec<Fill>,
    pub orders: Vec<Order>,
    pub events: HashMap<String, EventData>,
    /// When set, the portfolio fetch fails at the balance call.
    pub fail_portfolio: AtomicBool,
    /// Sleep inserted into the balance call to widen race windows.
    pub fetch_delay: Option<Duration>,
    pub portfolio_calls: AtomicUsize,
    pub event_calls: Mutex<HashMap<String, usize>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            balance: Balance {
                balance: 104_250,
                payout: 0,
                updated_ts: None,
            },
            positions: Vec::new(),
            fills: Vec::new(),
            orders: Vec::new(),
            events: HashMap::new(),
            fail_portfolio: AtomicBool::new(false),
            fetch_delay: None,
            portfolio_calls: AtomicUsize::new(0),
            event_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn event_call_count(&self, event_ticker: &str) -> usize {
        *self
            .event_calls
            .lock()
            .unwrap()
            .get(event_ticker)
            .unwrap_or(&0)
    }
}

#[async_trait]
impl KalshiApi for MockApi {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn balance(&self) -> Result<Balance, ClientError> {
        self.portfolio_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_portfolio.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 503,
                message: "exchange unavailable".to_string(),
            });
        }
        Ok(self.balance.clone())
    }

    async fn positions(&self) -> Result<Vec<Position>, ClientError> {
        Ok(self.positions.clone())
    }

    async fn fills(&self) -> Result<Vec<Fill>, ClientError> {
        Ok(self.fills.clone())
    }

    async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        Ok(self.orders.clone())
    }

    async fn event(&self, event_ticker: &str) -> Result<EventData, ClientError> {
        *self
            .event_calls
            .lock()
            .unwrap()
            .entry(event_ticker.to_string())
            .or_insert(0) += 1;
        self.events
            .get(event_ticker)
            .cloned()
            .ok_or_else(|| ClientError::Api {
                status: 404,
                message: format!("event {event_ticker} not found"),
            })
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn position(ticker: &str, count: i64) -> Position {
    Position {
        ticker: ticker.to_string(),
        position: count,
        market_exposure: 0,
        fees_paid: 0,
        realized_pnl: 0,
        total_traded: count.abs(),
        last_updated_ts: None,
    }
}

pub fn fill(ticker: &str, id: &str, action: FillAction, count: i64, price: i64) -> Fill {
    Fill {
        ticker: ticker.to_string(),
        fill_id: id.to_string(),
        action,
        side: MarketSide::Yes,
        count,
        price,
        created_time: Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
    }
}

pub fn event(event_ticker: &str, title: &str, markets: Vec<(&str, i64)>) -> EventData {
    EventData {
        event_ticker: event_ticker.to_string(),
        series_ticker: None,
        title: Some(title.to_string()),
        category: Some("Economics".to_string()),
        markets: markets
            .into_iter()
            .map(|(ticker, last_price)| Market {
                ticker: ticker.to_string(),
                title: None,
                subtitle: None,
                last_price: Some(last_price),
                yes_bid: None,
                no_bid: None,
                status: Some("active".to_string()),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// State / router helpers
// ---------------------------------------------------------------------------

/// Short TTLs keep cache-expiry tests fast under `tokio::time::pause`.
pub fn test_config(commentary_dir: std::path::PathBuf) -> AggregatorConfig {
    AggregatorConfig {
        commentary_dir,
        portfolio_ttl: Duration::from_secs(120),
        events_ttl: Duration::from_secs(3600),
        commentary_ttl: Duration::from_secs(600),
    }
}

/// AppState over a mock upstream with a nonexistent commentary dir (loads
/// as an empty map).
pub fn make_state(api: Arc<MockApi>) -> Arc<AppState> {
    let dir = std::env::temp_dir().join("kf-daemon-tests-no-commentary");
    Arc::new(AppState::new(api, test_config(dir.join("missing"))))
}

/// Drive the router with one request and return (status, body bytes).
pub async fn call(
    router: axum::Router,
    req: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, bytes::Bytes) {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

pub fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

pub fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}
