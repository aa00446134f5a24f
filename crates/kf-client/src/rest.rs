//! Concrete REST client for the Kalshi trade API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use kf_schemas::{Balance, EventData, Fill, Market, Order, Position};

use crate::sign::RequestSigner;
use crate::{ClientError, KalshiApi};

/// Page size for cursor-paginated portfolio resources.
const PAGE_LIMIT: &str = "200";

/// Upper bound on pages followed per resource. An account that genuinely
/// exceeds this is truncated and logged rather than looping forever on a
/// misbehaving cursor.
const MAX_PAGES: usize = 20;

/// Authenticated HTTP client for one Kalshi environment.
pub struct KalshiClient {
    http: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
}

impl KalshiClient {
    /// `base_url` selects the environment (live or demo) and is also the
    /// injection point for mock servers in tests.
    pub fn new(
        base_url: String,
        key_id: String,
        private_key_pem: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            signer: RequestSigner::from_pem(key_id, private_key_pem)?,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        // Sign over the URL path only; the query string is excluded.
        let sign_path = reqwest::Url::parse(&url)
            .map_err(|e| ClientError::Transport(format!("bad url {url}: {e}")))?
            .path()
            .to_string();

        let mut req = self.http.get(&url).query(query);
        for (name, value) in self.signer.headers("GET", &sign_path) {
            req = req.header(name, value);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }

    /// Follow `cursor` until the resource is exhausted (or [`MAX_PAGES`]).
    async fn paginate<P, T>(
        &self,
        path: &str,
        extract: fn(P) -> (Vec<T>, Option<String>),
    ) -> Result<Vec<T>, ClientError>
    where
        P: DeserializeOwned,
    {
        let mut out: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query: Vec<(&str, String)> = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(c) = &cursor {
                query.push(("cursor", c.clone()));
            }

            let page: P = self.get_json(path, &query).await?;
            let (items, next) = extract(page);
            out.extend(items);

            cursor = next.filter(|c| !c.is_empty());
            if cursor.is_none() {
                return Ok(out);
            }
        }

        warn!(path, pages = MAX_PAGES, "pagination cap hit; result truncated");
        Ok(out)
    }
}

#[async_trait]
impl KalshiApi for KalshiClient {
    fn name(&self) -> &'static str {
        "kalshi"
    }

    async fn balance(&self) -> Result<Balance, ClientError> {
        debug!("fetching balance");
        self.get_json("/portfolio/balance", &[]).await
    }

    async fn positions(&self) -> Result<Vec<Position>, ClientError> {
        debug!("fetching positions");
        self.paginate("/portfolio/positions", |p: PositionsPage| {
            (p.market_positions, p.cursor)
        })
        .await
    }

    async fn fills(&self) -> Result<Vec<Fill>, ClientError> {
        debug!("fetching fills");
        self.paginate("/portfolio/fills", |p: FillsPage| (p.fills, p.cursor))
            .await
    }

    async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        debug!("fetching orders");
        self.paginate("/portfolio/orders", |p: OrdersPage| (p.orders, p.cursor))
            .await
    }

    async fn event(&self, event_ticker: &str) -> Result<EventData, ClientError> {
        debug!(event_ticker, "fetching event");
        let envelope: EventEnvelope = self
            .get_json(
                &format!("/events/{event_ticker}"),
                &[("with_nested_markets", "true".to_string())],
            )
            .await?;

        let mut event = envelope.event;
        // Some API versions return markets beside the event instead of nested.
        if event.markets.is_empty() && !envelope.markets.is_empty() {
            event.markets = envelope.markets;
        }
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes (private to this module)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PositionsPage {
    #[serde(default)]
    market_positions: Vec<Position>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FillsPage {
    #[serde(default)]
    fills: Vec<Fill>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    orders: Vec<Order>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    event: EventData,
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// Pull a human-readable message out of an error body, falling back to the
/// raw (truncated) text for non-JSON responses.
fn extract_error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ApiErrorBody>(body) {
        if let Some(detail) = parsed.error {
            return match (detail.code, detail.message) {
                (Some(c), Some(m)) => format!("{c}: {m}"),
                (_, Some(m)) => m,
                (Some(c), None) => c,
                (None, None) => "unknown".to_string(),
            };
        }
        if let Some(m) = parsed.message {
            return m;
        }
    }
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
