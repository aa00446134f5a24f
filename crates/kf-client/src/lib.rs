//! kf-client
//!
//! Authenticated REST access to the Kalshi trade API. This crate owns the
//! [`KalshiApi`] trait boundary and the concrete [`KalshiClient`]; callers
//! hold a `Arc<dyn KalshiApi>` so tests can substitute an in-process mock.
//!
//! It does **not** cache or aggregate; the daemon layers that on top.

mod rest;
mod sign;

pub use rest::KalshiClient;
pub use sign::RequestSigner;

use std::fmt;

use async_trait::async_trait;

use kf_schemas::{Balance, EventData, Fill, Order, Position};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`KalshiApi`] implementation may return.
#[derive(Debug)]
pub enum ClientError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// Credentials are missing, unparseable, or signing failed.
    Auth(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Api { status, message } => {
                write!(f, "upstream api error status={status}: {message}")
            }
            ClientError::Decode(msg) => write!(f, "decode error: {msg}"),
            ClientError::Auth(msg) => write!(f, "auth error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

// ---------------------------------------------------------------------------
// API trait
// ---------------------------------------------------------------------------

/// Upstream portfolio/metadata contract.
///
/// Object-safe and `Send + Sync` so the daemon can hold a boxed instance
/// across async task boundaries. The paginated resources return the full
/// account view; implementations follow cursors internally.
#[async_trait]
pub trait KalshiApi: Send + Sync {
    /// Human-readable name identifying this implementation.
    fn name(&self) -> &'static str;

    async fn balance(&self) -> Result<Balance, ClientError>;

    /// All live market positions.
    async fn positions(&self) -> Result<Vec<Position>, ClientError>;

    /// Full fill history.
    async fn fills(&self) -> Result<Vec<Fill>, ClientError>;

    /// Resting orders.
    async fn orders(&self) -> Result<Vec<Order>, ClientError>;

    /// Event metadata (with nested markets) for one event ticker.
    async fn event(&self, event_ticker: &str) -> Result<EventData, ClientError>;
}
