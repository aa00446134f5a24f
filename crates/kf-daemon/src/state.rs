//! Shared runtime state for kf-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The aggregator owns
//! all mutable state (its caches); nothing here needs explicit locking.

use std::sync::Arc;

use serde::Serialize;

use kf_client::KalshiApi;

use crate::aggregator::{AggregatorConfig, PortfolioAggregator};

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Shared handle across all Axum handlers.
pub struct AppState {
    pub build: BuildInfo,
    pub aggregator: PortfolioAggregator,
}

impl AppState {
    pub fn new(api: Arc<dyn KalshiApi>, config: AggregatorConfig) -> Self {
        Self {
            build: BuildInfo {
                service: "kf-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            aggregator: PortfolioAggregator::new(api, config),
        }
    }
}
