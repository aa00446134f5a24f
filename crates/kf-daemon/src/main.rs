//! kf-daemon entry point.
//!
//! This file is intentionally thin: it loads config and secrets, sets up
//! tracing, builds the shared state, wires middleware, and starts the HTTP
//! server. Route handlers live in `routes.rs`; orchestration lives in
//! `aggregator.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use axum::http::{HeaderValue, Method};
use kf_config::FolioMode;
use kf_daemon::{aggregator::AggregatorConfig, routes, state::AppState};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present. Silent if the file does not exist;
    // production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let mode = FolioMode::parse(&std::env::var("KFOLIO_MODE").unwrap_or_else(|_| "demo".into()))?;
    if mode == FolioMode::Offline {
        bail!("OFFLINE mode has no upstream to serve; use DEMO or LIVE");
    }

    let config = load_config()?;
    info!(mode = mode.as_str(), config_hash = %config.config_hash, "effective config");

    let settings = kf_config::daemon_settings(&config.config_json, mode);
    let secrets = kf_config::resolve_secrets_for_mode(&config.config_json, mode)?;

    // Mode enforcement above guarantees both credentials are present here.
    let api_key_id = secrets.api_key_id.clone().context("api key id missing")?;
    let private_key_pem = secrets
        .private_key_pem
        .clone()
        .context("private key missing")?;
    let client =
        kf_client::KalshiClient::new(settings.base_url.clone(), api_key_id, &private_key_pem)?;

    let shared = Arc::new(AppState::new(
        Arc::new(client),
        AggregatorConfig {
            commentary_dir: settings.commentary_dir.clone(),
            portfolio_ttl: settings.portfolio_ttl,
            events_ttl: settings.events_ttl,
            commentary_ttl: settings.commentary_ttl,
        },
    ));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8090)));
    info!("kf-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Layered config paths come from KFOLIO_CONFIG (comma-separated, merge
/// order) or default to `config/base.yaml` when it exists.
fn load_config() -> anyhow::Result<kf_config::LoadedConfig> {
    if let Ok(paths) = std::env::var("KFOLIO_CONFIG") {
        let paths: Vec<&str> = paths.split(',').map(str::trim).collect();
        return kf_config::load_layered_yaml(&paths);
    }
    if std::path::Path::new("config/base.yaml").exists() {
        return kf_config::load_layered_yaml(&["config/base.yaml"]);
    }
    kf_config::load_layered_yaml_from_strings(&[])
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("KFOLIO_ADDR").ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any)
}
