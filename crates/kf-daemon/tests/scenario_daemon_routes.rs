//! In-process scenario tests for kf-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket:
//! each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot` against a mock upstream.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;

use common::{call, event, fill, get, make_state, parse_json, position, test_config, MockApi};
use kf_daemon::{routes, state::AppState};
use kf_schemas::FillAction;

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = routes::build_router(make_state(Arc::new(MockApi::new())));
    let (status, body) = call(router, get("/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "kf-daemon");
}

// ---------------------------------------------------------------------------
// GET /api/kalshi: happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn portfolio_aggregate_includes_stats_and_enrichment() {
    let mut api = MockApi::new();
    api.positions = vec![position("KXFED-26-HIKE", 10)];
    api.fills = vec![fill("KXFED-26-HIKE", "f1", FillAction::Buy, 10, 50)];
    api.events.insert(
        "KXFED-26".to_string(),
        event("KXFED-26", "Fed decision", vec![("KXFED-26-HIKE", 70)]),
    );

    let router = routes::build_router(make_state(Arc::new(api)));
    let (status, body) = call(router, get("/api/kalshi")).await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);

    assert_eq!(json["balance"]["balance"], 104_250);
    assert_eq!(json["positions"][0]["ticker"], "KXFED-26-HIKE");

    // 10 contracts from 50c marked at 70c.
    let open = &json["portfolioStats"]["openPositions"][0];
    assert_eq!(open["side"], "yes");
    assert_eq!(open["avgEntryPrice"], 50.0);
    assert_eq!(open["currentPrice"], 70);
    assert_eq!(open["unrealizedPnL"], 200);
    assert_eq!(open["unrealizedPnLPercent"], 40.0);
    assert_eq!(json["portfolioStats"]["totalUnrealizedPnL"], 200);

    let details = &json["marketDetails"]["KXFED-26-HIKE"];
    assert_eq!(details["title"], "Fed decision");
    assert_eq!(details["eventTicker"], "KXFED-26");
    assert_eq!(details["category"], "Economics");

    assert_eq!(json["cacheMetadata"]["portfolioCacheHit"], false);
    assert_eq!(json["cacheMetadata"]["eventsFetched"], 1);
    assert!(json["lastUpdated"].is_string());
}

// ---------------------------------------------------------------------------
// GET /api/kalshi: open/closed partition over the wire
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_and_closed_positions_partition_in_response() {
    let mut api = MockApi::new();
    api.positions = vec![position("KXA-26-A", 10)];
    api.fills = vec![
        fill("KXA-26-A", "f1", FillAction::Buy, 10, 45),
        fill("KXC-26-C", "f2", FillAction::Buy, 5, 40),
        fill("KXC-26-C", "f3", FillAction::Sell, 5, 55),
    ];

    let router = routes::build_router(make_state(Arc::new(api)));
    let (status, body) = call(router, get("/api/kalshi")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    let stats = &json["portfolioStats"];
    assert_eq!(stats["openPositions"].as_array().unwrap().len(), 1);
    assert_eq!(stats["openPositions"][0]["ticker"], "KXA-26-A");
    assert_eq!(stats["closedPositions"].as_array().unwrap().len(), 1);
    assert_eq!(stats["closedPositions"][0]["ticker"], "KXC-26-C");
    assert_eq!(stats["closedPositions"][0]["realizedPnL"], 75);
}

// ---------------------------------------------------------------------------
// GET /api/kalshi: upstream failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_failure_returns_502_with_upstream_message() {
    let api = MockApi::new();
    api.fail_portfolio.store(true, Ordering::SeqCst);

    let router = routes::build_router(make_state(Arc::new(api)));
    let (status, body) = call(router, get("/api/kalshi")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json = parse_json(body);
    let msg = json["error"].as_str().unwrap();
    assert!(msg.contains("exchange unavailable"), "got: {msg}");
}

// ---------------------------------------------------------------------------
// GET /api/kalshi: event failure degrades, request still succeeds
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_event_fetch_degrades_enrichment_not_the_request() {
    let mut api = MockApi::new();
    // No event payload registered for this ticker's event: fetch fails.
    api.positions = vec![position("KXGONE-26-X", 5)];
    api.fills = vec![fill("KXGONE-26-X", "f1", FillAction::Buy, 5, 30)];

    let router = routes::build_router(make_state(Arc::new(api)));
    let (status, body) = call(router, get("/api/kalshi")).await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);

    let details = &json["marketDetails"]["KXGONE-26-X"];
    assert_eq!(details["title"], "KXGONE-26-X");
    assert_eq!(details["category"], "Unknown");
    assert_eq!(json["cacheMetadata"]["eventsFailed"], 1);

    // Stats fall back to the entry price for the mark.
    let open = &json["portfolioStats"]["openPositions"][0];
    assert_eq!(open["currentPrice"], 30);
    assert_eq!(open["unrealizedPnL"], 0);
}

// ---------------------------------------------------------------------------
// GET /api/kalshi: commentary enrichment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commentary_title_and_thesis_reach_market_details() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("hike.md"),
        "---\nticker: KXFED-26-HIKE\ntitle: My hike thesis\nthesis: Cuts are priced out\n---\nbody\n",
    )
    .unwrap();

    let mut api = MockApi::new();
    api.positions = vec![position("KXFED-26-HIKE", 10)];
    api.fills = vec![fill("KXFED-26-HIKE", "f1", FillAction::Buy, 10, 50)];
    api.events.insert(
        "KXFED-26".to_string(),
        event("KXFED-26", "Fed decision", vec![("KXFED-26-HIKE", 70)]),
    );

    let state = Arc::new(AppState::new(
        Arc::new(api),
        test_config(dir.path().to_path_buf()),
    ));
    let (status, body) = call(routes::build_router(state), get("/api/kalshi")).await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);

    // Commentary title outranks the event title.
    let details = &json["marketDetails"]["KXFED-26-HIKE"];
    assert_eq!(details["title"], "My hike thesis");
    assert_eq!(details["thesis"], "Cuts are priced out");

    assert_eq!(
        json["commentaries"]["KXFED-26-HIKE"]["title"],
        "My hike thesis"
    );
}

// ---------------------------------------------------------------------------
// Unknown routes return 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let router = routes::build_router(make_state(Arc::new(MockApi::new())));
    let (status, _) = call(router, get("/v1/does_not_exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
