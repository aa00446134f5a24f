//! Cache behavior against a counting mock upstream, under a paused tokio
//! clock: TTL windows, per-event reuse, and single-flight collapsing.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{event, fill, make_state, position, MockApi};
use kf_schemas::FillAction;

fn trading_mock() -> MockApi {
    let mut api = MockApi::new();
    api.positions = vec![position("KXFED-26-HIKE", 10)];
    api.fills = vec![
        fill("KXFED-26-HIKE", "f1", FillAction::Buy, 10, 50),
        fill("KXCPI-26-HI", "f2", FillAction::Buy, 5, 40),
        fill("KXCPI-26-HI", "f3", FillAction::Sell, 5, 55),
    ];
    api.events.insert(
        "KXFED-26".to_string(),
        event("KXFED-26", "Fed decision", vec![("KXFED-26-HIKE", 70)]),
    );
    api.events.insert(
        "KXCPI-26".to_string(),
        event("KXCPI-26", "CPI print", vec![("KXCPI-26-HI", 45)]),
    );
    api
}

#[tokio::test(start_paused = true)]
async fn second_request_inside_ttl_skips_upstream_portfolio_fetch() {
    let api = Arc::new(trading_mock());
    let state = make_state(Arc::clone(&api));

    let first = state.aggregator.snapshot().await.unwrap();
    assert!(!first.cache_metadata.portfolio_cache_hit);

    tokio::time::advance(Duration::from_secs(60)).await;

    let second = state.aggregator.snapshot().await.unwrap();
    assert!(second.cache_metadata.portfolio_cache_hit);
    assert_eq!(
        api.portfolio_calls.load(Ordering::SeqCst),
        1,
        "a second request inside the 2 minute TTL must not refetch"
    );

    // Derived stats are recomputed on the hit path all the same.
    assert_eq!(second.portfolio_stats.open_positions.len(), 1);
    assert_eq!(second.last_updated, first.last_updated);
}

#[tokio::test(start_paused = true)]
async fn portfolio_refetches_after_ttl_expiry() {
    let api = Arc::new(trading_mock());
    let state = make_state(Arc::clone(&api));

    let _ = state.aggregator.snapshot().await.unwrap();
    tokio::time::advance(Duration::from_secs(121)).await;
    let refreshed = state.aggregator.snapshot().await.unwrap();

    assert!(!refreshed.cache_metadata.portfolio_cache_hit);
    assert_eq!(api.portfolio_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn events_fetch_once_and_stay_warm_across_portfolio_refreshes() {
    let api = Arc::new(trading_mock());
    let state = make_state(Arc::clone(&api));

    let first = state.aggregator.snapshot().await.unwrap();
    assert_eq!(first.cache_metadata.events_fetched, 2);
    assert_eq!(first.cache_metadata.events_cached, 0);

    // Past the portfolio TTL but well inside the 60 minute event TTL.
    tokio::time::advance(Duration::from_secs(121)).await;
    let second = state.aggregator.snapshot().await.unwrap();

    assert_eq!(second.cache_metadata.events_fetched, 0);
    assert_eq!(second.cache_metadata.events_cached, 2);
    assert_eq!(api.event_call_count("KXFED-26"), 1);
    assert_eq!(api.event_call_count("KXCPI-26"), 1);
}

#[tokio::test(start_paused = true)]
async fn events_refetch_after_their_own_ttl() {
    let api = Arc::new(trading_mock());
    let state = make_state(Arc::clone(&api));

    let _ = state.aggregator.snapshot().await.unwrap();
    tokio::time::advance(Duration::from_secs(3601)).await;
    let late = state.aggregator.snapshot().await.unwrap();

    assert_eq!(late.cache_metadata.events_fetched, 2);
    assert_eq!(api.event_call_count("KXFED-26"), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_cold_requests_collapse_into_one_upstream_fetch() {
    let mut api = trading_mock();
    api.fetch_delay = Some(Duration::from_millis(50));
    let api = Arc::new(api);
    let state = make_state(Arc::clone(&api));

    let a = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.aggregator.snapshot().await.unwrap() })
    };
    let b = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.aggregator.snapshot().await.unwrap() })
    };

    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(
        api.portfolio_calls.load(Ordering::SeqCst),
        1,
        "concurrent misses must be coalesced by the single-flight guard"
    );
    assert_eq!(
        usize::from(ra.cache_metadata.portfolio_cache_hit)
            + usize::from(rb.cache_metadata.portfolio_cache_hit),
        1,
        "exactly one request performed the refresh"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_is_retried_by_the_next_request() {
    let api = Arc::new(trading_mock());
    let state = make_state(Arc::clone(&api));

    api.fail_portfolio.store(true, Ordering::SeqCst);
    assert!(state.aggregator.snapshot().await.is_err());

    api.fail_portfolio.store(false, Ordering::SeqCst);
    let ok = state.aggregator.snapshot().await.unwrap();
    assert!(!ok.cache_metadata.portfolio_cache_hit);
    assert_eq!(api.portfolio_calls.load(Ordering::SeqCst), 2);
}
