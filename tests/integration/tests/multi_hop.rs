//! Integration test: multi-hop quote composition across ledgers.
//!
//! A payment from `ledger.a.` to `ledger.c.` must cross the intermediate
//! `ledger.b.`: the routing table supplies the head leg, a connector on the
//! intermediate ledger quotes the tail, and the core composes both into one
//! end-to-end quote.

use std::sync::Arc;
use std::time::Duration;

use ilx_integration_tests::{addr, curve, dec, init_tracing};
use ilx_ledger::testing::{MockEndpoint, QuoteBehavior};
use ilx_ledger::{ClientConfig, LedgerClient, LedgerEvent, QuoteResponseBody};
use ilx_routing::{
    CoreConfig, PrefixRoutingTable, QuoteQuery, RoutingCore, TableRoute, TailQuoteFallback,
};

fn client_for(endpoint: Arc<MockEndpoint>) -> Arc<LedgerClient> {
    let config = ClientConfig {
        message_timeout: Duration::from_millis(200),
        ..ClientConfig::default()
    };
    Arc::new(LedgerClient::new(endpoint, config))
}

/// Table: a direct A→B pair plus an advertised A→(B)→C route, both through
/// the connector `ledger.a.mark`, each leg halving the amount with a
/// 3-second window.
fn routing_table() -> Arc<PrefixRoutingTable> {
    let table = Arc::new(PrefixRoutingTable::new());
    table
        .add_route(TableRoute {
            source_ledger: addr("ledger.a."),
            next_ledger: addr("ledger.b."),
            destination_prefix: addr("ledger.b."),
            connector_address: addr("ledger.a.mark"),
            liquidity_curve: curve(&[("0", "0"), ("100", "50")]),
            min_message_window: 3.0,
            local: true,
        })
        .unwrap();
    table
        .add_route(TableRoute {
            source_ledger: addr("ledger.a."),
            next_ledger: addr("ledger.b."),
            destination_prefix: addr("ledger.c."),
            connector_address: addr("ledger.a.mark"),
            liquidity_curve: curve(&[("0", "0"), ("100", "50")]),
            min_message_window: 3.0,
            local: false,
        })
        .unwrap();
    table
}

/// The connector on the intermediate ledger quoting B→C with a second
/// halving curve and a 3-second window expressed as its expiry delta.
fn tail_quote() -> QuoteBehavior {
    QuoteBehavior::Respond(QuoteResponseBody {
        source_amount: dec("50"),
        destination_amount: dec("25"),
        source_connector_account: addr("ledger.b.connie"),
        source_expiry_duration: Some(3.5),
        destination_expiry_duration: Some(0.5),
        liquidity_curve: Some(curve(&[("0", "0"), ("100", "50")])),
    })
}

fn build_core(tail: QuoteBehavior, config: CoreConfig) -> (RoutingCore, Arc<MockEndpoint>) {
    let endpoint_b = Arc::new(
        MockEndpoint::new("ledger.b.", "ledger.b.client").with_connectors(&["ledger.b.connie"]),
    );
    endpoint_b.script_quote(&addr("ledger.b.connie"), tail);

    let core = RoutingCore::new(routing_table(), config);
    core.add_client(addr("ledger.b."), client_for(Arc::clone(&endpoint_b)))
        .unwrap();
    (core, endpoint_b)
}

// =========================================================================
// Composition
// =========================================================================

#[tokio::test]
async fn test_two_hop_quote_composes_amounts_windows_and_expiries() {
    init_tracing();
    let (core, _endpoint_b) = build_core(tail_quote(), CoreConfig::default());

    let mut query = QuoteQuery::new(addr("ledger.a.alice"), addr("ledger.c.bob"));
    query.destination_amount = Some(dec("25"));
    query.destination_expiry_duration = Some(0.5);
    let quote = core.quote(query).await.unwrap().expect("composed quote");

    assert_eq!(quote.source_amount, dec("100"));
    assert_eq!(quote.destination_amount, dec("25"));
    assert_eq!(quote.min_message_window, 6.0);
    assert_eq!(quote.destination_expiry_duration, 0.5);
    assert_eq!(quote.source_expiry_duration, 6.5);
    assert_eq!(quote.next_ledger, addr("ledger.b."));
    assert_eq!(quote.destination_ledger, addr("ledger.c."));
    assert_eq!(quote.connector_account, addr("ledger.a.mark"));
}

#[tokio::test]
async fn test_single_hop_stays_local() {
    init_tracing();
    let (core, endpoint_b) = build_core(tail_quote(), CoreConfig::default());

    let mut query = QuoteQuery::new(addr("ledger.a.alice"), addr("ledger.b.bob"));
    query.source_amount = Some(dec("100"));
    let quote = core.quote(query).await.unwrap().expect("direct quote");

    assert_eq!(quote.destination_amount, dec("50"));
    assert_eq!(quote.min_message_window, 3.0);
    // The direct leg needs no remote tail.
    assert!(endpoint_b.sent_messages().is_empty());
}

#[tokio::test]
async fn test_quote_twice_is_identical() {
    init_tracing();
    let (core, _endpoint_b) = build_core(tail_quote(), CoreConfig::default());

    let mut query = QuoteQuery::new(addr("ledger.a.alice"), addr("ledger.c.bob"));
    query.destination_amount = Some(dec("25"));
    query.destination_expiry_duration = Some(0.5);

    let first = core.quote(query.clone()).await.unwrap();
    let second = core.quote(query).await.unwrap();
    assert_eq!(first, second);
}

// =========================================================================
// Tail fallback policy
// =========================================================================

#[tokio::test]
async fn test_tail_timeout_falls_back_per_policy() {
    init_tracing();

    // LocalQuote policy: the head leg is still quoted.
    let (core, _b) = build_core(QuoteBehavior::Silent, CoreConfig::default());
    let mut query = QuoteQuery::new(addr("ledger.a.alice"), addr("ledger.c.bob"));
    query.source_amount = Some(dec("100"));
    let quote = core.quote(query).await.unwrap().expect("local fallback");
    assert_eq!(quote.destination_amount, dec("50"));
    assert_eq!(quote.min_message_window, 3.0);

    // AbsentResult policy: nothing is returned.
    let config = CoreConfig {
        tail_quote_fallback: TailQuoteFallback::AbsentResult,
        ..CoreConfig::default()
    };
    let (core, _b) = build_core(QuoteBehavior::Silent, config);
    let mut query = QuoteQuery::new(addr("ledger.a.alice"), addr("ledger.c.bob"));
    query.source_amount = Some(dec("100"));
    assert!(core.quote(query).await.unwrap().is_none());
}

// =========================================================================
// Event aggregation
// =========================================================================

#[tokio::test]
async fn test_core_relays_events_from_all_clients() {
    init_tracing();
    let endpoint_b = Arc::new(MockEndpoint::new("ledger.b.", "ledger.b.client"));
    let endpoint_c = Arc::new(MockEndpoint::new("ledger.c.", "ledger.c.client"));

    let core = RoutingCore::new(routing_table(), CoreConfig::default());
    core.add_client(addr("ledger.b."), client_for(Arc::clone(&endpoint_b)))
        .unwrap();
    core.add_client(addr("ledger.c."), client_for(Arc::clone(&endpoint_c)))
        .unwrap();

    let mut events = core.subscribe();
    endpoint_b.emit(LedgerEvent::Connected);
    endpoint_c.emit(LedgerEvent::Disconnected);

    let mut seen = Vec::new();
    for _ in 0..2 {
        let tagged = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event within a second")
            .expect("channel open");
        seen.push((tagged.prefix, tagged.event.name()));
    }
    assert!(seen.contains(&(addr("ledger.b."), "connect")));
    assert!(seen.contains(&(addr("ledger.c."), "disconnect")));
}
