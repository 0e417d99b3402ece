//! Integration test: single-hop quoting and payment against one ledger.
//!
//! Drives a `LedgerClient` end to end over the in-memory mock endpoint:
//! connector fan-out, cheapest-quote selection, decline handling, and the
//! transfer that follows an accepted quote.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use ilx_core::{IlpPacketData, IlpPayload};
use ilx_integration_tests::{addr, dec, init_tracing};
use ilx_ledger::testing::{quote_response, MockEndpoint, QuoteBehavior};
use ilx_ledger::{
    ClientConfig, ConnectOptions, LedgerClient, LedgerError, PaymentParams, QuoteParams,
};

fn client_over(endpoint: Arc<MockEndpoint>, timeout: Duration) -> LedgerClient {
    let config = ClientConfig {
        message_timeout: timeout,
        ..ClientConfig::default()
    };
    LedgerClient::new(endpoint, config)
}

// =========================================================================
// Quote fan-out
// =========================================================================

#[tokio::test]
async fn test_fanout_mixes_responses_declines_and_silence() {
    init_tracing();
    let endpoint = Arc::new(
        MockEndpoint::new("ledger.a.", "ledger.a.alice").with_connectors(&[
            "ledger.a.mark",
            "ledger.a.mary",
            "ledger.a.mute",
        ]),
    );
    endpoint.script_quote(
        &addr("ledger.a.mark"),
        QuoteBehavior::Respond(quote_response("120", "100", "ledger.a.mark")),
    );
    endpoint.script_quote(
        &addr("ledger.a.mary"),
        QuoteBehavior::Decline {
            name: "AssetsNotTradedError".into(),
            message: "unsupported pair".into(),
        },
    );
    endpoint.script_quote(&addr("ledger.a.mute"), QuoteBehavior::Silent);

    let client = client_over(Arc::clone(&endpoint), Duration::from_millis(150));

    let mut params = QuoteParams::new(addr("ledger.b.bob"));
    params.destination_amount = Some(dec("100"));
    let quote = client
        .quote(params)
        .await
        .unwrap()
        .expect("the responding connector should win");

    assert_eq!(quote.source_amount, dec("120"));
    assert_eq!(quote.connector_account, Some(addr("ledger.a.mark")));
    // All three connectors were asked despite the decline and the silence.
    assert_eq!(endpoint.sent_messages().len(), 3);
}

#[tokio::test]
async fn test_all_connectors_decline_yields_absent_quote() {
    init_tracing();
    let endpoint = Arc::new(
        MockEndpoint::new("ledger.a.", "ledger.a.alice")
            .with_connectors(&["ledger.a.mark", "ledger.a.mary"]),
    );
    for connector in ["ledger.a.mark", "ledger.a.mary"] {
        endpoint.script_quote(
            &addr(connector),
            QuoteBehavior::Decline {
                name: "AssetsNotTradedError".into(),
                message: "unsupported pair".into(),
            },
        );
    }
    let client = client_over(Arc::clone(&endpoint), Duration::from_millis(150));

    let mut params = QuoteParams::new(addr("ledger.b.bob"));
    params.source_amount = Some(dec("10"));
    let quote = client.quote(params).await.unwrap();
    assert!(quote.is_none(), "all-decline must be absence, not an error");
}

#[tokio::test]
async fn test_silent_connectors_bound_the_quote_by_timeout() {
    init_tracing();
    let endpoint = Arc::new(
        MockEndpoint::new("ledger.a.", "ledger.a.alice").with_connectors(&["ledger.a.mute"]),
    );
    endpoint.script_quote(&addr("ledger.a.mute"), QuoteBehavior::Silent);

    let timeout = Duration::from_millis(120);
    let client = client_over(Arc::clone(&endpoint), timeout);

    let mut params = QuoteParams::new(addr("ledger.b.bob"));
    params.source_amount = Some(dec("10"));

    let started = Instant::now();
    let quote = client.quote(params).await.unwrap();
    let elapsed = started.elapsed();

    assert!(quote.is_none());
    assert!(elapsed >= timeout, "returned before the timeout: {:?}", elapsed);
    assert!(
        elapsed < timeout + Duration::from_millis(300),
        "returned far too late: {:?}",
        elapsed
    );
}

// =========================================================================
// Quote → payment
// =========================================================================

#[tokio::test]
async fn test_quote_then_send_quoted_payment() {
    init_tracing();
    let endpoint = Arc::new(
        MockEndpoint::new("ledger.a.", "ledger.a.alice").with_connectors(&["ledger.a.mark"]),
    );
    endpoint.script_quote(
        &addr("ledger.a.mark"),
        QuoteBehavior::Respond(quote_response("120", "100", "ledger.a.mark")),
    );
    let client = client_over(Arc::clone(&endpoint), Duration::from_millis(150));
    client.connect(ConnectOptions::default()).await.unwrap();

    let mut params = QuoteParams::new(addr("ledger.b.bob"));
    params.destination_amount = Some(dec("100"));
    let quote = client.quote(params).await.unwrap().expect("quote");

    let payment = PaymentParams {
        source_amount: quote.source_amount.clone(),
        destination_amount: quote.destination_amount.clone(),
        destination_account: addr("ledger.b.bob"),
        connector_account: quote.connector_account.clone(),
        destination_memo: Some(serde_json::json!({"invoice": "inv-42"})),
        execution_condition: Some("cc:0:3:dB-8fb14MdO75Brp_Pvh4d7ganckilrRl13RS_UmrXA:32".into()),
        expires_at: Some(Utc::now() + chrono::Duration::seconds(11)),
        unsafe_optimistic_transport: false,
        uuid: Some(Uuid::now_v7()),
    };
    let id = client.send_quoted_payment(payment).await.unwrap();

    let transfers = endpoint.sent_transfers();
    assert_eq!(transfers.len(), 1);
    let transfer = &transfers[0];
    assert_eq!(transfer.id, id);
    assert_eq!(transfer.account, addr("ledger.a.mark"));
    assert_eq!(transfer.amount, dec("120"));
    assert!(transfer.execution_condition.is_some());
    assert!(transfer.expires_at.is_some());

    // The destination leg travels inside the opaque packet.
    match &transfer.ilp {
        IlpPayload::Packet(packet) => {
            let data = IlpPacketData::from_packet(packet).unwrap();
            assert_eq!(data.account, addr("ledger.b.bob"));
            assert_eq!(data.amount, dec("100"));
        }
        other => panic!("expected packet payload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failure_on_transfer_propagates() {
    init_tracing();
    let endpoint = Arc::new(MockEndpoint::new("ledger.a.", "ledger.a.alice"));
    let client = client_over(Arc::clone(&endpoint), Duration::from_millis(150));
    endpoint.fail_sends(true);

    let payment = PaymentParams {
        source_amount: dec("1"),
        destination_amount: dec("1"),
        destination_account: addr("ledger.a.bob"),
        connector_account: None,
        destination_memo: None,
        execution_condition: Some("cc:0:3:digest:32".into()),
        expires_at: Some(Utc::now() + chrono::Duration::seconds(5)),
        unsafe_optimistic_transport: false,
        uuid: None,
    };
    let err = client.send_quoted_payment(payment).await.unwrap_err();
    assert!(matches!(err, LedgerError::Transport(_)));
}
