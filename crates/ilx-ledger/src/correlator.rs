use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::endpoint::LedgerEndpoint;
use crate::error::LedgerError;
use crate::message::{ErrorBody, MessageEnvelope, MessageMethod};

/// Matches asynchronous inbound messages to outstanding outbound requests.
///
/// Each outbound request is stamped with a fresh correlation id and tracked
/// until the matching response, an error response, or the timeout — whichever
/// fires first completes the request exactly once. A response arriving after
/// the timeout finds no pending entry and is dropped without effect.
pub struct MessageCorrelator {
    pending: DashMap<Uuid, oneshot::Sender<Result<MessageEnvelope, LedgerError>>>,
}

impl MessageCorrelator {
    /// Create a correlator with no outstanding requests.
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Send a request through the endpoint and await its correlated response.
    ///
    /// A transport failure removes the pending entry and propagates. After
    /// `timeout` with no match the entry is removed and a timeout error is
    /// returned.
    pub async fn request(
        &self,
        endpoint: &dyn LedgerEndpoint,
        mut envelope: MessageEnvelope,
        timeout: Duration,
    ) -> Result<MessageEnvelope, LedgerError> {
        let id = Uuid::now_v7();
        envelope.data.id = Some(id);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        if let Err(e) = endpoint.send_message(envelope).await {
            self.pending.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            // The sender half only disappears if the correlator itself is
            // torn down mid-request.
            Ok(Err(_)) => Err(LedgerError::ResponseChannelDropped(id)),
            Err(_) => {
                self.pending.remove(&id);
                Err(LedgerError::ResponseTimeout {
                    id,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Dispatch an inbound message against the pending registry.
    ///
    /// Messages without a known pending id, and payload shapes other than a
    /// response or error, are ignored so unrelated broadcast traffic passes
    /// through harmlessly.
    pub fn on_incoming(&self, envelope: &MessageEnvelope) {
        let Some(id) = envelope.data.id else {
            return;
        };
        match envelope.data.method {
            MessageMethod::QuoteResponse => {
                if let Some((_, tx)) = self.pending.remove(&id) {
                    // Stale if the requester already timed out; ignored.
                    let _ = tx.send(Ok(envelope.clone()));
                }
            }
            MessageMethod::Error => {
                if let Some((_, tx)) = self.pending.remove(&id) {
                    let body: ErrorBody = envelope
                        .data
                        .data
                        .clone()
                        .and_then(|v| serde_json::from_value(v).ok())
                        .unwrap_or_else(|| ErrorBody {
                            id: "UnknownError".into(),
                            message: "remote error with no body".into(),
                        });
                    let _ = tx.send(Err(LedgerError::Remote {
                        name: body.id,
                        message: body.message,
                    }));
                }
            }
            _ => {}
        }
    }
}

impl Default for MessageCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use ilx_core::Address;

    use crate::message::MessagePayload;
    use crate::testing::MockEndpoint;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn request_envelope() -> MessageEnvelope {
        MessageEnvelope {
            ledger: addr("ledger.a."),
            from: addr("ledger.a.alice"),
            to: addr("ledger.a.mark"),
            data: MessagePayload {
                id: None,
                method: MessageMethod::QuoteRequest,
                data: Some(serde_json::json!({})),
            },
        }
    }

    fn response_for(id: Uuid, method: MessageMethod, data: serde_json::Value) -> MessageEnvelope {
        MessageEnvelope {
            ledger: addr("ledger.a."),
            from: addr("ledger.a.mark"),
            to: addr("ledger.a.alice"),
            data: MessagePayload {
                id: Some(id),
                method,
                data: Some(data),
            },
        }
    }

    #[tokio::test]
    async fn test_resolves_on_matching_response() {
        let endpoint = Arc::new(MockEndpoint::new("ledger.a.", "ledger.a.alice"));
        let correlator = Arc::new(MessageCorrelator::new());

        let task = {
            let endpoint = Arc::clone(&endpoint);
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move {
                correlator
                    .request(endpoint.as_ref(), request_envelope(), Duration::from_secs(5))
                    .await
            })
        };

        // Wait for the request to be registered and transmitted.
        while endpoint.sent_messages().is_empty() {
            tokio::task::yield_now().await;
        }
        let sent_id = endpoint.sent_messages()[0].data.id.unwrap();

        correlator.on_incoming(&response_for(
            sent_id,
            MessageMethod::QuoteResponse,
            serde_json::json!({"ok": true}),
        ));

        let response = task.await.unwrap().unwrap();
        assert_eq!(response.data.id, Some(sent_id));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_response_rejects_with_remote_message() {
        let endpoint = Arc::new(MockEndpoint::new("ledger.a.", "ledger.a.alice"));
        let correlator = Arc::new(MessageCorrelator::new());

        let task = {
            let endpoint = Arc::clone(&endpoint);
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move {
                correlator
                    .request(endpoint.as_ref(), request_envelope(), Duration::from_secs(5))
                    .await
            })
        };

        while endpoint.sent_messages().is_empty() {
            tokio::task::yield_now().await;
        }
        let sent_id = endpoint.sent_messages()[0].data.id.unwrap();

        correlator.on_incoming(&response_for(
            sent_id,
            MessageMethod::Error,
            serde_json::json!({"id": "AssetsNotTradedError", "message": "no rate"}),
        ));

        let err = task.await.unwrap().unwrap_err();
        match err {
            LedgerError::Remote { name, message } => {
                assert_eq!(name, "AssetsNotTradedError");
                assert_eq!(message, "no rate");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_times_out_within_bounds() {
        let endpoint = MockEndpoint::new("ledger.a.", "ledger.a.alice");
        let correlator = MessageCorrelator::new();

        let timeout = Duration::from_millis(100);
        let started = Instant::now();
        let result = correlator
            .request(&endpoint, request_envelope(), timeout)
            .await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(LedgerError::ResponseTimeout { .. })));
        assert!(elapsed >= timeout, "rejected early: {:?}", elapsed);
        assert!(
            elapsed < timeout + Duration::from_millis(250),
            "rejected far too late: {:?}",
            elapsed
        );
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_late_response_is_dropped() {
        let endpoint = MockEndpoint::new("ledger.a.", "ledger.a.alice");
        let correlator = MessageCorrelator::new();

        let result = correlator
            .request(&endpoint, request_envelope(), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(LedgerError::ResponseTimeout { .. })));

        let sent_id = endpoint.sent_messages()[0].data.id.unwrap();
        // Arrives after the timeout: no pending entry, no effect.
        correlator.on_incoming(&response_for(
            sent_id,
            MessageMethod::QuoteResponse,
            serde_json::json!({}),
        ));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unrelated_messages_pass_through() {
        let correlator = MessageCorrelator::new();

        // Unknown id.
        correlator.on_incoming(&response_for(
            Uuid::now_v7(),
            MessageMethod::QuoteResponse,
            serde_json::json!({}),
        ));

        // Known-shaped broadcast without a correlation semantic.
        let mut broadcast = request_envelope();
        broadcast.data.method = MessageMethod::Other;
        broadcast.data.id = Some(Uuid::now_v7());
        correlator.on_incoming(&broadcast);

        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_cleans_up() {
        let endpoint = MockEndpoint::new("ledger.a.", "ledger.a.alice");
        endpoint.fail_sends(true);
        let correlator = MessageCorrelator::new();

        let result = correlator
            .request(&endpoint, request_envelope(), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(LedgerError::Transport(_))));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_correlate_independently() {
        let endpoint = Arc::new(MockEndpoint::new("ledger.a.", "ledger.a.alice"));
        let correlator = Arc::new(MessageCorrelator::new());

        let spawn_request = || {
            let endpoint = Arc::clone(&endpoint);
            let correlator = Arc::clone(&correlator);
            tokio::spawn(async move {
                correlator
                    .request(endpoint.as_ref(), request_envelope(), Duration::from_secs(5))
                    .await
            })
        };
        let first = spawn_request();
        let second = spawn_request();

        while endpoint.sent_messages().len() < 2 {
            tokio::task::yield_now().await;
        }
        let ids: Vec<Uuid> = endpoint
            .sent_messages()
            .iter()
            .map(|m| m.data.id.unwrap())
            .collect();
        assert_ne!(ids[0], ids[1]);

        // Answer in reverse send order; each future gets its own response.
        correlator.on_incoming(&response_for(
            ids[1],
            MessageMethod::QuoteResponse,
            serde_json::json!({"n": 1}),
        ));
        correlator.on_incoming(&response_for(
            ids[0],
            MessageMethod::QuoteResponse,
            serde_json::json!({"n": 0}),
        ));

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        let returned: Vec<Option<Uuid>> = vec![first.data.id, second.data.id];
        assert!(returned.contains(&Some(ids[0])));
        assert!(returned.contains(&Some(ids[1])));
        assert_ne!(first.data.id, second.data.id);
        assert_eq!(correlator.pending_count(), 0);
    }
}
