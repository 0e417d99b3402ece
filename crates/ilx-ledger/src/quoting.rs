use std::sync::Arc;
use std::time::Duration;

use ilx_core::Address;

use crate::correlator::MessageCorrelator;
use crate::endpoint::LedgerEndpoint;
use crate::error::LedgerError;
use crate::message::{
    MessageEnvelope, MessageMethod, MessagePayload, QuoteRequestBody, QuoteResponseBody,
};

/// Issues quote requests to remote connectors and interprets the replies.
///
/// A connector declining to quote — an error response, a timeout, or a
/// transport failure — is an expected outcome of competitive fan-out, so it
/// is logged and reported as an absent result rather than an error.
pub struct QuoteRequester {
    endpoint: Arc<dyn LedgerEndpoint>,
    correlator: Arc<MessageCorrelator>,
    timeout: Duration,
}

impl QuoteRequester {
    /// Create a requester bound to one ledger endpoint.
    pub fn new(
        endpoint: Arc<dyn LedgerEndpoint>,
        correlator: Arc<MessageCorrelator>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            correlator,
            timeout,
        }
    }

    /// Request a quote from one connector.
    ///
    /// `None` means "no quote available" from this connector, for whatever
    /// reason.
    pub async fn request_quote(
        &self,
        connector: &Address,
        body: &QuoteRequestBody,
    ) -> Option<QuoteResponseBody> {
        let data = match serde_json::to_value(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode quote request");
                return None;
            }
        };
        let envelope = MessageEnvelope {
            ledger: self.endpoint.info().prefix,
            from: self.endpoint.account(),
            to: connector.clone(),
            data: MessagePayload {
                // Correlation id is stamped by the correlator.
                id: None,
                method: MessageMethod::QuoteRequest,
                data: Some(data),
            },
        };

        let response = match self
            .correlator
            .request(self.endpoint.as_ref(), envelope, self.timeout)
            .await
        {
            Ok(response) => response,
            Err(LedgerError::Remote { name, message }) => {
                tracing::debug!(connector = %connector, name = %name, message = %message, "connector declined to quote");
                return None;
            }
            Err(LedgerError::ResponseTimeout { .. }) => {
                tracing::debug!(connector = %connector, "quote request timed out");
                return None;
            }
            Err(e) => {
                tracing::warn!(connector = %connector, error = %e, "quote request failed");
                return None;
            }
        };

        let Some(data) = response.data.data else {
            tracing::debug!(connector = %connector, "quote response carried no body");
            return None;
        };
        match serde_json::from_value::<QuoteResponseBody>(data) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(connector = %connector, error = %e, "malformed quote response");
                None
            }
        }
    }
}
