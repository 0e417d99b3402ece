/// What [`crate::core::RoutingCore::quote`] returns when the remote tail
/// quote comes back empty but a local head quote exists.
///
/// Connector deployments have historically disagreed on this behavior, so it
/// is an explicit policy rather than a hard-coded choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailQuoteFallback {
    /// Return the local head quote even though it may under-specify the
    /// remainder of the path.
    #[default]
    LocalQuote,
    /// Return no quote at all.
    AbsentResult,
}

/// Configuration for [`crate::core::RoutingCore`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Destination expiry duration (seconds) assumed when the caller
    /// supplies none.
    pub default_destination_expiry: f64,
    /// Fallback policy when a remote tail quote is unavailable.
    pub tail_quote_fallback: TailQuoteFallback,
    /// Capacity of the core's event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_destination_expiry: 5.0,
            tail_quote_fallback: TailQuoteFallback::default(),
            event_channel_capacity: 256,
        }
    }
}
