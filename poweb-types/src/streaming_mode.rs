//! The `X-Relaynet-Streaming-Mode` negotiation for parcel collection.

/// Name of the request header carrying the streaming mode.
pub const STREAMING_MODE_HEADER: &str = "X-Relaynet-Streaming-Mode";

/// Controls whether a collection session stays open indefinitely or closes
/// once the currently queued parcels have been drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamingMode {
    /// The server holds the connection open and pushes new parcels as they
    /// arrive. Default mode.
    #[default]
    KeepAlive,
    /// The server sends any currently queued parcels and then closes.
    CloseUponCompletion,
}

impl StreamingMode {
    /// The literal header value sent on the wire for this mode.
    pub fn header_value(self) -> &'static str {
        match self {
            StreamingMode::KeepAlive => "keep-alive",
            StreamingMode::CloseUponCompletion => "close-upon-completion",
        }
    }

    /// Whether the engine should reconnect after a transient disconnect in
    /// this mode. Only `keep-alive` reconnects; see §4.3.3.
    pub fn reconnects(self) -> bool {
        matches!(self, StreamingMode::KeepAlive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values_match_the_wire_protocol() {
        assert_eq!(StreamingMode::KeepAlive.header_value(), "keep-alive");
        assert_eq!(
            StreamingMode::CloseUponCompletion.header_value(),
            "close-upon-completion"
        );
    }

    #[test]
    fn only_keep_alive_reconnects() {
        assert!(StreamingMode::KeepAlive.reconnects());
        assert!(!StreamingMode::CloseUponCompletion.reconnects());
    }

    #[test]
    fn default_is_keep_alive() {
        assert_eq!(StreamingMode::default(), StreamingMode::KeepAlive);
    }
}
