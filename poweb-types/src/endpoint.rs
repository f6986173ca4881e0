//! Immutable configuration of the gateway a client talks to.

/// Default port used by the [`EndpointConfig::local`] preset.
pub const LOCAL_DEFAULT_PORT: u16 = 276;

/// Default port used by the [`EndpointConfig::remote`] preset.
pub const REMOTE_DEFAULT_PORT: u16 = 443;

/// Host, port, and TLS configuration of a PoWeb gateway.
///
/// Constructed once via [`EndpointConfig::local`] or
/// [`EndpointConfig::remote`] and then shared read-only by a client and
/// every collection session it opens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointConfig {
    host: String,
    port: u16,
    use_tls: bool,
}

impl EndpointConfig {
    /// Builds a config pointing at an arbitrary host/port/TLS combination.
    pub fn new(host: impl Into<String>, port: u16, use_tls: bool) -> Self {
        Self {
            host: host.into(),
            port,
            use_tls,
        }
    }

    /// Preset for a gateway running on the loopback interface without TLS.
    pub fn local() -> Self {
        Self::new("127.0.0.1", LOCAL_DEFAULT_PORT, false)
    }

    /// Preset for a public gateway reachable over TLS on the given host.
    pub fn remote(host: impl Into<String>) -> Self {
        Self::new(host, REMOTE_DEFAULT_PORT, true)
    }

    /// The configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the client should use TLS to reach this gateway.
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// The base HTTP URL (`http(s)://host:port/v1`) unary endpoints are
    /// relative to.
    pub fn base_http_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}/v1", self.host, self.port)
    }

    /// The base WebSocket URL (`ws(s)://host:port/v1`) the collection
    /// endpoint is relative to.
    pub fn base_ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}/v1", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_preset_uses_loopback_without_tls() {
        let config = EndpointConfig::local();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), LOCAL_DEFAULT_PORT);
        assert!(!config.use_tls());
        assert_eq!(config.base_http_url(), "http://127.0.0.1:276/v1");
        assert_eq!(config.base_ws_url(), "ws://127.0.0.1:276/v1");
    }

    #[test]
    fn remote_preset_uses_tls_on_caller_supplied_host() {
        let config = EndpointConfig::remote("gw.example.com");
        assert_eq!(config.host(), "gw.example.com");
        assert_eq!(config.port(), REMOTE_DEFAULT_PORT);
        assert!(config.use_tls());
        assert_eq!(
            config.base_http_url(),
            "https://gw.example.com:443/v1"
        );
        assert_eq!(config.base_ws_url(), "wss://gw.example.com:443/v1");
    }

    #[test]
    fn custom_config_derives_urls_from_fields() {
        let config = EndpointConfig::new("gw.internal", 8276, false);
        assert_eq!(config.base_http_url(), "http://gw.internal:8276/v1");
        assert_eq!(config.base_ws_url(), "ws://gw.internal:8276/v1");
    }
}
