//! The public error taxonomy (§7) and the mapping from raw transport/HTTP/
//! WebSocket outcomes onto it (§4.5).

use poweb_types::signer::SigningError;

/// Errors a PoWeb client can raise.
///
/// [`PoWebError::ServerConnectionError`] and [`PoWebError::ServerBindingError`]
/// share the intent of a single "server-or-connectivity fault" base that the
/// specification calls for; Rust has no class hierarchy to model that with,
/// so [`PoWebError::is_server_or_connectivity`] is the idiomatic stand-in —
/// callers who want to catch both broadly can match on that predicate
/// instead of on individual variants.
#[derive(Debug, thiserror::Error)]
pub enum PoWebError {
    /// Transient connectivity or server-side outage; retrying later MAY
    /// succeed.
    #[error("{0}")]
    ServerConnectionError(String),

    /// The server violated the protocol (undecodable message, unexpected
    /// redirect, wrong content-type); retrying is unlikely to help.
    #[error("{0}")]
    ServerBindingError(String),

    /// The server rejected the request as a protocol violation by the
    /// client (4xx other than 422 on parcel delivery).
    #[error("the server reported a client-binding error (status {status})")]
    ClientBindingError {
        /// The HTTP status the server responded with.
        status: u16,
    },

    /// The server refused a specific parcel (422 on delivery).
    #[error("The server rejected the parcel")]
    RejectedParcelError,

    /// A local precondition was violated before any transport activity
    /// took place.
    #[error("{0}")]
    NonceSignerError(String),
}

impl PoWebError {
    /// Whether this error belongs to the "server-or-connectivity" family
    /// (see the type-level docs) that callers may want to catch broadly.
    pub fn is_server_or_connectivity(&self) -> bool {
        matches!(
            self,
            PoWebError::ServerConnectionError(_) | PoWebError::ServerBindingError(_)
        )
    }
}

impl From<SigningError> for PoWebError {
    fn from(err: SigningError) -> Self {
        PoWebError::NonceSignerError(err.0)
    }
}

/// Maps a completed HTTP response's status code onto the taxonomy, for the
/// unary endpoints (§4.4/§4.5). `None` means the status was a plain success
/// and the caller should proceed to read the body.
///
/// `delivery_422_is_rejection` selects whether 422 means
/// [`PoWebError::RejectedParcelError`] (parcel delivery) or a generic
/// [`PoWebError::ClientBindingError`] (every other unary endpoint).
pub fn map_http_status(status: u16, delivery_422_is_rejection: bool) -> Option<PoWebError> {
    match status {
        200..=299 => None,
        300..=399 => Some(PoWebError::ServerBindingError(
            "Unexpected redirect".to_string(),
        )),
        422 if delivery_422_is_rejection => Some(PoWebError::RejectedParcelError),
        400..=499 => Some(PoWebError::ClientBindingError { status }),
        500..=599 => Some(PoWebError::ServerConnectionError(format!(
            "The server responded with status {status}"
        ))),
        _ => Some(PoWebError::ServerBindingError(format!(
            "Unexpected status {status}"
        ))),
    }
}

/// Maps a failure to even perform an HTTP request (DNS, connect, TLS,
/// timeout) onto the taxonomy.
pub fn map_reqwest_error(url: &str, err: &reqwest::Error) -> PoWebError {
    if err.is_timeout() {
        return PoWebError::ServerConnectionError(format!("Failed to connect to {url}"));
    }
    if is_dns_failure(err) {
        return PoWebError::ServerConnectionError("Failed to resolve DNS".to_string());
    }
    PoWebError::ServerConnectionError(format!("Failed to connect to {url}"))
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    use std::error::Error as _;
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("dns") || text.contains("resolve") || text.contains("name resolution") {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Maps a WebSocket connect failure (handshake/upgrade, I/O, DNS) onto the
/// taxonomy.
pub fn map_ws_connect_error(
    url: &str,
    err: &tokio_tungstenite::tungstenite::Error,
) -> PoWebError {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Http(response) => PoWebError::ServerConnectionError(format!(
            "WebSocket upgrade to {url} failed with status {}",
            response.status()
        )),
        _ => PoWebError::ServerConnectionError(format!("Failed to connect to {url}")),
    }
}
