//! Owns the single underlying HTTP/WebSocket client a [`crate::PoWebClient`]
//! uses (§4.1).
//!
//! `Transport` is cheap to clone (it only clones a pooled [`reqwest::Client`]
//! and a shared "closed" flag) so a collection session's background task can
//! own one independently of the [`crate::PoWebClient`] that spawned it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use poweb_types::{EndpointConfig, StreamingMode};

use crate::error::{PoWebError, map_http_status, map_reqwest_error};
use crate::ws_session::CollectionSession;

/// The body and content-type of a successful unary response.
pub(crate) struct UnaryResponse {
    pub(crate) body: Vec<u8>,
    pub(crate) content_type: Option<String>,
}

/// Scoped holder of the HTTP/WebSocket client configuration.
///
/// Disposal ([`Transport::close`]) is idempotent: calling it more than once,
/// or from more than one clone, has no additional effect.
#[derive(Clone)]
pub struct Transport {
    endpoint: EndpointConfig,
    http: reqwest::Client,
    closed: Arc<AtomicBool>,
}

impl Transport {
    /// Builds a transport bound to `endpoint`. Does not itself open any
    /// connection.
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            http: reqwest::Client::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The endpoint this transport is bound to.
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Performs a unary `POST` against `path` (relative to the base HTTP
    /// URL), as used by the unary endpoints in §4.4.
    pub(crate) async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
        authorization: Option<&str>,
    ) -> Result<UnaryResponse, PoWebError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoWebError::ServerConnectionError(
                "Transport has been closed".to_string(),
            ));
        }
        let url = format!("{}{path}", self.endpoint.base_http_url());
        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        if let Some(authorization) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let response = request
            .send()
            .await
            .map_err(|err| map_reqwest_error(&url, &err))?;
        let status = response.status().as_u16();
        let is_delivery = path == "/parcels";
        if let Some(err) = map_http_status(status, is_delivery) {
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(&url, &err))?
            .to_vec();
        Ok(UnaryResponse { body, content_type })
    }

    /// Opens a collection WebSocket at `/parcel-collection`, requesting
    /// `mode`.
    pub(crate) async fn ws_connect(
        &self,
        mode: StreamingMode,
    ) -> Result<CollectionSession, PoWebError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoWebError::ServerConnectionError(
                "Transport has been closed".to_string(),
            ));
        }
        CollectionSession::connect(&self.endpoint, mode).await
    }

    /// Releases this transport. Idempotent, and shared across every clone:
    /// closing one clone closes them all.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
