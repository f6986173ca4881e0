//! Thin wrapper around a single tungstenite WebSocket connection to the
//! `/v1/parcel-collection` endpoint.
//!
//! This module handles errors conservatively: anything unexpected closes
//! the underlying socket on a best-effort basis (send failures while
//! closing are ignored) before the error is surfaced to the caller.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        self,
        client::IntoClientRequest,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use poweb_types::{
    EndpointConfig, StreamingMode,
    frames::{self, Challenge, ParcelDeliveryFrame},
    streaming_mode::STREAMING_MODE_HEADER,
};

use crate::error::{PoWebError, map_ws_connect_error};

type RawSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An inbound frame on the collection socket, distinguishing a clean server
/// close from a received message.
pub(crate) enum InboundFrame {
    /// A parcel delivery, successfully decoded.
    Delivery(ParcelDeliveryFrame),
    /// The server closed the connection.
    Closed {
        /// `None` means the TCP stream ended without a close frame at all.
        code: Option<CloseCode>,
        reason: String,
    },
}

/// An open WebSocket session on `/v1/parcel-collection`.
pub(crate) struct CollectionSession {
    inner: RawSocket,
}

impl CollectionSession {
    /// Opens a new session against `endpoint`, requesting the given
    /// streaming mode.
    pub(crate) async fn connect(
        endpoint: &EndpointConfig,
        mode: StreamingMode,
    ) -> Result<Self, PoWebError> {
        let url = format!("{}/parcel-collection", endpoint.base_ws_url());
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|err| PoWebError::ServerConnectionError(format!("Invalid URL {url}: {err}")))?;
        request.headers_mut().insert(
            STREAMING_MODE_HEADER,
            mode.header_value()
                .parse()
                .expect("streaming mode header values are valid header values"),
        );

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|err| map_ws_connect_error(&url, &err))?;
        Ok(Self { inner: socket })
    }

    /// Reads the first frame of the session and expects it to be a
    /// [`Challenge`].
    ///
    /// On a malformed frame, closes with `VIOLATED_POLICY` and an empty
    /// reason before returning [`PoWebError::ServerBindingError`].
    pub(crate) async fn read_challenge(&mut self) -> Result<Challenge, PoWebError> {
        match self.inner.next().await {
            Some(Ok(tungstenite::Message::Binary(bytes))) => {
                match frames::decode_challenge(&bytes) {
                    Ok(challenge) => Ok(challenge),
                    Err(_) => {
                        self.close(CloseCode::Policy, "").await;
                        Err(PoWebError::ServerBindingError(
                            "Server sent an invalid handshake challenge".to_string(),
                        ))
                    }
                }
            }
            Some(Ok(_)) => {
                self.close(CloseCode::Policy, "").await;
                Err(PoWebError::ServerBindingError(
                    "Server sent an invalid handshake challenge".to_string(),
                ))
            }
            Some(Err(err)) => Err(PoWebError::ServerConnectionError(format!(
                "Server closed the connection during the handshake: {err}"
            ))),
            None => Err(PoWebError::ServerConnectionError(
                "Server closed the connection during the handshake".to_string(),
            )),
        }
    }

    /// Sends the handshake [`poweb_types::frames::Response`] as a single
    /// BINARY frame.
    pub(crate) async fn send_response(
        &mut self,
        response: &poweb_types::frames::Response,
    ) -> Result<(), PoWebError> {
        let bytes = frames::encode_response(response);
        self.inner
            .send(tungstenite::Message::binary(bytes))
            .await
            .map_err(|err| {
                PoWebError::ServerConnectionError(format!("Failed to send handshake response: {err}"))
            })
    }

    /// Reads the next frame in the `STREAMING` state: either a delivery or
    /// a server-initiated close.
    pub(crate) async fn read_frame(&mut self) -> Result<InboundFrame, PoWebError> {
        match self.inner.next().await {
            Some(Ok(tungstenite::Message::Binary(bytes))) => {
                match frames::decode_parcel_delivery(&bytes) {
                    Ok(frame) => Ok(InboundFrame::Delivery(frame)),
                    Err(_) => {
                        self.close(CloseCode::Policy, "Invalid parcel delivery").await;
                        Err(PoWebError::ServerBindingError(
                            "Received invalid message from server".to_string(),
                        ))
                    }
                }
            }
            Some(Ok(tungstenite::Message::Close(frame))) => Ok(InboundFrame::Closed {
                code: frame.as_ref().map(|f| f.code),
                reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
            }),
            Some(Ok(_)) => {
                self.close(CloseCode::Policy, "Invalid parcel delivery").await;
                Err(PoWebError::ServerBindingError(
                    "Received invalid message from server".to_string(),
                ))
            }
            Some(Err(tungstenite::Error::Io(err)))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                Ok(InboundFrame::Closed {
                    code: None,
                    reason: "connection reset".to_string(),
                })
            }
            Some(Err(err)) => Err(PoWebError::ServerConnectionError(err.to_string())),
            None => Ok(InboundFrame::Closed {
                code: None,
                reason: "connection ended without a close frame".to_string(),
            }),
        }
    }

    /// Sends the ACK TEXT frame for `delivery_id`. Best-effort: a failure
    /// to send is logged and otherwise ignored, matching the "ACKs are
    /// forwarded, not tracked" policy in §4.3.2.
    pub(crate) async fn send_ack(&mut self, delivery_id: &str) {
        if let Err(err) = self
            .inner
            .send(tungstenite::Message::text(delivery_id.to_string()))
            .await
        {
            tracing::warn!("failed to send ACK for {delivery_id}: {err}");
        }
    }

    /// Sends a PING frame to keep NAT bindings alive and help detect a
    /// silently dropped connection (§4.1). Best-effort.
    pub(crate) async fn ping(&mut self) {
        if let Err(err) = self
            .inner
            .send(tungstenite::Message::Ping(Vec::<u8>::new().into()))
            .await
        {
            tracing::debug!("failed to send keep-alive ping: {err}");
        }
    }

    /// Closes the session with `code`/`reason` on a best-effort basis.
    pub(crate) async fn close(&mut self, code: CloseCode, reason: &str) {
        let _ = self
            .inner
            .close(Some(CloseFrame {
                code,
                reason: reason.to_string().into(),
            }))
            .await;
    }
}
