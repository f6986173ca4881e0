//! A minimal mock PoWeb gateway: a real axum server bound to an ephemeral
//! loopback port, so the client under test talks to it over an actual
//! TCP socket via `tokio-tungstenite`, exactly as it would a real gateway.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;

use poweb_types::{
    EndpointConfig,
    signer::{Certificate, NonceSigner, SignaturePurpose, SigningError},
};

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type BoxedHandler = Arc<dyn Fn(WebSocket) -> BoxFuture + Send + Sync>;

#[derive(Clone)]
struct MockState {
    handler: BoxedHandler,
}

async fn collection_route(
    ws: WebSocketUpgrade,
    State(state): State<MockState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| (state.handler)(socket))
}

/// A running mock gateway exposing `/v1/parcel-collection`.
pub struct MockGateway {
    addr: SocketAddr,
}

impl MockGateway {
    /// Starts a server that runs `handler` against every accepted
    /// WebSocket connection.
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(WebSocket) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = MockState {
            handler: Arc::new(move |socket| Box::pin(handler(socket)) as BoxFuture),
        };
        let app = Router::new()
            .route("/v1/parcel-collection", get(collection_route))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("binding an ephemeral loopback port never fails in tests");
        let addr = listener.local_addr().expect("bound listener has a local address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock gateway stopped unexpectedly");
        });
        Self { addr }
    }

    /// The plaintext endpoint config pointing at this gateway.
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.addr.ip().to_string(), self.addr.port(), false)
    }
}

/// A deterministic [`NonceSigner`] test double: always returns the same
/// signature, regardless of the nonce.
pub struct StaticSigner {
    pub certificate: Certificate,
    pub signature: Vec<u8>,
}

impl StaticSigner {
    pub fn new(certificate: &[u8], signature: &[u8]) -> Arc<dyn NonceSigner> {
        Arc::new(Self {
            certificate: Certificate::from_bytes(certificate.to_vec()),
            signature: signature.to_vec(),
        })
    }
}

#[async_trait]
impl NonceSigner for StaticSigner {
    async fn sign(
        &self,
        _nonce: &[u8],
        _purpose: SignaturePurpose,
    ) -> Result<Vec<u8>, SigningError> {
        Ok(self.signature.clone())
    }

    fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

/// Reads the next message as a handshake [`poweb_types::frames::Response`],
/// panicking (failing the test) on anything else.
pub async fn expect_response(socket: &mut WebSocket) -> poweb_types::frames::Response {
    match socket.recv().await {
        Some(Ok(Message::Binary(bytes))) => {
            poweb_types::frames::decode_response(&bytes).expect("client sent a valid response")
        }
        other => panic!("expected a binary handshake response, got {other:?}"),
    }
}

/// Sends a [`poweb_types::frames::Challenge`] carrying `nonce`.
pub async fn send_challenge(socket: &mut WebSocket, nonce: &[u8]) {
    let bytes = poweb_types::frames::encode_challenge(&poweb_types::frames::Challenge {
        nonce: nonce.to_vec(),
    });
    socket
        .send(Message::Binary(bytes.into()))
        .await
        .expect("mock gateway can send over the accepted socket");
}

/// Sends a [`poweb_types::frames::ParcelDeliveryFrame`].
pub async fn send_delivery(socket: &mut WebSocket, delivery_id: &str, parcel: &[u8]) {
    let bytes = poweb_types::frames::encode_parcel_delivery(&poweb_types::frames::ParcelDeliveryFrame {
        delivery_id: delivery_id.to_string(),
        parcel_serialized: parcel.to_vec(),
    });
    socket
        .send(Message::Binary(bytes.into()))
        .await
        .expect("mock gateway can send over the accepted socket");
}

/// Waits for the ACK text frame for `delivery_id`.
pub async fn expect_ack(socket: &mut WebSocket, delivery_id: &str) {
    match socket.recv().await {
        Some(Ok(Message::Text(text))) => assert_eq!(text.to_string(), delivery_id),
        other => panic!("expected a text ACK frame for {delivery_id}, got {other:?}"),
    }
}
