//! The top-level [`PoWebClient`] facade tying the transport, the unary
//! endpoints, and the collection engine together (§4).

use std::sync::Arc;

use futures::Stream;

use poweb_types::{EndpointConfig, NonceSigner, ParcelCollection, StreamingMode};

use crate::collection;
use crate::error::PoWebError;
use crate::transport::Transport;
use crate::unary::{self, Registration, RegistrationAuthorization};

/// A client bound to a single PoWeb endpoint.
///
/// Cheap to clone: cloning shares the same underlying connection pool and
/// "closed" flag (see [`PoWebClient::close`]).
#[derive(Clone)]
pub struct PoWebClient {
    transport: Transport,
}

impl PoWebClient {
    /// Connects to a gateway on the local device, at the conventional port
    /// and without TLS (§3).
    pub fn new_local() -> Self {
        Self::new(EndpointConfig::local())
    }

    /// Connects to a remote gateway over TLS at `host`, on the conventional
    /// HTTPS port (§3).
    pub fn new_remote(host: impl Into<String>) -> Self {
        Self::new(EndpointConfig::remote(host))
    }

    /// Connects using a fully custom [`EndpointConfig`].
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            transport: Transport::new(endpoint),
        }
    }

    /// The endpoint this client is bound to.
    pub fn endpoint(&self) -> &EndpointConfig {
        self.transport.endpoint()
    }

    /// Step one of node registration: hashes `node_public_key` and exchanges
    /// its hex-encoded digest for a [`RegistrationAuthorization`] (§4.4.1).
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn pre_register(
        &self,
        node_public_key: &[u8],
    ) -> Result<RegistrationAuthorization, PoWebError> {
        unary::pre_register(&self.transport, node_public_key).await
    }

    /// Step two of node registration (§4.4.1).
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn register(&self, pnrr_countersigned: &[u8]) -> Result<Registration, PoWebError> {
        unary::register(&self.transport, pnrr_countersigned).await
    }

    /// Delivers a single serialized parcel, authenticated with a detached
    /// signature over the raw parcel body (§4.4.2).
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn deliver_parcel(
        &self,
        parcel_serialized: &[u8],
        detached_signature: &[u8],
    ) -> Result<(), PoWebError> {
        unary::deliver_parcel(&self.transport, parcel_serialized, detached_signature).await
    }

    /// Starts collecting parcels addressed to any of `signers` (§4.3.1).
    ///
    /// The returned stream is lazy: nothing happens on the wire until it is
    /// first polled, and dropping it before it ends cancels the underlying
    /// session within a bounded delay (§5).
    pub fn collect_parcels(
        &self,
        signers: Vec<Arc<dyn NonceSigner>>,
        mode: StreamingMode,
    ) -> impl Stream<Item = Result<ParcelCollection, PoWebError>> {
        collection::collect_parcels(self.transport.clone(), signers, mode)
    }

    /// Releases this client's underlying connection pool. Idempotent, and
    /// shared across every clone.
    pub fn close(&self) {
        self.transport.close();
    }
}
