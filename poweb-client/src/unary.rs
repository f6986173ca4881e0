//! The three unary HTTP endpoints: pre-registration, registration, and
//! parcel delivery (§4.4).

use base64::Engine as _;
use sha2::{Digest, Sha256};

use poweb_types::signer::Certificate;

use crate::error::PoWebError;
use crate::transport::Transport;

const PNRA_CONTENT_TYPE: &str = "application/vnd.relaynet.node-pre-registration";
const PNRR_CONTENT_TYPE: &str = "application/vnd.relaynet.node-registration.authorization";
const NODE_REGISTRATION_REQUEST_CONTENT_TYPE: &str = "application/vnd.relaynet.node-registration.request";
const NODE_REGISTRATION_CONTENT_TYPE: &str = "application/vnd.relaynet.node-registration.registration";
const PARCEL_CONTENT_TYPE: &str = "application/vnd.relaynet.parcel";
const COUNTERSIGNATURE_AUTHORIZATION_PREFIX: &str = "Relaynet-Countersignature ";

/// The authorization a server hands back from pre-registration, to be
/// presented unmodified to [`register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAuthorization(Vec<u8>);

impl RegistrationAuthorization {
    /// Wraps a raw PNRR (Parcel Node Registration Request) as returned by
    /// the server.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw bytes of the authorization.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The outcome of [`register`]: the node's certificate and the certificate
/// of the gateway that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The certificate the server issued to this node.
    pub node_certificate: Certificate,
    /// The certificate of the gateway that issued `node_certificate`.
    pub gateway_certificate: Certificate,
}

/// Step one of node registration: send the hex-encoded SHA-256 digest of
/// `node_public_key` and exchange it for a [`RegistrationAuthorization`]
/// (§4.4.1).
pub(crate) async fn pre_register(
    transport: &Transport,
    node_public_key: &[u8],
) -> Result<RegistrationAuthorization, PoWebError> {
    let response = transport
        .post(
            "/pre-registrations",
            public_key_digest_hex(node_public_key).into_bytes(),
            PNRA_CONTENT_TYPE,
            None,
        )
        .await?;
    if response.content_type.as_deref() != Some(PNRR_CONTENT_TYPE) {
        return Err(PoWebError::ServerBindingError(
            "Server returned an unexpected content type for a registration authorization"
                .to_string(),
        ));
    }
    Ok(RegistrationAuthorization::from_bytes(response.body))
}

/// Step two of node registration: present a countersigned
/// [`RegistrationAuthorization`] and receive the issued certificates
/// (§4.4.1).
pub(crate) async fn register(
    transport: &Transport,
    pnrr_countersigned: &[u8],
) -> Result<Registration, PoWebError> {
    let response = transport
        .post(
            "/nodes",
            pnrr_countersigned.to_vec(),
            NODE_REGISTRATION_REQUEST_CONTENT_TYPE,
            None,
        )
        .await?;
    if response.content_type.as_deref() != Some(NODE_REGISTRATION_CONTENT_TYPE) {
        return Err(PoWebError::ServerBindingError(
            "Server returned an unexpected content type for a node registration".to_string(),
        ));
    }
    decode_registration(&response.body)
}

fn decode_registration(body: &[u8]) -> Result<Registration, PoWebError> {
    let parsed: RegistrationWire = ciborium::from_reader(body).map_err(|_| {
        PoWebError::ServerBindingError("Server returned a malformed registration".to_string())
    })?;
    Ok(Registration {
        node_certificate: Certificate::from_bytes(parsed.node_certificate),
        gateway_certificate: Certificate::from_bytes(parsed.gateway_certificate),
    })
}

#[derive(serde::Deserialize, serde::Serialize)]
struct RegistrationWire {
    node_certificate: Vec<u8>,
    gateway_certificate: Vec<u8>,
}

fn public_key_digest_hex(node_public_key: &[u8]) -> String {
    hex::encode(Sha256::digest(node_public_key))
}

fn countersignature_header(detached_signature: &[u8]) -> String {
    format!(
        "{COUNTERSIGNATURE_AUTHORIZATION_PREFIX}{}",
        base64::engine::general_purpose::STANDARD.encode(detached_signature)
    )
}

/// Delivers a single serialized parcel, authenticated with a detached
/// signature over the raw parcel body (§4.4.2/§6). A `422` response is
/// reported as [`PoWebError::RejectedParcelError`] rather than the generic
/// [`PoWebError::ClientBindingError`] every other endpoint would raise for
/// it.
pub(crate) async fn deliver_parcel(
    transport: &Transport,
    parcel_serialized: &[u8],
    detached_signature: &[u8],
) -> Result<(), PoWebError> {
    let authorization = countersignature_header(detached_signature);
    transport
        .post(
            "/parcels",
            parcel_serialized.to_vec(),
            PARCEL_CONTENT_TYPE,
            Some(&authorization),
        )
        .await?;
    Ok(())
}
