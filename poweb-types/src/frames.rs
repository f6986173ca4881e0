//! The three framed messages exchanged on the parcel-collection WebSocket,
//! and their binary codec.
//!
//! Construction and parsing of the underlying Awala/Relaynet domain
//! messages (challenge, response, parcel delivery) belongs to an external
//! messaging library in a full deployment; this module stands in for that
//! boundary with a small, self-contained binary encoding so the collection
//! engine has something concrete to drive against. Swapping in a real
//! messaging-library binding only touches this file.

use serde::{Deserialize, Serialize};

/// A malformed frame was received where a [`Challenge`] or
/// [`ParcelDeliveryFrame`] was expected.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid message: {0}")]
pub struct InvalidMessageError(pub String);

/// Server → client handshake challenge, carrying the nonce every supplied
/// signer must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Server-chosen random bytes.
    pub nonce: Vec<u8>,
}

/// Client → server handshake response, carrying one detached signature per
/// supplied signer, in the order the signers were supplied to
/// `collect_parcels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Detached signatures over the challenge nonce, signer-input order.
    pub nonce_signatures: Vec<Vec<u8>>,
}

/// Server → client parcel delivery, carrying an opaque parcel and the
/// opaque token the client must echo back to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelDeliveryFrame {
    /// Server-assigned token identifying this delivery for ACK purposes.
    pub delivery_id: String,
    /// The opaque, application-layer parcel payload.
    pub parcel_serialized: Vec<u8>,
}

/// Serialises a [`Challenge`] to the bytes of a BINARY frame.
///
/// Exposed mainly so tests driving a mock server can produce one; real
/// clients only ever decode challenges, never encode them.
pub fn encode_challenge(challenge: &Challenge) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(challenge, &mut buf).expect("Challenge always encodes");
    buf
}

/// Parses the bytes of a BINARY frame as a [`Challenge`].
pub fn decode_challenge(bytes: &[u8]) -> Result<Challenge, InvalidMessageError> {
    ciborium::from_reader(bytes)
        .map_err(|err| InvalidMessageError(format!("invalid handshake challenge: {err}")))
}

/// Serialises a [`Response`] to the bytes of a BINARY frame.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(response, &mut buf).expect("Response always encodes");
    buf
}

/// Parses the bytes of a BINARY frame as a [`Response`].
///
/// Exposed mainly so a mock server can assert on what the client sent.
pub fn decode_response(bytes: &[u8]) -> Result<Response, InvalidMessageError> {
    ciborium::from_reader(bytes)
        .map_err(|err| InvalidMessageError(format!("invalid handshake response: {err}")))
}

/// Serialises a [`ParcelDeliveryFrame`] to the bytes of a BINARY frame.
///
/// Exposed mainly so tests driving a mock server can produce deliveries.
pub fn encode_parcel_delivery(frame: &ParcelDeliveryFrame) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(frame, &mut buf).expect("ParcelDeliveryFrame always encodes");
    buf
}

/// Parses the bytes of a BINARY frame as a [`ParcelDeliveryFrame`].
pub fn decode_parcel_delivery(bytes: &[u8]) -> Result<ParcelDeliveryFrame, InvalidMessageError> {
    ciborium::from_reader(bytes)
        .map_err(|err| InvalidMessageError(format!("invalid parcel delivery: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_round_trips_through_the_wire_encoding() {
        let challenge = Challenge {
            nonce: b"nonce".to_vec(),
        };
        let encoded = encode_challenge(&challenge);
        assert_eq!(decode_challenge(&encoded).unwrap(), challenge);
    }

    #[test]
    fn response_preserves_signature_order() {
        let response = Response {
            nonce_signatures: vec![b"sig1".to_vec(), b"sig2".to_vec()],
        };
        let encoded = encode_response(&response);
        assert_eq!(decode_response(&encoded).unwrap(), response);
    }

    #[test]
    fn parcel_delivery_round_trips_through_the_wire_encoding() {
        let frame = ParcelDeliveryFrame {
            delivery_id: "the delivery id".into(),
            parcel_serialized: b"the parcel serialized".to_vec(),
        };
        let encoded = encode_parcel_delivery(&frame);
        assert_eq!(decode_parcel_delivery(&encoded).unwrap(), frame);
    }

    #[test]
    fn malformed_bytes_are_rejected_as_invalid_messages() {
        let garbage = b"not a valid frame at all \xff\xfe";
        assert!(decode_challenge(garbage).is_err());
        assert!(decode_parcel_delivery(garbage).is_err());
    }
}
