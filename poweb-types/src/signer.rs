//! The nonce-signer capability and the certificate it is bound to.
//!
//! Production and verification of detached signatures, and certificate
//! handling itself, belong to an external crypto library; this module only
//! defines the thin interface the collection engine programs against.

use std::fmt;

use async_trait::async_trait;

/// Reason a nonce is being signed, passed through to the signer so it can
/// apply the right key-usage policy if it enforces one.
///
/// The handshake in §4.3.2 only ever uses [`SignaturePurpose::Nonce`]; the
/// enum exists so a real crypto-library binding has somewhere to add
/// further purposes without changing the [`NonceSigner`] trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePurpose {
    /// Signing a handshake nonce during parcel collection.
    Nonce,
}

/// A certificate, opaque to this client beyond its encoded bytes.
///
/// Functions as the trust anchor for every parcel collected under the
/// [`NonceSigner`] it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Wraps the DER (or other externally-defined) encoding of a
    /// certificate.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The encoded bytes of this certificate.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Certificate({} bytes)", self.0.len())
    }
}

/// Failure producing a detached signature.
#[derive(Debug, Clone, thiserror::Error)]
#[error("nonce signer failed to produce a signature: {0}")]
pub struct SigningError(pub String);

/// A capability bound to a certificate and a private key: given a nonce, it
/// returns a detached signature, and it exposes the certificate that acts as
/// the trust anchor for parcels collected using it.
///
/// Implementations are free to be stateless (e.g. wrapping an in-memory
/// key) or stateful (e.g. delegating to a remote signing service);
/// [`collect_parcels`](https://docs.rs/poweb-client) only ever calls
/// [`NonceSigner::sign`] and reads [`NonceSigner::certificate`].
#[async_trait]
pub trait NonceSigner: Send + Sync {
    /// Produces a detached signature over `nonce` for the given `purpose`.
    async fn sign(
        &self,
        nonce: &[u8],
        purpose: SignaturePurpose,
    ) -> Result<Vec<u8>, SigningError>;

    /// The certificate this signer is bound to.
    fn certificate(&self) -> &Certificate;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSigner {
        certificate: Certificate,
        signature: Vec<u8>,
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

    #[tokio::test]
    async fn signer_returns_its_static_signature_and_certificate() {
        let signer = StaticSigner {
            certificate: Certificate::from_bytes(b"cert".to_vec()),
            signature: b"sig".to_vec(),
        };
        let sig = signer.sign(b"nonce", SignaturePurpose::Nonce).await.unwrap();
        assert_eq!(sig, b"sig");
        assert_eq!(signer.certificate().as_bytes(), b"cert");
    }
}
