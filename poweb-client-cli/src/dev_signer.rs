//! A development-only [`NonceSigner`] stand-in.
//!
//! Produces a keyed SHA-256 digest over the nonce rather than a real
//! asymmetric signature: good enough to exercise the handshake against a
//! mock or development gateway, nowhere near sufficient for talking to a
//! real one. A production binding should plug in an actual PKI signer.

use async_trait::async_trait;
use poweb_types::signer::{Certificate, NonceSigner, SignaturePurpose, SigningError};
use sha2::{Digest, Sha256};

pub struct DevNonceSigner {
    key: Vec<u8>,
    certificate: Certificate,
}

impl DevNonceSigner {
    pub fn new(key: Vec<u8>, certificate_der: Vec<u8>) -> Self {
        Self {
            key,
            certificate: Certificate::from_bytes(certificate_der),
        }
    }
}

#[async_trait]
impl NonceSigner for DevNonceSigner {
    async fn sign(
        &self,
        nonce: &[u8],
        purpose: SignaturePurpose,
    ) -> Result<Vec<u8>, SigningError> {
        let SignaturePurpose::Nonce = purpose;
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(nonce);
        Ok(hasher.finalize().to_vec())
    }

    fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}
