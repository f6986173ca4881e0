//! The value handed back to callers for every collected parcel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::signer::Certificate;

/// Sink the engine implements to actually send the ACK TEXT frame for a
/// delivery.
///
/// [`ParcelCollection`] only ever calls [`AckSink::ack`] once per instance,
/// even if the caller invokes [`ParcelCollection::ack`] more than once.
#[async_trait]
pub trait AckSink: Send + Sync {
    /// Sends the acknowledgement for the delivery this sink is bound to.
    async fn ack(&self);
}

/// A parcel collected from the gateway, still awaiting acknowledgement.
///
/// Valid until the collection session it came from ends; calling
/// [`ParcelCollection::ack`] after the session has ended is a no-op from the
/// caller's perspective (the underlying sink is responsible for discarding
/// it silently, per §5's cancellation semantics).
pub struct ParcelCollection {
    parcel_serialized: Vec<u8>,
    trusted_certificates: Vec<Certificate>,
    sink: Arc<dyn AckSink>,
    acked: AtomicBool,
}

impl ParcelCollection {
    /// Builds a new collection. Called by the collection engine, once per
    /// inbound delivery.
    pub fn new(
        parcel_serialized: Vec<u8>,
        trusted_certificates: Vec<Certificate>,
        sink: Arc<dyn AckSink>,
    ) -> Self {
        Self {
            parcel_serialized,
            trusted_certificates,
            sink,
            acked: AtomicBool::new(false),
        }
    }

    /// The opaque application-layer parcel payload.
    pub fn parcel_serialized(&self) -> &[u8] {
        &self.parcel_serialized
    }

    /// The certificates of the signers supplied to `collect_parcels`, in
    /// call order — the trust anchors for this parcel.
    pub fn trusted_certificates(&self) -> &[Certificate] {
        &self.trusted_certificates
    }

    /// Acknowledges receipt of this parcel.
    ///
    /// Idempotent: the engine sends at most one ACK frame regardless of how
    /// many times this is called, though callers should still only call it
    /// once.
    pub async fn ack(&self) {
        if !self.acked.swap(true, Ordering::SeqCst) {
            self.sink.ack().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingSink(Arc<AtomicUsize>);

    #[async_trait]
    impl AckSink for CountingSink {
        async fn ack(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn ack_is_idempotent_across_repeated_calls() {
        let count = Arc::new(AtomicUsize::new(0));
        let collection = ParcelCollection::new(
            b"parcel".to_vec(),
            vec![Certificate::from_bytes(b"cert".to_vec())],
            Arc::new(CountingSink(count.clone())),
        );

        collection.ack().await;
        collection.ack().await;
        collection.ack().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exposes_parcel_bytes_and_trusted_certificates() {
        let certs = vec![
            Certificate::from_bytes(b"a".to_vec()),
            Certificate::from_bytes(b"b".to_vec()),
        ];
        struct NoopSink;
        #[async_trait]
        impl AckSink for NoopSink {
            async fn ack(&self) {}
        }
        let collection =
            ParcelCollection::new(b"payload".to_vec(), certs.clone(), Arc::new(NoopSink));
        assert_eq!(collection.parcel_serialized(), b"payload");
        assert_eq!(collection.trusted_certificates(), certs.as_slice());
    }
}
