#![deny(missing_docs)]
//! Data model for the Parcel over Web (PoWeb) client.
//!
//! This crate groups the pieces of the PoWeb protocol that have no
//! networking dependency of their own:
//!
//! * the endpoint configuration a client connects with (see [`endpoint`]);
//! * the streaming mode used to negotiate the parcel-collection lifecycle
//!   (see [`streaming_mode`]);
//! * the [`NonceSigner`] capability supplied by the caller and the
//!   [`Certificate`] it is bound to (see [`signer`]);
//! * the three framed messages exchanged on the parcel-collection
//!   WebSocket, and their binary codec (see [`frames`]);
//! * the value handed back to callers for every collected parcel (see
//!   [`collection`]).
//!
//! `poweb-client` depends on this crate and adds the transport, the
//! collection engine, and the error mapper around these types.

pub mod collection;
pub mod endpoint;
pub mod frames;
pub mod signer;
pub mod streaming_mode;

pub use collection::ParcelCollection;
pub use endpoint::EndpointConfig;
pub use signer::{Certificate, NonceSigner, SignaturePurpose};
pub use streaming_mode::StreamingMode;
