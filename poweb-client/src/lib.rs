#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Client for the Parcel over Web (PoWeb) binding: a WebSocket-based
//! protocol for collecting parcels from a gateway, plus the unary HTTP
//! endpoints node registration and parcel delivery use.
//!
//! The entry point is [`PoWebClient`]. Streaming parcel collection
//! ([`PoWebClient::collect_parcels`]) is the bulk of this crate; see
//! [`poweb_types::StreamingMode`] for the two lifecycles it supports.

mod client;
mod collection;
mod error;
mod transport;
mod unary;
mod ws_session;

pub use client::PoWebClient;
pub use error::PoWebError;
pub use unary::{Registration, RegistrationAuthorization};
