use std::path::PathBuf;

use clap::{Parser, Subcommand};
use poweb_types::StreamingMode;

#[derive(Clone, Debug, Parser)]
pub struct PreRegisterCommand {
    /// Hex-encoded public key to pre-register.
    #[clap(long)]
    pub public_key_hex: String,
}

#[derive(Clone, Debug, Parser)]
pub struct RegisterCommand {
    /// Hex-encoded, countersigned PNRR received out of band.
    #[clap(long)]
    pub pnrr_countersigned: String,
}

#[derive(Clone, Debug, Parser)]
pub struct DeliverParcelCommand {
    /// Path to the serialized parcel to deliver.
    #[clap(long)]
    pub parcel_path: PathBuf,

    /// Hex-encoded detached signature over the parcel body.
    #[clap(long)]
    pub countersignature_hex: String,
}

#[derive(Clone, Debug, Parser)]
pub struct CollectCommand {
    /// Path to a raw private key this development signer uses to answer
    /// handshake challenges. Not a substitute for a real PKI signer.
    #[clap(long)]
    pub key_path: PathBuf,

    /// Path to the DER certificate bound to `key_path`.
    #[clap(long)]
    pub certificate_path: PathBuf,

    /// Streaming mode to request.
    #[clap(long, default_value = "keep-alive")]
    pub mode: CliStreamingMode,

    /// Stop after collecting this many parcels. Runs until cancelled with
    /// Ctrl-C if unset.
    #[clap(long)]
    pub max_parcels: Option<usize>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CliStreamingMode {
    KeepAlive,
    CloseUponCompletion,
}

impl From<CliStreamingMode> for StreamingMode {
    fn from(mode: CliStreamingMode) -> Self {
        match mode {
            CliStreamingMode::KeepAlive => StreamingMode::KeepAlive,
            CliStreamingMode::CloseUponCompletion => StreamingMode::CloseUponCompletion,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    PreRegister(PreRegisterCommand),
    Register(RegisterCommand),
    DeliverParcel(DeliverParcelCommand),
    Collect(CollectCommand),
}

/// Configuration for the PoWeb development client.
///
/// Can be configured via environment variables or command line arguments
/// using `clap`.
#[derive(Parser, Debug)]
pub struct PoWebDevClientConfig {
    /// The gateway host to connect to.
    #[clap(long, env = "POWEB_DEV_CLIENT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The gateway port to connect to.
    #[clap(long, env = "POWEB_DEV_CLIENT_PORT", default_value = "276")]
    pub port: u16,

    /// Whether to use TLS when connecting.
    #[clap(long, env = "POWEB_DEV_CLIENT_USE_TLS")]
    pub use_tls: bool,

    /// Command
    #[command(subcommand)]
    pub command: Command,
}
