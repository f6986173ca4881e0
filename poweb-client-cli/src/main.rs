use std::sync::Arc;

use clap::Parser;
use eyre::Context as _;
use futures::StreamExt as _;
use poweb_client::PoWebClient;
use poweb_client_cli::config::{Command, PoWebDevClientConfig};
use poweb_client_cli::dev_signer::DevNonceSigner;

fn install_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("poweb_client_cli=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_tracing();
    let config = PoWebDevClientConfig::parse();
    tracing::info!(host = %config.host, port = config.port, "starting poweb-client-cli");

    let client = PoWebClient::new(poweb_types::EndpointConfig::new(
        config.host,
        config.port,
        config.use_tls,
    ));

    match config.command {
        Command::PreRegister(cmd) => {
            let public_key =
                hex::decode(&cmd.public_key_hex).context("public key must be hex-encoded")?;
            let authorization = client.pre_register(&public_key).await?;
            println!("{}", hex::encode(authorization.as_bytes()));
        }
        Command::Register(cmd) => {
            let pnrr = hex::decode(&cmd.pnrr_countersigned)
                .context("countersigned PNRR must be hex-encoded")?;
            let registration = client.register(&pnrr).await?;
            println!(
                "node_certificate={} gateway_certificate={}",
                hex::encode(registration.node_certificate.as_bytes()),
                hex::encode(registration.gateway_certificate.as_bytes())
            );
        }
        Command::DeliverParcel(cmd) => {
            let parcel = std::fs::read(&cmd.parcel_path)
                .with_context(|| format!("reading {}", cmd.parcel_path.display()))?;
            let signature = hex::decode(&cmd.countersignature_hex)
                .context("countersignature must be hex-encoded")?;
            client.deliver_parcel(&parcel, &signature).await?;
            tracing::info!("parcel delivered");
        }
        Command::Collect(cmd) => {
            let key = std::fs::read(&cmd.key_path)
                .with_context(|| format!("reading {}", cmd.key_path.display()))?;
            let certificate = std::fs::read(&cmd.certificate_path)
                .with_context(|| format!("reading {}", cmd.certificate_path.display()))?;
            let signer: Arc<dyn poweb_types::NonceSigner> =
                Arc::new(DevNonceSigner::new(key, certificate));

            let mut collected = 0usize;
            let mut stream = Box::pin(client.collect_parcels(vec![signer], cmd.mode.into()));
            while let Some(result) = stream.next().await {
                let parcel = result?;
                tracing::info!(bytes = parcel.parcel_serialized().len(), "parcel collected");
                parcel.ack().await;
                collected += 1;
                if cmd.max_parcels.is_some_and(|max| collected >= max) {
                    break;
                }
            }
            tracing::info!(collected, "done collecting");
        }
    }

    client.close();
    Ok(())
}
