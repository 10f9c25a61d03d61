// ABOUTME: Process entry point: parses CLI flags, wires up tracing, and runs the broker
// ABOUTME: until Ctrl-C, at which point it drives the shutdown handshake to completion

use argh::FromArgs;
use pubsub_broker::{server, shutdown, BrokerConfig};
use std::error::Error;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Topic-based publish/subscribe message broker
#[derive(FromArgs)]
struct CliArgs {
    /// listen address, e.g. 0.0.0.0:8080 (default: 0.0.0.0:8080, or $PUBSUB_BROKER_ADDR)
    #[argh(option)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli_args: CliArgs = argh::from_env();
    let config = BrokerConfig::from_env(cli_args.addr);

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl-c handler");
            return;
        }
        info!("ctrl-c received, shutting down");
        trigger.trigger();
    });

    if let Err(e) = server::run(config, shutdown).await {
        error!(error = %e, "broker exited with a fatal error");
        return Err(e.into());
    }
    Ok(())
}
