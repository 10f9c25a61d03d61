// ABOUTME: Example publisher client: connects and sends one DATA frame per tick on a fixed
// ABOUTME: topic, with a synthetic price that walks randomly -- illustrative only, not part of the core

use argh::FromArgs;
use bytes::BytesMut;
use pubsub_broker::codec::{data_frame_bytes, TradeMessage};
use pubsub_broker::connection::Connection;
use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::time::{interval, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Example publisher: sends one DATA frame per tick to a fixed topic
#[derive(FromArgs)]
struct CliArgs {
    /// broker address to connect to (default: 127.0.0.1:8080)
    #[argh(option)]
    addr: Option<String>,

    /// topic id to publish to (default: 1)
    #[argh(option, short = 't')]
    topic_id: Option<i32>,

    /// milliseconds between published frames (default: 1000)
    #[argh(option)]
    interval_ms: Option<u64>,

    /// number of frames to publish before exiting (default: unbounded)
    #[argh(option)]
    count: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli_args: CliArgs = argh::from_env();
    let addr = cli_args.addr.unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let topic_id = cli_args.topic_id.unwrap_or(1);
    let period = Duration::from_millis(cli_args.interval_ms.unwrap_or(1000));

    let stream = TcpStream::connect(&addr).await?;
    let mut connection = Connection::new(stream);
    info!(%addr, topic_id, "connected, publishing");

    let mut ticker = interval(period);
    let mut price = 100.0f64;
    let mut sent = 0u64;

    loop {
        if cli_args.count.is_some_and(|limit| sent >= limit) {
            break;
        }
        ticker.tick().await;

        // A small deterministic walk; this client has no business needing a
        // real RNG dependency just to demonstrate the wire protocol.
        let step = ((sent % 7) as f64 - 3.0) * 0.1;
        price += step;

        let message = TradeMessage {
            topic_id,
            timestamp_ms: now_millis(),
            price,
            quantity: 1.0 + (sent % 5) as f64,
        };

        let mut encoded = BytesMut::new();
        message.encode(&mut encoded);
        let framed = data_frame_bytes(&encoded.freeze());
        connection.write_frame(&framed).await?;
        sent += 1;
        info!(topic_id, sent, price, "published frame");
    }

    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
