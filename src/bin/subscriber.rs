// ABOUTME: Example subscriber client: connects, sends one SUBSCRIBE frame, then prints every
// ABOUTME: DATA frame it receives -- exercises the wire protocol as an ordinary peer, nothing more

use argh::FromArgs;
use bytes::{Buf, Bytes};
use pubsub_broker::codec::Frame;
use pubsub_broker::connection::Connection;
use std::error::Error;
use std::io::Cursor;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Example subscriber: subscribes to one topic and prints every DATA frame it receives
#[derive(FromArgs)]
struct CliArgs {
    /// broker address to connect to (default: 127.0.0.1:8080)
    #[argh(option)]
    addr: Option<String>,

    /// topic id to subscribe to (default: 1)
    #[argh(positional)]
    topic_id: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli_args: CliArgs = argh::from_env();
    let addr = cli_args.addr.unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let topic_id = cli_args.topic_id.unwrap_or(1);

    let mut stream = TcpStream::connect(&addr).await?;
    info!(%addr, topic_id, "connected, subscribing");

    let mut subscribe = vec![0x01u8];
    subscribe.extend_from_slice(&topic_id.to_be_bytes());
    stream.write_all(&subscribe).await?;

    let mut connection = Connection::new(stream);
    loop {
        let frame = match connection.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("broker closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "connection error, exiting");
                break;
            }
        };

        match frame {
            Frame::Subscribe { .. } => {
                // The broker never sends SUBSCRIBE frames back; seeing one here
                // would mean the wire got out of sync.
                warn!("unexpected SUBSCRIBE frame on the receive side");
            }
            Frame::Data { topic_id, payload } => print_trade(topic_id, &payload),
        }
    }

    Ok(())
}

fn print_trade(topic_id: i32, payload: &Bytes) {
    let mut cursor = Cursor::new(&payload[..]);
    cursor.advance(4); // topic_id already decoded by the caller
    let timestamp_ms = cursor.get_u64();
    let price = cursor.get_f64();
    let quantity = cursor.get_f64();
    println!("topic={topic_id} timestamp_ms={timestamp_ms} price={price} quantity={quantity}");
}
