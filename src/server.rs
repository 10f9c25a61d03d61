// ABOUTME: Acceptor & runtime: binds the listener, spawns sessions, and runs the cleanup timer
// ABOUTME: All I/O multiplexes across tokio's multi-threaded runtime worker pool

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::index::SubscriptionIndex;
use crate::session;
use crate::shutdown::Shutdown;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::{error, info};

/// Bind the listener and run the broker until `shutdown` fires.
///
/// Spawns the accept loop and the periodic cleanup sweep as independent
/// tasks on the ambient tokio runtime, then awaits both before returning --
/// this is the "drain the worker pool" half of graceful shutdown.
pub async fn run(config: BrokerConfig, shutdown: Shutdown) -> Result<(), BrokerError> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| BrokerError::Bind {
            addr: config.addr,
            source,
        })?;
    info!(addr = %config.addr, "broker listening");

    let index = SubscriptionIndex::new();

    let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&index), shutdown.clone()));
    let cleanup_task = tokio::spawn(cleanup_loop(
        Arc::clone(&index),
        config.cleanup_interval,
        shutdown,
    ));

    let _ = tokio::join!(accept_task, cleanup_task);
    info!("broker shut down");
    Ok(())
}

/// Accept connections until shutdown is signaled. Accept errors are logged
/// and accept is re-armed; they never propagate.
async fn accept_loop(listener: TcpListener, index: Arc<SubscriptionIndex>, mut shutdown: Shutdown) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((socket, peer_addr)) => {
                        info!(peer = %peer_addr, "accepted connection");
                        let _ = session::spawn(socket, Arc::clone(&index));
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed, continuing");
                    }
                }
            }
            _ = shutdown.recv() => {
                info!("accept loop shutting down");
                break;
            }
        }
    }
}

/// Fire `index.cleanup_dead()` every `interval`, rearmed after every tick
/// (there is nothing to error on here: the index's sweep never fails).
async fn cleanup_loop(index: Arc<SubscriptionIndex>, period: std::time::Duration, mut shutdown: Shutdown) {
    let mut ticker = interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                index.cleanup_dead();
            }
            _ = shutdown.recv() => {
                info!("cleanup timer shutting down");
                break;
            }
        }
    }
}
