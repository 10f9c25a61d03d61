// ABOUTME: Broadcast-channel-based shutdown signal shared by the acceptor, cleanup timer, and sessions
// ABOUTME: Resolves the specification's open question: no protocol in the reference design had one

use tokio::sync::broadcast;

/// Handle used by long-running tasks to observe a shutdown signal.
///
/// Cloned into the accept loop and the cleanup timer's loop; each clone
/// gets its own `broadcast::Receiver`, so a single `trigger()` call wakes
/// every listener exactly once.
#[derive(Debug)]
pub struct Shutdown {
    receiver: broadcast::Receiver<()>,
}

impl Shutdown {
    /// True once a shutdown signal has been observed.
    pub async fn recv(&mut self) {
        // A lagged receiver (missed broadcast slots) still means "shutdown
        // happened" for our purposes -- there is only ever one value sent.
        let _ = self.receiver.recv().await;
    }
}

impl Clone for Shutdown {
    fn clone(&self) -> Self {
        Shutdown {
            receiver: self.receiver.resubscribe(),
        }
    }
}

/// Sending half, held by `main` and fired on Ctrl-C (or explicitly in tests).
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: broadcast::Sender<()>,
}

/// Build a connected `(ShutdownTrigger, Shutdown)` pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = broadcast::channel(1);
    (ShutdownTrigger { sender }, Shutdown { receiver })
}

impl ShutdownTrigger {
    /// Signal every subscribed `Shutdown` handle. Safe to call more than
    /// once; later calls are no-ops once all receivers have already fired.
    pub fn trigger(&self) {
        let _ = self.sender.send(());
    }

    /// Produce another receiver for a task spawned after construction.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            receiver: self.sender.subscribe(),
        }
    }
}
