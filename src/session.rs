// ABOUTME: One task pair per accepted connection: a read loop driving the frame
// ABOUTME: state machine, and a writer loop draining that session's outbound queue

use crate::codec::{data_frame_bytes, Frame};
use crate::connection::read_frame_from;
use crate::index::SubscriptionIndex;
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

/// The thread-safe, non-owning-reference-friendly handle to a session.
///
/// The subscription index stores [`std::sync::Weak`] pointers to these
/// handles; it never keeps a session alive. `deliver_raw` is the session's
/// entire public write-path contract: callable from any worker, FIFO with
/// respect to the calling thread via the underlying mpsc channel.
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<Bytes>,
    closed: AtomicBool,
    closed_notify: Notify,
    peer_addr: Option<SocketAddr>,
}

impl SessionHandle {
    /// Enqueue a fully-framed outbound byte buffer for delivery. Thread-safe;
    /// a no-op once the session has closed (the writer loop has exited and
    /// further sends are simply dropped by the channel).
    pub fn deliver_raw(&self, bytes: Bytes) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let _ = self.sender.send(bytes);
    }

    /// Mark this session closed. Idempotent. Wakes the writer loop out of its
    /// `recv()` wait -- the writer also holds a strong reference to this
    /// handle (and, through it, the `Sender`), so the channel's own "sender
    /// dropped" signal never fires on its own; `closed_notify` is what
    /// actually tells the writer to stop.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.closed_notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Build a handle with no live writer loop behind it, for index unit
    /// tests and benchmarks that only care about identity and never
    /// actually deliver bytes.
    #[doc(hidden)]
    pub fn for_test() -> Self {
        let (sender, _receiver) = mpsc::unbounded_channel();
        SessionHandle {
            sender,
            closed: AtomicBool::new(false),
            closed_notify: Notify::new(),
            peer_addr: None,
        }
    }
}

/// Accept a freshly-connected socket and spawn its session tasks.
///
/// Returns immediately; all subsequent work happens on the two spawned
/// tasks (reader and writer), matching the specification's "non-blocking,
/// driven by I/O completions" contract for `start()`. The returned join
/// handles are `(reader, writer)`; ordinary callers discard them (the tasks
/// are self-terminating), tests use them to assert both tasks actually exit
/// on close instead of leaking.
pub fn spawn(
    socket: TcpStream,
    index: Arc<SubscriptionIndex>,
) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
    let peer_addr = socket.peer_addr().ok();
    let (read_half, write_half) = socket.into_split();
    let (sender, receiver) = mpsc::unbounded_channel();

    let handle = Arc::new(SessionHandle {
        sender,
        closed: AtomicBool::new(false),
        closed_notify: Notify::new(),
        peer_addr,
    });

    let writer =
        tokio::spawn(writer_loop(write_half, receiver, Arc::clone(&index), Arc::clone(&handle)));
    let reader = tokio::spawn(read_loop(read_half, index, handle));
    (reader, writer)
}

/// Terminate this session: mark it closed and drop it from every topic in
/// the index. Idempotent -- both `close()` and `unsubscribe_all` are safe to
/// call more than once -- so the reader and writer loops can each call this
/// independently on their own failure path without coordinating with each
/// other.
fn handle_error_and_close(index: &SubscriptionIndex, handle: &Arc<SessionHandle>) {
    handle.close();
    index.unsubscribe_all(handle);
}

/// Drain the session's outbound queue to the wire in FIFO order, one
/// in-flight write at a time. Exits (and closes the session, unsubscribing
/// it from the index) on first write error, or as soon as the session is
/// closed.
///
/// The writer holds a strong `Arc<SessionHandle>` (to log `peer_addr` and to
/// call `handle_error_and_close` on its own write failures), and
/// `SessionHandle` owns the `Sender` half of the channel `receiver` drains --
/// so the channel's own sender-dropped signal never reaches this loop on its
/// own: the last `Sender` would only drop once this task exits, which is
/// exactly what we're waiting for. `closed_notify` breaks that cycle: the
/// reader's `close()` call (on EOF or protocol error) wakes this loop
/// directly instead of relying on the channel to do it.
async fn writer_loop(
    write_half: OwnedWriteHalf,
    mut receiver: mpsc::UnboundedReceiver<Bytes>,
    index: Arc<SubscriptionIndex>,
    handle: Arc<SessionHandle>,
) {
    let mut writer = BufWriter::new(write_half);
    loop {
        let bytes = tokio::select! {
            biased;
            maybe_bytes = receiver.recv() => match maybe_bytes {
                Some(bytes) => bytes,
                None => break,
            },
            _ = handle.closed_notify.notified() => break,
        };

        if let Err(e) = writer.write_all(&bytes).await {
            warn!(peer = ?handle.peer_addr(), error = %e, "write failed, closing session");
            handle_error_and_close(&index, &handle);
            return;
        }
        if let Err(e) = writer.flush().await {
            warn!(peer = ?handle.peer_addr(), error = %e, "flush failed, closing session");
            handle_error_and_close(&index, &handle);
            return;
        }
    }

    debug!(peer = ?handle.peer_addr(), "writer loop exiting, session closed");
    handle_error_and_close(&index, &handle);
}

/// Drive the receive state machine: AwaitHeader -> AwaitSubscribeTopic or
/// AwaitDataPayload -> AwaitHeader, forever, until error, unknown type, or
/// peer close.
async fn read_loop(mut read_half: OwnedReadHalf, index: Arc<SubscriptionIndex>, handle: Arc<SessionHandle>) {
    let mut buffer = BytesMut::with_capacity(4 * 1024);

    loop {
        let frame = match read_frame_from(&mut read_half, &mut buffer).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(peer = ?handle.peer_addr(), "peer closed connection");
                break;
            }
            Err(e) => {
                info!(peer = ?handle.peer_addr(), error = %e, "protocol or io error, closing session");
                break;
            }
        };

        match frame {
            Frame::Subscribe { topic_id } => {
                index.subscribe(topic_id, &handle);
            }
            Frame::Data { topic_id, payload } => {
                let subscribers = index.subscribers(topic_id);
                debug!(topic_id, count = subscribers.len(), "routing to {} subscribers", subscribers.len());
                let framed = data_frame_bytes(&payload);
                for subscriber in &subscribers {
                    subscriber.deliver_raw(framed.clone());
                }
            }
        }
    }

    handle_error_and_close(&index, &handle);
}
