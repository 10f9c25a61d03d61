// ABOUTME: Typed error taxonomy for the broker's transport, codec, and startup failures
// ABOUTME: Session-local errors never escape to other sessions; only bind failures are fatal

use std::io;
use std::net::SocketAddr;

/// Errors surfaced while decoding a frame out of a connection's read buffer.
///
/// `Incomplete` is not really an error condition from the caller's point of
/// view -- it just means "read more bytes" -- but giving it a variant keeps
/// the parser's control flow in `Result` instead of sentinel return values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("not enough data buffered yet")]
    Incomplete,

    #[error("unknown frame type byte {0:#04x}")]
    UnknownFrameType(u8),
}

/// Top-level broker error.
///
/// Transport and codec errors are handled locally to the session that
/// produced them -- they terminate that session and are logged, but are
/// never propagated to the acceptor or to other sessions, so `BrokerError`
/// never wraps them. `Bind` is the only variant, matching the one failure
/// mode the specification allows to unwind out of [`crate::server::run`].
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
