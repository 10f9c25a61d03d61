// ABOUTME: Buffered framing layer over a TcpStream, parses Frames out of the byte stream
// ABOUTME: Owns no subscription-index or routing knowledge, only bytes in and bytes out

use crate::codec::Frame;
use crate::error::CodecError;
use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// Try to parse a single frame out of `buffer`, reading more bytes from
/// `reader` as needed. Shared by [`Connection::read_frame`] and by
/// [`crate::session`]'s split read half, so the framing logic lives in
/// exactly one place regardless of whether the socket has been split.
pub(crate) async fn read_frame_from<R>(
    reader: &mut R,
    buffer: &mut BytesMut,
) -> Result<Option<Frame>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        {
            let mut buf = Cursor::new(&buffer[..]);
            match Frame::check(&mut buf) {
                Ok(len) => {
                    buf.set_position(0);
                    let frame = Frame::parse(&mut buf)?;
                    buffer.advance(len);
                    return Ok(Some(frame));
                }
                Err(CodecError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if 0 == reader.read_buf(buffer).await? {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(ConnectionError::Reset)
            };
        }
    }
}

/// A framed connection over a single TCP socket.
///
/// Read and write buffers are initialized on construction. `Connection`
/// operates purely at the byte/frame level; it knows nothing about sessions,
/// subscriptions, or routing.
#[derive(Debug)]
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

/// Error returned while driving a [`Connection`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection reset by peer")]
    Reset,
}

impl Connection {
    /// Create a new `Connection`, backed by `socket`.
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single [`Frame`] from the underlying stream.
    ///
    /// Waits until enough data has been buffered to parse a complete frame.
    /// Returns `Ok(None)` on a clean peer shutdown (no partial frame left
    /// dangling in the buffer); any other EOF-with-partial-data is
    /// [`ConnectionError::Reset`].
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        read_frame_from(&mut self.stream, &mut self.buffer).await
    }

    /// Write a pre-framed byte buffer to the socket and flush it.
    ///
    /// The caller is responsible for assembling a complete frame (leading
    /// type byte plus body); this method performs no encoding of its own.
    pub async fn write_frame(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    /// The remote peer's socket address, for diagnostics.
    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.get_ref().peer_addr()
    }
}
