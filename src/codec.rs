// ABOUTME: Wire-format codec for the pub/sub broker's fixed binary frame layout
// ABOUTME: Pure encode/decode functions over byte buffers, no I/O, no session state

use crate::error::CodecError;
use bytes::{Buf, BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

/// Size in bytes of a `TradeMessage` payload on the wire.
pub const TRADE_MESSAGE_SIZE: usize = 28;

/// The leading byte of every frame, identifying what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum FrameType {
    Subscribe = 0x01,
    Data = 0x02,
}

/// The fixed-schema payload carried by a DATA frame.
///
/// The broker never interprets `timestamp_ms`, `price`, or `quantity` --
/// they travel verbatim from publisher to subscriber. Only `topic_id` is
/// inspected, for routing. This type exists for the codec's own round-trip
/// tests and for the example clients, which do care about the full record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeMessage {
    pub topic_id: i32,
    pub timestamp_ms: u64,
    pub price: f64,
    pub quantity: f64,
}

impl TradeMessage {
    /// Append the big-endian wire encoding of this message to `buf`.
    ///
    /// `price` and `quantity` are written as a bitwise reinterpretation of
    /// their native IEEE-754 representation in big-endian byte order, not a
    /// textual or normalized form -- `bytes::BufMut::put_f64` already does
    /// exactly this.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32(self.topic_id);
        buf.put_u64(self.timestamp_ms);
        buf.put_f64(self.price);
        buf.put_f64(self.quantity);
    }

    /// Decode a `TradeMessage` from exactly [`TRADE_MESSAGE_SIZE`] bytes.
    ///
    /// Callers are responsible for ensuring `buf` has enough remaining
    /// bytes; this layer does no I/O and raises no "need more data" error --
    /// that distinction belongs to the connection's frame parser.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Self {
        TradeMessage {
            topic_id: buf.get_i32(),
            timestamp_ms: buf.get_u64(),
            price: buf.get_f64(),
            quantity: buf.get_f64(),
        }
    }
}

/// A frame read off the wire, decoded just enough to act on.
///
/// For `Data`, only `topic_id` is decoded eagerly; `payload` holds the full
/// 28-byte record (including the topic id) exactly as received, so it can be
/// retransmitted to subscribers without a re-encode.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Subscribe { topic_id: i32 },
    Data { topic_id: i32, payload: bytes::Bytes },
}

impl Frame {
    /// Check whether `src` holds a complete frame without allocating, and if
    /// so return how many bytes it occupies. Returns `CodecError::Incomplete`
    /// if more bytes are needed, or `UnknownFrameType` if the leading byte is
    /// not recognized.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
        if !src.has_remaining() {
            return Err(CodecError::Incomplete);
        }
        let type_byte = src.chunk()[0];
        let body_len = match FrameType::try_from(type_byte) {
            Ok(FrameType::Subscribe) => 4,
            Ok(FrameType::Data) => TRADE_MESSAGE_SIZE,
            Err(_) => return Err(CodecError::UnknownFrameType(type_byte)),
        };
        let total = 1 + body_len;
        if src.remaining() < total {
            return Err(CodecError::Incomplete);
        }
        Ok(total)
    }

    /// Parse a frame out of `src`, which must already have been validated by
    /// [`Frame::check`] to contain a complete frame. Advances `src` past the
    /// consumed bytes.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let type_byte = src.get_u8();
        match FrameType::try_from(type_byte) {
            Ok(FrameType::Subscribe) => {
                let topic_id = src.get_i32();
                Ok(Frame::Subscribe { topic_id })
            }
            Ok(FrameType::Data) => {
                let start = src.position() as usize;
                let inner = src.get_ref();
                let topic_id = i32::from_be_bytes([
                    inner[start],
                    inner[start + 1],
                    inner[start + 2],
                    inner[start + 3],
                ]);
                let payload =
                    bytes::Bytes::copy_from_slice(&inner[start..start + TRADE_MESSAGE_SIZE]);
                src.advance(TRADE_MESSAGE_SIZE);
                Ok(Frame::Data { topic_id, payload })
            }
            Err(_) => Err(CodecError::UnknownFrameType(type_byte)),
        }
    }
}

/// Build the outbound bytes for a DATA frame given the already-framed
/// 28-byte payload (topic_id + timestamp_ms + price + quantity), without
/// re-encoding it: `{0x02} ++ payload`.
pub fn data_frame_bytes(payload: &bytes::Bytes) -> bytes::Bytes {
    let mut buf = BytesMut::with_capacity(1 + payload.len());
    buf.put_u8(FrameType::Data as u8);
    buf.extend_from_slice(payload);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(msg: TradeMessage) {
        let mut buf = BytesMut::new();
        msg.encode(&mut buf);
        assert_eq!(buf.len(), TRADE_MESSAGE_SIZE);
        let mut cursor = Cursor::new(&buf[..]);
        let decoded = TradeMessage::decode(&mut cursor);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn trade_message_roundtrip_finite_values() {
        roundtrip(TradeMessage {
            topic_id: 7,
            timestamp_ms: 0x0000_018F_6E4B_7A00,
            price: 100.0,
            quantity: 2.0,
        });
    }

    #[test]
    fn trade_message_roundtrip_boundary_topic_ids() {
        roundtrip(TradeMessage {
            topic_id: i32::MAX,
            timestamp_ms: u64::MAX,
            price: 1.5,
            quantity: 0.25,
        });
        roundtrip(TradeMessage {
            topic_id: i32::MIN,
            timestamp_ms: 0,
            price: -1.5,
            quantity: -0.25,
        });
    }

    #[test]
    fn trade_message_roundtrip_ieee754_edge_cases() {
        for price in [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let msg = TradeMessage {
                topic_id: 1,
                timestamp_ms: 0,
                price,
                quantity: 1.0,
            };
            let mut buf = BytesMut::new();
            msg.encode(&mut buf);
            let mut cursor = Cursor::new(&buf[..]);
            let decoded = TradeMessage::decode(&mut cursor);
            if price.is_nan() {
                assert!(decoded.price.is_nan());
            } else {
                // bit-exact, including the sign of zero
                assert_eq!(decoded.price.to_bits(), price.to_bits());
            }
        }
    }

    #[test]
    fn subscribe_frame_wire_bytes() {
        let mut src = vec![0x01u8];
        src.extend_from_slice(&7i32.to_be_bytes());
        let mut cursor = Cursor::new(&src[..]);
        let len = Frame::check(&mut cursor).unwrap();
        assert_eq!(len, 5);
        cursor.set_position(0);
        let frame = Frame::parse(&mut cursor).unwrap();
        assert_eq!(frame, Frame::Subscribe { topic_id: 7 });
    }

    #[test]
    fn data_frame_wire_bytes_match_s1_scenario() {
        let bytes = [
            0x02, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x01, 0x8F, 0x6E, 0x4B, 0x7A, 0x00, 0x40,
            0x59, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
        ];
        let mut cursor = Cursor::new(&bytes[..]);
        let len = Frame::check(&mut cursor).unwrap();
        assert_eq!(len, 29);
        cursor.set_position(0);
        let frame = Frame::parse(&mut cursor).unwrap();
        match frame {
            Frame::Data { topic_id, payload } => {
                assert_eq!(topic_id, 7);
                assert_eq!(payload.len(), TRADE_MESSAGE_SIZE);
                let mut payload_cursor = Cursor::new(&payload[..]);
                let decoded = TradeMessage::decode(&mut payload_cursor);
                assert_eq!(decoded.price, 100.0);
                assert_eq!(decoded.quantity, 2.0);
            }
            other => panic!("expected Data frame, got {other:?}"),
        }
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        let src = [0xFFu8];
        let mut cursor = Cursor::new(&src[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::UnknownFrameType(0xFF))
        ));
    }

    #[test]
    fn incomplete_frame_requests_more_data() {
        let src = [0x02u8, 0x00, 0x00];
        let mut cursor = Cursor::new(&src[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::Incomplete)
        ));
    }

    #[test]
    fn data_frame_bytes_is_verbatim_not_reencoded() {
        let payload = bytes::Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x01, 0x8F, 0x6E, 0x4B, 0x7A, 0x00, 0x40, 0x59,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        let framed = data_frame_bytes(&payload);
        assert_eq!(framed[0], 0x02);
        assert_eq!(&framed[1..], &payload[..]);
    }
}
