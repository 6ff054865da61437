use bytes::{Buf, BytesMut};
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{self, Message};

/// Frames larger than this are rejected before any allocation happens, so a
/// hostile or confused peer cannot ask us to buffer the moon.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

// Enough digits to express MAX_FRAME_SIZE; a longer prefix with no delimiter
// in sight cannot be a valid length.
const MAX_PREFIX_DIGITS: usize = 20;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("frame length prefix is not a non-negative decimal integer")]
    InvalidFrameLength,
    #[error("stream closed before a complete frame arrived")]
    IncompleteFrame,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_SIZE} byte limit")]
    FrameTooLarge(usize),
    #[error(transparent)]
    Message(#[from] message::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Length-prefixed framing for [`Message`] exchanges. The wire unit is
/// `<decimal-length>;<payload>` where the length counts the payload bytes
/// exactly and the payload is the serialized message.
pub struct MessageCodec;

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(sep) = src.iter().position(|&byte| byte == b';') else {
            if src.len() > MAX_PREFIX_DIGITS {
                return Err(Error::InvalidFrameLength);
            }
            // Length prefix still on the wire.
            return Ok(None);
        };

        let length = parse_prefix(&src[..sep])?;
        if length > MAX_FRAME_SIZE {
            return Err(Error::FrameTooLarge(length));
        }

        let frame_end = sep + 1 + length;
        if src.len() < frame_end {
            src.reserve(frame_end - src.len());
            return Ok(None);
        }

        src.advance(sep + 1);
        let payload = src.split_to(length).freeze();

        Ok(Some(Message::deserialize(payload)?))
    }

    // The default treats leftover bytes at EOF as a generic I/O error; a
    // peer that hangs up mid-frame deserves a protocol-level name.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(Error::IncompleteFrame),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = msg.serialize();
        if payload.len() > MAX_FRAME_SIZE {
            return Err(Error::FrameTooLarge(payload.len()));
        }

        let prefix = payload.len().to_string();
        dst.reserve(prefix.len() + 1 + payload.len());
        dst.extend_from_slice(prefix.as_bytes());
        dst.extend_from_slice(b";");
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

fn parse_prefix(digits: &[u8]) -> Result<usize, Error> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::InvalidFrameLength);
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidFrameLength)
}
