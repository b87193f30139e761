//! TCP envelope framing.
//!
//! Each frame is `50 50 82 7D`, a `u32` little-endian payload length, then
//! the payload: `command`, `checksum`, `session_id`, `reply_id` (all `u16`
//! little-endian) followed by data.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::packet::Packet;
use crate::error::DeviceError;

/// TCP envelope magic.
pub const MAGIC: [u8; 4] = [0x50, 0x50, 0x82, 0x7D];

const ENVELOPE_LEN: usize = 8;
const HEADER_LEN: usize = 8;
/// Upper bound on a single payload; terminals never send more than one chunk.
const MAX_PAYLOAD: usize = 4 * 1024 * 1024;

/// Codec for [`Packet`]s inside the TCP envelope.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZkCodec;

impl Decoder for ZkCodec {
    type Item = Packet;
    type Error = DeviceError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, DeviceError> {
        if src.len() < ENVELOPE_LEN {
            return Ok(None);
        }
        if src[..4] != MAGIC {
            return Err(DeviceError::protocol(format!(
                "Invalid frame magic {:02x?}",
                &src[..4]
            )));
        }

        let len = u32::from_le_bytes([src[4], src[5], src[6], src[7]]) as usize;
        if len < HEADER_LEN {
            return Err(DeviceError::protocol(format!("Payload too short: {len} bytes")));
        }
        if len > MAX_PAYLOAD {
            return Err(DeviceError::protocol(format!("Payload too large: {len} bytes")));
        }
        if src.len() < ENVELOPE_LEN + len {
            src.reserve(ENVELOPE_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(ENVELOPE_LEN);
        let mut payload = src.split_to(len);
        let command = payload.get_u16_le();
        let checksum = payload.get_u16_le();
        let session_id = payload.get_u16_le();
        let reply_id = payload.get_u16_le();

        Ok(Some(Packet {
            command,
            checksum,
            session_id,
            reply_id,
            data: payload.freeze(),
        }))
    }
}

impl Encoder<Packet> for ZkCodec {
    type Error = DeviceError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), DeviceError> {
        let len = HEADER_LEN + packet.data.len();
        dst.reserve(ENVELOPE_LEN + len);
        dst.put_slice(&MAGIC);
        dst.put_u32_le(len as u32);
        dst.put_u16_le(packet.command);
        dst.put_u16_le(packet.checksum);
        dst.put_u16_le(packet.session_id);
        dst.put_u16_le(packet.reply_id);
        dst.put_slice(&packet.data);
        Ok(())
    }
}
