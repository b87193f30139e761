//! Command header and checksum.

use bytes::Bytes;

/// `u16::MAX` as used by the vendor checksum and reply counter.
const USHRT_MAX: i64 = 65535;

/// One protocol message: an 8-byte header followed by data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: u16,
    pub checksum: u16,
    pub session_id: u16,
    pub reply_id: u16,
    pub data: Bytes,
}

impl Packet {
    /// Build an outgoing request.
    ///
    /// The checksum covers the header carrying `previous_reply`; the packet
    /// itself carries the advanced reply counter.
    pub fn request(command: u16, session_id: u16, previous_reply: u16, data: Bytes) -> Self {
        let mut buf = Vec::with_capacity(8 + data.len());
        buf.extend_from_slice(&command.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&session_id.to_le_bytes());
        buf.extend_from_slice(&previous_reply.to_le_bytes());
        buf.extend_from_slice(&data);

        Self {
            command,
            checksum: checksum(&buf),
            session_id,
            reply_id: next_reply_id(previous_reply),
            data,
        }
    }
}

/// Advance the reply counter, wrapping below `u16::MAX`.
pub fn next_reply_id(reply_id: u16) -> u16 {
    let next = i64::from(reply_id) + 1;
    if next >= USHRT_MAX {
        (next - USHRT_MAX) as u16
    } else {
        next as u16
    }
}

/// Vendor checksum: folded sum of little-endian words, complemented.
pub fn checksum(buf: &[u8]) -> u16 {
    let mut sum: i64 = 0;
    let mut words = buf.chunks_exact(2);
    for word in &mut words {
        sum += i64::from(u16::from_le_bytes([word[0], word[1]]));
        if sum > USHRT_MAX {
            sum -= USHRT_MAX;
        }
    }
    if let [last] = words.remainder() {
        sum += i64::from(*last);
    }
    while sum > USHRT_MAX {
        sum -= USHRT_MAX;
    }
    let mut folded = !sum;
    while folded < 0 {
        folded += USHRT_MAX;
    }
    folded as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zk::command::CMD_CONNECT;

    #[test]
    fn test_connect_request_header() {
        let packet = Packet::request(CMD_CONNECT, 0, 65534, Bytes::new());
        assert_eq!(packet.checksum, 0xFC17);
        assert_eq!(packet.reply_id, 0);
    }

    #[test]
    fn test_reply_counter_wraps() {
        assert_eq!(next_reply_id(0), 1);
        assert_eq!(next_reply_id(65533), 65534);
        assert_eq!(next_reply_id(65534), 0);
    }

    #[test]
    fn test_checksum_handles_odd_length() {
        let even = checksum(&[0x01, 0x00]);
        let odd = checksum(&[0x01, 0x00, 0x02]);
        assert_eq!(even, 65533);
        assert_eq!(odd, even - 2);
    }
}
