//! Fixed-size record layouts for the attendance and user tables.

use bytes::{BufMut, Bytes, BytesMut};

use super::time;
use crate::error::DeviceError;
use crate::types::{DeviceRecord, DeviceUser};

pub const ATTENDANCE_RECORD_LEN: usize = 40;
pub const ATTENDANCE_RECORD_LEN_COMPACT: usize = 16;
pub const USER_RECORD_LEN: usize = 72;
pub const USER_RECORD_LEN_COMPACT: usize = 28;

/// Extract a NUL-padded ASCII field.
fn ascii(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

/// Write `value` into a fixed-width NUL-padded field, truncating if needed.
fn put_ascii(buf: &mut BytesMut, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    buf.put_slice(&bytes[..n]);
    buf.put_bytes(0, width - n);
}

fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Strip the 4-byte size prefix of a buffered table read.
pub fn table_body(buffer: &[u8]) -> Result<&[u8], DeviceError> {
    if buffer.len() < 4 {
        return Err(DeviceError::protocol("Table buffer shorter than size prefix"));
    }
    let declared = u32_at(buffer, 0) as usize;
    let body = &buffer[4..];
    Ok(&body[..declared.min(body.len())])
}

/// Pick the record width from the table size and the terminal's row count.
pub fn record_width(body_len: usize, rows: u32, candidates: &[usize]) -> Option<usize> {
    if body_len == 0 {
        return candidates.first().copied();
    }
    if rows > 0 && body_len % rows as usize == 0 {
        let width = body_len / rows as usize;
        if candidates.contains(&width) {
            return Some(width);
        }
    }
    candidates.iter().copied().find(|w| body_len % w == 0)
}

/// Decode the attendance table body.
pub fn decode_attendance(body: &[u8], width: usize) -> Result<Vec<DeviceRecord>, DeviceError> {
    body.chunks_exact(width)
        .map(|raw| match width {
            ATTENDANCE_RECORD_LEN => Ok(DeviceRecord {
                user_sn: u16_at(raw, 0),
                device_user_id: ascii(&raw[2..26]),
                verify_mode: raw[26],
                record_time: time::decode(u32_at(raw, 27))?,
                record_type: raw[31],
            }),
            ATTENDANCE_RECORD_LEN_COMPACT => Ok(DeviceRecord {
                user_sn: 0,
                device_user_id: u32_at(raw, 0).to_string(),
                record_time: time::decode(u32_at(raw, 4))?,
                verify_mode: raw[8],
                record_type: raw[9],
            }),
            other => Err(DeviceError::protocol(format!(
                "Unsupported attendance record size {other}"
            ))),
        })
        .collect()
}

/// Decode the user table body.
pub fn decode_users(body: &[u8], width: usize) -> Result<Vec<DeviceUser>, DeviceError> {
    body.chunks_exact(width)
        .map(|raw| match width {
            USER_RECORD_LEN => Ok(DeviceUser {
                uid: u16_at(raw, 0),
                privilege: raw[2],
                name: ascii(&raw[11..35]),
                card: u32_at(raw, 35),
                user_id: ascii(&raw[48..72]),
            }),
            USER_RECORD_LEN_COMPACT => Ok(DeviceUser {
                uid: u16_at(raw, 0),
                privilege: raw[2],
                name: ascii(&raw[8..16]),
                card: u32_at(raw, 16),
                user_id: u32_at(raw, 24).to_string(),
            }),
            other => Err(DeviceError::protocol(format!("Unsupported user record size {other}"))),
        })
        .collect()
}

/// Encode a `USER_WRQ` payload in the 72-byte layout.
pub fn encode_user(uid: u16, user_id: &str, name: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(USER_RECORD_LEN);
    buf.put_u16_le(uid);
    buf.put_u8(0); // privilege: regular user
    put_ascii(&mut buf, "", 8); // password
    put_ascii(&mut buf, name, 24);
    buf.put_u32_le(0); // card
    buf.put_u8(0);
    put_ascii(&mut buf, "", 7); // group
    buf.put_u8(0);
    put_ascii(&mut buf, user_id, 24);
    buf.freeze()
}
