//! Packed terminal timestamps.
//!
//! `((((y - 2000) * 12 + (m - 1)) * 31 + (d - 1)) * 24 + h) * 60 + mi) * 60 + s`

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::DeviceError;

/// Decode a packed timestamp.
pub fn decode(packed: u32) -> Result<NaiveDateTime, DeviceError> {
    let mut t = packed;
    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % 31 + 1;
    t /= 31;
    let month = t % 12 + 1;
    t /= 12;
    let year = t as i32 + 2000;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| DeviceError::protocol(format!("Invalid packed time {packed}")))
}

/// Encode a timestamp. Years before 2000 cannot be represented.
pub fn encode(at: NaiveDateTime) -> Option<u32> {
    let years = u32::try_from(at.year() - 2000).ok()?;
    let days = (years * 12 + at.month0()) * 31 + at.day0();
    Some(((days * 24 + at.hour()) * 60 + at.minute()) * 60 + at.second())
}
