//! Punch timestamp interpretation.
//!
//! Device exports and hand-edited files carry dates in many shapes. Known
//! formats are tried first; anything else goes through a component
//! reordering fallback.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use tracing::warn;

use clubhouse_core::error::AppError;

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2099;

const NATIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Component orders tried by the fallback, as (year, month, day) positions.
const ORDERS: [(usize, usize, usize); 3] = [(0, 1, 2), (2, 1, 0), (1, 2, 0)];

/// Parses punch timestamps, reading naive times in the terminals' offset.
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    offset: FixedOffset,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(0)
    }
}

fn in_range(naive: &NaiveDateTime) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&naive.year())
}

impl TimestampParser {
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| {
            warn!(utc_offset_minutes, "Device UTC offset out of range, using UTC");
            Utc.fix()
        });
        Self { offset }
    }

    /// Interpret terminal wall-clock time.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.offset.from_local_datetime(&naive).single() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&naive),
        }
    }

    /// Parse a timestamp string.
    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, AppError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(AppError::unparsable_timestamp(raw));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            let utc = dt.with_timezone(&Utc);
            if in_range(&utc.naive_utc()) {
                return Ok(utc);
            }
        }
        parse_native(text)
            .or_else(|| parse_reordered(text))
            .filter(in_range)
            .map(|naive| self.localize(naive))
            .ok_or_else(|| AppError::unparsable_timestamp(raw))
    }
}

fn parse_native(text: &str) -> Option<NaiveDateTime> {
    NATIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Split a component into its leading digits and whatever is glued after.
fn split_glued(component: &str) -> (&str, &str) {
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    let rest = component[end..].trim_start_matches(|c: char| !c.is_ascii_digit());
    (&component[..end], rest)
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    if text.is_empty() {
        return Some(NaiveTime::MIN);
    }
    let mut fields = [0u32; 3];
    let parts: Vec<&str> = text.split(':').filter(|p| !p.is_empty()).collect();
    if parts.len() > 3 {
        return None;
    }
    for (slot, part) in fields.iter_mut().zip(&parts) {
        let whole = part.split('.').next().unwrap_or(part);
        *slot = whole.trim().parse().ok()?;
    }
    NaiveTime::from_hms_opt(fields[0], fields[1], fields[2])
}

fn parse_reordered(text: &str) -> Option<NaiveDateTime> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, ':' | '-' | '.' | '/' | 'T'))
        .collect();

    for separator in ['-', '/', ' '] {
        let parts: Vec<&str> = cleaned
            .split(separator)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            continue;
        }

        let (third, glued) = split_glued(parts[2]);
        let mut time_fields: Vec<&str> = Vec::new();
        if !glued.is_empty() {
            time_fields.push(glued);
        }
        time_fields.extend(parts[3..].iter().copied());
        let Some(time) = parse_time(&time_fields.join(":")) else {
            continue;
        };

        let components = [parts[0], parts[1], third];
        for (y, m, d) in ORDERS {
            let (Ok(year), Ok(month), Ok(day)) = (
                components[y].parse::<i32>(),
                components[m].parse::<u32>(),
                components[d].parse::<u32>(),
            ) else {
                continue;
            };
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                continue;
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date.and_time(time));
            }
        }
    }
    None
}
