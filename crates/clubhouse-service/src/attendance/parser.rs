//! Attendance export file parsing.
//!
//! Both formats carry the positional columns
//! `deviceUserId, userSn, recordTime, recordType, verifyMode`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use clubhouse_core::error::AppError;

const HEADER_FIRST_COLUMN: &str = "deviceUserId";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Txt,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    /// Format implied by a file name extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            _ => Err(AppError::validation(format!(
                "Unsupported file format '{s}'. Only csv and txt files are accepted"
            ))),
        }
    }
}

/// One data row of an export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based physical line number.
    pub row: usize,
    pub device_user_id: String,
    pub user_sn: String,
    pub record_time: String,
    pub record_type: Option<String>,
    pub verify_mode: Option<String>,
}

/// Split a CSV line, honoring double quotes and `""` escapes.
fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn looks_like_time(token: &str) -> bool {
    token.contains(':') && token.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Split a TXT line: tabs when present, otherwise whitespace with the date
/// and time-of-day tokens re-joined.
fn split_txt(line: &str) -> Vec<String> {
    if line.contains('\t') {
        return line.split('\t').map(|f| f.trim().to_string()).collect();
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return tokens.into_iter().map(str::to_string).collect();
    }
    let mut fields: Vec<String> = vec![tokens[0].to_string(), tokens[1].to_string()];
    let rest = if tokens.len() >= 4 && looks_like_time(tokens[3]) && !looks_like_time(tokens[2]) {
        fields.push(format!("{} {}", tokens[2], tokens[3]));
        &tokens[4..]
    } else {
        fields.push(tokens[2].to_string());
        &tokens[3..]
    };
    fields.extend(rest.iter().map(|t| t.to_string()));
    fields
}

/// Parse file content into data rows.
///
/// Blank lines, a header row, rows with an empty first column and rows
/// without a second column are skipped.
pub fn parse_rows(content: &str, format: ImportFormat) -> Vec<RawRow> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            if line.trim().is_empty() {
                return None;
            }
            let fields = match format {
                ImportFormat::Csv => split_csv(line),
                ImportFormat::Txt => split_txt(line),
            };
            let first = fields.first().map(String::as_str).unwrap_or_default();
            if first.is_empty() || first.eq_ignore_ascii_case(HEADER_FIRST_COLUMN) {
                return None;
            }
            let user_sn = fields.get(1)?;
            let optional = |i: usize| fields.get(i).filter(|v| !v.is_empty()).cloned();
            Some(RawRow {
                row: index + 1,
                device_user_id: first.to_string(),
                user_sn: user_sn.clone(),
                record_time: fields.get(2).cloned().unwrap_or_default(),
                record_type: optional(3),
                verify_mode: optional(4),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_header_quotes_and_blank_lines() {
        let content = "deviceUserId,userSn,recordTime,recordType,verifyMode\n\
                       42,1,\"2024-01-15 09:00:00\",1,1\n\
                       \n\
                       \"4\"\"3\",2,2024-01-15 18:00:00,2,15\n\
                       ,3,2024-01-15 18:00:00,2,1\n\
                       44\n";
        let rows = parse_rows(content, ImportFormat::Csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].record_time, "2024-01-15 09:00:00");
        assert_eq!(rows[1].row, 4);
        assert_eq!(rows[1].device_user_id, "4\"3");
        assert_eq!(rows[1].verify_mode.as_deref(), Some("15"));
    }

    #[test]
    fn test_txt_whitespace_rejoins_date_and_time() {
        let rows = parse_rows("42  7  2024-01-15 09:00:00  1  1\r\n", ImportFormat::Txt);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_sn, "7");
        assert_eq!(rows[0].record_time, "2024-01-15 09:00:00");
        assert_eq!(rows[0].record_type.as_deref(), Some("1"));
        assert_eq!(rows[0].verify_mode.as_deref(), Some("1"));
    }

    #[test]
    fn test_txt_tabs() {
        let rows = parse_rows("42\t7\t15/01/2024 09:00\t2\t1", ImportFormat::Txt);
        assert_eq!(rows[0].record_time, "15/01/2024 09:00");
        assert_eq!(rows[0].record_type.as_deref(), Some("2"));
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(ImportFormat::from_filename("export.CSV"), Some(ImportFormat::Csv));
        assert_eq!(ImportFormat::from_filename("attlog.txt"), Some(ImportFormat::Txt));
        assert_eq!(ImportFormat::from_filename("photo.png"), None);
        assert!("xlsx".parse::<ImportFormat>().is_err());
    }
}
