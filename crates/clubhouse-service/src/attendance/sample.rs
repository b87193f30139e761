//! Example export files offered for download.

use super::parser::ImportFormat;

const SAMPLE_CSV: &str = "deviceUserId,userSn,recordTime,recordType,verifyMode
42,1,2024-01-15 09:00:00,1,1
42,2,2024-01-15 13:00:00,3,1
42,3,2024-01-15 13:45:00,4,1
42,4,2024-01-15 18:05:00,2,1
7,5,2024-01-15 08:55:12,1,2
";

const SAMPLE_TXT: &str = "42\t1\t2024-01-15 09:00:00\t1\t1
42\t2\t2024-01-15 13:00:00\t3\t1
42\t3\t2024-01-15 13:45:00\t4\t1
42\t4\t2024-01-15 18:05:00\t2\t1
7\t5\t2024-01-15 08:55:12\t1\t2
";

/// A literal example file in `format`.
pub fn sample(format: ImportFormat) -> &'static str {
    match format {
        ImportFormat::Csv => SAMPLE_CSV,
        ImportFormat::Txt => SAMPLE_TXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::parser::parse_rows;

    #[test]
    fn test_samples_parse_cleanly() {
        for format in [ImportFormat::Csv, ImportFormat::Txt] {
            let rows = parse_rows(sample(format), format);
            assert_eq!(rows.len(), 5);
            assert_eq!(rows[4].device_user_id, "7");
        }
    }
}
