//! Attendance file import configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to offline attendance imports and bulk reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: usize,
    /// Maximum per-row entries returned in an import report.
    #[serde(default = "default_max_detail_rows")]
    pub max_detail_rows: usize,
    /// Maximum unmapped records listed in a sync report.
    #[serde(default = "default_max_skipped_logs")]
    pub max_skipped_logs: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_detail_rows: default_max_detail_rows(),
            max_skipped_logs: default_max_skipped_logs(),
        }
    }
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_detail_rows() -> usize {
    1000
}

fn default_max_skipped_logs() -> usize {
    500
}
