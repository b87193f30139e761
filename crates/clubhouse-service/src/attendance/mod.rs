//! Attendance ingest, manual entry, queries and statistics.

pub mod ingest;
pub mod parser;
pub mod sample;
pub mod service;
pub mod timestamp;

pub use ingest::{ImportDetail, ImportReport, IngestService, RowStatus, SyncReport};
pub use parser::ImportFormat;
pub use service::{AttendanceService, AttendanceStats, MachineCount, NewAttendanceLog};
pub use timestamp::TimestampParser;
