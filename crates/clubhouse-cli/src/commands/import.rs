//! Attendance export file import commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use clubhouse_core::config::AppConfig;
use clubhouse_core::error::AppError;
use clubhouse_service::attendance::{ImportDetail, ImportFormat, ImportReport};

/// Arguments for import commands
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Import subcommand
    #[command(subcommand)]
    pub command: ImportCommand,
}

/// Options shared by every import subcommand
#[derive(Debug, Args)]
pub struct ImportFile {
    /// Export file to read
    pub file: PathBuf,
    /// Machine the punches are attributed to
    #[arg(short, long)]
    pub machine: String,
    /// File format, inferred from the extension when omitted
    #[arg(long)]
    pub file_format: Option<String>,
}

/// Import subcommands
#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Classify every row without writing anything
    Validate(ImportFile),
    /// Import the file, storing every successful row
    Commit(ImportFile),
}

/// Import detail row for table output
#[derive(Debug, Serialize, Tabled)]
struct DetailRow {
    row: usize,
    device_user_id: String,
    staff: String,
    record_time: String,
    status: String,
    message: String,
}

impl From<&ImportDetail> for DetailRow {
    fn from(detail: &ImportDetail) -> Self {
        Self {
            row: detail.row,
            device_user_id: detail.device_user_id.clone(),
            staff: match (&detail.staff_id, &detail.staff_name) {
                (Some(id), Some(name)) => format!("{id} ({name})"),
                (Some(id), None) => id.clone(),
                _ => "-".to_string(),
            },
            record_time: detail.record_time.clone(),
            status: format!("{:?}", detail.status).to_lowercase(),
            message: detail.message.clone().unwrap_or_default(),
        }
    }
}

/// Read an export file and settle its format.
///
/// An explicit format wins over the file extension.
pub fn read_import_file(
    path: &Path,
    format: Option<&str>,
) -> Result<(String, ImportFormat), AppError> {
    let format = match format {
        Some(raw) => raw.parse()?,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ImportFormat::from_filename)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Cannot infer the format of '{}'. Pass --file-format csv or txt",
                    path.display()
                ))
            })?,
    };
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8(bytes)
        .map_err(|_| AppError::validation("Import file must be UTF-8 text"))?;
    Ok((content, format))
}

fn print_report(report: &ImportReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }
    println!();
    output::print_kv("Machine", &report.machine_id);
    output::print_kv("Format", report.format);
    output::print_kv("Rows", report.total_rows);
    output::print_kv(
        if report.dry_run { "Would import" } else { "Imported" },
        report.imported_count,
    );
    output::print_kv("Duplicates", report.duplicate_count);
    output::print_kv("Errors", report.error_count);
    output::print_kv("Unmapped", report.unmapped_count);
    if !report.unmapped_users.is_empty() {
        output::print_kv("Unmapped users", report.unmapped_users.join(", "));
    }
    println!();
    let rows: Vec<DetailRow> = report.import_details.iter().map(DetailRow::from).collect();
    output::print_list(&rows, format);
    if report.details_truncated {
        output::print_warning("Row details truncated");
    }
}

/// Execute import commands
pub async fn execute(
    args: &ImportArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (file, dry_run) = match &args.command {
        ImportCommand::Validate(file) => (file, true),
        ImportCommand::Commit(file) => (file, false),
    };
    let (content, file_format) = read_import_file(&file.file, file.file_format.as_deref())?;

    let state = clubhouse_api::build_state(config).await?;
    let ingest = &state.services.ingest;
    let report = if dry_run {
        ingest.validate_file(&file.machine, &content, file_format).await?
    } else {
        ingest.import_file(&file.machine, &content, file_format).await?
    };

    print_report(&report, format);
    if !dry_run && report.imported_count > 0 {
        output::print_success(&format!("Imported {} logs", report.imported_count));
    }
    Ok(())
}
