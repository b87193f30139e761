//! Terminal inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use clubhouse_core::config::AppConfig;
use clubhouse_core::error::AppError;
use clubhouse_device::scan::{expand_targets, parse_ports};
use clubhouse_device::{DeviceEndpoint, DeviceGateway, ScanHit};

/// Arguments for machine commands
#[derive(Debug, Args)]
pub struct MachineArgs {
    /// Machine subcommand
    #[command(subcommand)]
    pub command: MachineCommand,
}

/// Machine subcommands
#[derive(Debug, Subcommand)]
pub enum MachineCommand {
    /// List registered machines
    List {
        /// Include deactivated machines
        #[arg(long)]
        all: bool,
    },
    /// Check whether a terminal answers at an address
    Probe {
        /// Terminal IPv4 address
        ip: String,
        /// Terminal port, defaults to the configured device port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Scan a /24 range for terminals
    Scan {
        /// First three octets, e.g. 192.168.1
        prefix: String,
        #[arg(long, default_value_t = 1)]
        start: u8,
        #[arg(long, default_value_t = 254)]
        end: u8,
        /// Comma separated ports, defaults to the configured device port
        #[arg(long)]
        ports: Option<String>,
    },
}

/// Machine display row for table output
#[derive(Debug, Serialize, Tabled)]
struct MachineRow {
    machine_id: String,
    name: String,
    address: String,
    location: String,
    status: String,
    active: bool,
    users: i32,
    logs: i32,
    last_seen: String,
}

/// Scan result row for table output
#[derive(Debug, Serialize, Tabled)]
struct ScanRow {
    address: String,
    native: bool,
    serial_number: String,
    users: String,
    records: String,
}

impl From<ScanHit> for ScanRow {
    fn from(hit: ScanHit) -> Self {
        let info = hit.info.as_ref();
        Self {
            address: hit.endpoint.to_string(),
            native: hit.native,
            serial_number: info
                .and_then(|i| i.serial_number.clone())
                .unwrap_or_else(|| "-".to_string()),
            users: info.map_or_else(|| "-".to_string(), |i| i.user_count.to_string()),
            records: info.map_or_else(|| "-".to_string(), |i| i.record_count.to_string()),
        }
    }
}

fn gateway(config: &AppConfig) -> DeviceGateway {
    DeviceGateway::new(clubhouse_api::device_connector(config), &config.device)
}

/// Execute machine commands
pub async fn execute(
    args: &MachineArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        MachineCommand::List { all } => {
            let state = clubhouse_api::build_state(config).await?;
            let machines = state.services.machines.list(*all).await?;
            let rows: Vec<MachineRow> = machines
                .into_iter()
                .map(|m| MachineRow {
                    address: format!("{}:{}", m.ip_address, m.port),
                    machine_id: m.machine_id,
                    name: m.name,
                    location: m.location.unwrap_or_default(),
                    status: m.status.to_string(),
                    active: m.is_active,
                    users: m.total_users,
                    logs: m.total_logs,
                    last_seen: m
                        .last_seen_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "never".to_string()),
                })
                .collect();
            output::print_list(&rows, format);
        }
        MachineCommand::Probe { ip, port } => {
            let gateway = gateway(&config);
            let endpoint = DeviceEndpoint::new(ip.clone(), port.unwrap_or(config.device.default_port));
            let (status, info) = gateway.check_status(&endpoint).await;
            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "endpoint": endpoint,
                    "status": status,
                    "info": info,
                })),
                OutputFormat::Table => {
                    if !status.is_online() {
                        output::print_warning(&format!("{endpoint} did not answer"));
                        return Ok(());
                    }
                    output::print_success(&format!("{endpoint} is online"));
                    if let Some(info) = info {
                        output::print_kv(
                            "Serial number",
                            info.serial_number.as_deref().unwrap_or("-"),
                        );
                        output::print_kv(
                            "Firmware",
                            info.firmware_version.as_deref().unwrap_or("-"),
                        );
                        output::print_kv(
                            "Users",
                            format!("{} / {}", info.user_count, info.user_capacity),
                        );
                        output::print_kv(
                            "Fingerprints",
                            format!("{} / {}", info.fingerprint_count, info.fingerprint_capacity),
                        );
                        output::print_kv(
                            "Records",
                            format!("{} / {}", info.record_count, info.record_capacity),
                        );
                    }
                }
            }
        }
        MachineCommand::Scan {
            prefix,
            start,
            end,
            ports,
        } => {
            let ports = match ports {
                Some(raw) => parse_ports(raw)?,
                None => vec![config.device.default_port],
            };
            let targets = expand_targets(prefix, *start, *end, &ports)?;
            println!("Scanning {} endpoints...", targets.len());
            let hits = gateway(&config).scan(targets).await;
            let rows: Vec<ScanRow> = hits.into_iter().map(ScanRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
