//! Biometric terminal communication configuration.

use serde::{Deserialize, Serialize};

/// Transport used to talk to terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDriver {
    /// ZKTeco/ESSL binary protocol over TCP.
    Zk,
    /// In-memory simulated terminals (development only).
    Mock,
}

/// Terminal connection and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Transport driver.
    #[serde(default = "default_driver")]
    pub driver: DeviceDriver,
    /// Port assumed when a machine is registered without one.
    #[serde(default = "default_port")]
    pub default_port: u16,
    /// Upper bound for a status probe, in milliseconds.
    #[serde(default = "default_status_timeout")]
    pub status_timeout_ms: u64,
    /// Upper bound for opening a data session, in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Upper bound for a single data pull, in milliseconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Offset of terminal wall clocks from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Maximum concurrent probes during a network scan.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            default_port: default_port(),
            status_timeout_ms: default_status_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
            utc_offset_minutes: 0,
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

fn default_driver() -> DeviceDriver {
    DeviceDriver::Zk
}

fn default_port() -> u16 {
    4370
}

fn default_status_timeout() -> u64 {
    2000
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

fn default_scan_concurrency() -> usize {
    64
}
