//! Values exchanged with terminals.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Network address of a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub ip: String,
    pub port: u16,
}

impl DeviceEndpoint {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Terminal identity and storage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub user_count: u32,
    pub fingerprint_count: u32,
    pub record_count: u32,
    pub card_count: u32,
    pub user_capacity: u32,
    pub fingerprint_capacity: u32,
    pub record_capacity: u32,
}

/// One punch as stored on the terminal. `record_time` is terminal wall-clock
/// time without an offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub user_sn: u16,
    pub device_user_id: String,
    pub record_time: NaiveDateTime,
    pub record_type: u8,
    pub verify_mode: u8,
}

/// A user enrolled on the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUser {
    /// Internal slot number.
    pub uid: u16,
    /// Terminal-local user id printed on punches.
    pub user_id: String,
    pub name: String,
    pub privilege: u8,
    pub card: u32,
}

/// Outcome of a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// A responding endpoint found by a network scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanHit {
    pub endpoint: DeviceEndpoint,
    /// Whether the endpoint answered the terminal protocol, not just TCP.
    pub native: bool,
    pub info: Option<DeviceInfo>,
}
