//! Punch classification enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use clubhouse_core::AppError;

/// Direction of a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "punch_type")]
pub enum PunchType {
    #[serde(rename = "check-in")]
    #[sqlx(rename = "check-in")]
    CheckIn,
    #[serde(rename = "check-out")]
    #[sqlx(rename = "check-out")]
    CheckOut,
    #[serde(rename = "break-start")]
    #[sqlx(rename = "break-start")]
    BreakStart,
    #[serde(rename = "break-end")]
    #[sqlx(rename = "break-end")]
    BreakEnd,
}

impl PunchType {
    /// Map a terminal `recordType` code. Unknown codes are treated as check-in.
    pub fn from_record_type(code: i64) -> Self {
        match code {
            2 => Self::CheckOut,
            3 => Self::BreakStart,
            4 => Self::BreakEnd,
            _ => Self::CheckIn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckIn => "check-in",
            Self::CheckOut => "check-out",
            Self::BreakStart => "break-start",
            Self::BreakEnd => "break-end",
        }
    }
}

impl fmt::Display for PunchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PunchType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "check-in" => Ok(Self::CheckIn),
            "check-out" => Ok(Self::CheckOut),
            "break-start" => Ok(Self::BreakStart),
            "break-end" => Ok(Self::BreakEnd),
            _ => Err(AppError::validation(format!(
                "Invalid punch type: '{s}'. Expected one of: check-in, check-out, break-start, break-end"
            ))),
        }
    }
}

/// How the punch was verified by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verify_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerifyMethod {
    Fingerprint,
    Card,
    Password,
    Face,
}

impl VerifyMethod {
    /// Map a terminal `verifyMode` code. Unknown codes are treated as fingerprint.
    pub fn from_verify_mode(code: i64) -> Self {
        match code {
            2 | 4 => Self::Card,
            0 | 3 => Self::Password,
            15 => Self::Face,
            _ => Self::Fingerprint,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fingerprint => "fingerprint",
            Self::Card => "card",
            Self::Password => "password",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for VerifyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerifyMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fingerprint" => Ok(Self::Fingerprint),
            "card" => Ok(Self::Card),
            "password" => Ok(Self::Password),
            "face" => Ok(Self::Face),
            _ => Err(AppError::validation(format!(
                "Invalid verify method: '{s}'. Expected one of: fingerprint, card, password, face"
            ))),
        }
    }
}

/// Outcome recorded against a persisted punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "punch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PunchStatus {
    Success,
    Failed,
    Duplicate,
}

impl PunchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for PunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PunchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "duplicate" => Ok(Self::Duplicate),
            _ => Err(AppError::validation(format!(
                "Invalid punch status: '{s}'. Expected one of: success, failed, duplicate"
            ))),
        }
    }
}
