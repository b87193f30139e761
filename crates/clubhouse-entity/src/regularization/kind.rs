//! Regularization request type and status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use clubhouse_core::AppError;

/// The change a regularization request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "regularization_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Overwrite the punch timestamp.
    TimeChange,
    /// Overwrite the punch status.
    StatusChange,
    /// Create a new punch.
    AddLog,
    /// Soft-delete the punch.
    DeleteLog,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeChange => "time_change",
            Self::StatusChange => "status_change",
            Self::AddLog => "add_log",
            Self::DeleteLog => "delete_log",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_change" => Ok(Self::TimeChange),
            "status_change" => Ok(Self::StatusChange),
            "add_log" => Ok(Self::AddLog),
            "delete_log" => Ok(Self::DeleteLog),
            _ => Err(AppError::validation(format!(
                "Invalid request type: '{s}'. Expected one of: time_change, status_change, add_log, delete_log"
            ))),
        }
    }
}

/// Lifecycle state of a regularization request.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "regularization_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegularizationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegularizationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegularizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegularizationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::validation(format!(
                "Invalid regularization status: '{s}'. Expected one of: pending, approved, rejected"
            ))),
        }
    }
}
