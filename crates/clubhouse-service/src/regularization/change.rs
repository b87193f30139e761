//! Typed payloads of regularization requests.

use chrono::{DateTime, Utc};
use serde_json::Value;

use clubhouse_core::error::AppError;
use clubhouse_entity::attendance::{PunchStatus, PunchType, VerifyMethod};
use clubhouse_entity::regularization::RequestType;

use crate::attendance::{NewAttendanceLog, TimestampParser};

/// A validated change to apply on approval.
#[derive(Debug, Clone)]
pub enum RequestedChange {
    TimeChange { timestamp: DateTime<Utc> },
    StatusChange { status: PunchStatus },
    AddLog(NewAttendanceLog),
    DeleteLog,
}

fn text_field<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn require_field<'a>(data: &'a Value, field: &str, request_type: RequestType) -> Result<&'a str, AppError> {
    text_field(data, field).ok_or_else(|| {
        AppError::validation(format!(
            "requested_data.{field} is required for {request_type} requests"
        ))
    })
}

impl RequestedChange {
    /// Check `requested_data` against the shape required by `request_type`.
    pub fn parse(
        request_type: RequestType,
        data: &Value,
        timestamps: &TimestampParser,
    ) -> Result<Self, AppError> {
        if !data.is_object() {
            return Err(AppError::validation("requested_data must be a JSON object"));
        }
        match request_type {
            RequestType::TimeChange => {
                let raw = require_field(data, "timestamp", request_type)?;
                Ok(Self::TimeChange {
                    timestamp: timestamps.parse(raw)?,
                })
            }
            RequestType::StatusChange => {
                let status = require_field(data, "status", request_type)?.parse()?;
                Ok(Self::StatusChange { status })
            }
            RequestType::AddLog => {
                let staff_id = require_field(data, "staff_id", request_type)?;
                let machine_id = require_field(data, "machine_id", request_type)?;
                let punch_type = require_field(data, "punch_type", request_type)?;
                punch_type.parse::<PunchType>()?;
                let timestamp = require_field(data, "timestamp", request_type)?;
                timestamps.parse(timestamp)?;
                let method = text_field(data, "method");
                if let Some(method) = method {
                    method.parse::<VerifyMethod>()?;
                }
                Ok(Self::AddLog(NewAttendanceLog {
                    staff_id: Some(staff_id.to_string()),
                    machine_id: Some(machine_id.to_string()),
                    punch_type: Some(punch_type.to_string()),
                    timestamp: Some(timestamp.to_string()),
                    method: method.map(str::to_string),
                    remarks: text_field(data, "remarks").map(str::to_string),
                }))
            }
            RequestType::DeleteLog => Ok(Self::DeleteLog),
        }
    }
}
