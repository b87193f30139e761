//! Device failure taxonomy.

use std::io;

use thiserror::Error;

use clubhouse_core::error::{AppError, ErrorKind};

/// Failure talking to a terminal.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// Connection refused, reset, or host unknown.
    #[error("Device unreachable: {0}")]
    Unreachable(String),
    /// The terminal did not answer within the allotted time.
    #[error("Device timed out: {0}")]
    Timeout(String),
    /// The terminal answered with malformed or rejected data.
    #[error("Device protocol error: {0}")]
    Protocol(String),
}

impl DeviceError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether the failure means the terminal could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout(_))
    }
}

impl From<io::Error> for DeviceError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout(err.to_string()),
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                Self::Protocol(err.to_string())
            }
            _ => Self::Unreachable(err.to_string()),
        }
    }
}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        let kind = if err.is_unreachable() {
            ErrorKind::DeviceUnreachable
        } else {
            ErrorKind::Protocol
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_app_error_kinds() {
        let timeout: AppError = DeviceError::Timeout("10.0.0.5:4370".into()).into();
        assert_eq!(timeout.kind, ErrorKind::DeviceUnreachable);
        let refused: AppError =
            DeviceError::from(io::Error::from(io::ErrorKind::ConnectionRefused)).into();
        assert_eq!(refused.kind, ErrorKind::DeviceUnreachable);
        let bad: AppError = DeviceError::protocol("bad magic").into();
        assert_eq!(bad.kind, ErrorKind::Protocol);
    }
}
