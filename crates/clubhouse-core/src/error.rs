//! Unified application error types for Clubhouse.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The referenced machine, staff, log, request, or notification is absent or inactive.
    NotFound,
    /// A regularization request is no longer pending.
    AlreadyProcessed,
    /// The staff member is bound to a different machine.
    AlreadyAssigned,
    /// A uniqueness constraint would be violated.
    Conflict,
    /// The terminal could not be reached (timeout, refused, reset).
    DeviceUnreachable,
    /// The terminal answered with malformed or rejected data.
    Protocol,
    /// A punch timestamp could not be interpreted as a date.
    UnparsableTimestamp,
    /// Input validation failed.
    Validation,
    /// Authentication failed (missing or invalid bearer token).
    Authentication,
    /// The caller does not hold the required permission.
    Authorization,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyProcessed => write!(f, "ALREADY_PROCESSED"),
            Self::AlreadyAssigned => write!(f, "ALREADY_ASSIGNED"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::DeviceUnreachable => write!(f, "DEVICE_UNREACHABLE"),
            Self::Protocol => write!(f, "PROTOCOL_ERROR"),
            Self::UnparsableTimestamp => write!(f, "UNPARSABLE_TIMESTAMP"),
            Self::Validation => write!(f, "VALIDATION_ERROR"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// The unified application error used throughout Clubhouse.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an already-processed error.
    pub fn already_processed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyProcessed, message)
    }

    /// Create an already-assigned error.
    pub fn already_assigned(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyAssigned, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a device-unreachable error.
    pub fn device_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeviceUnreachable, message)
    }

    /// Create a device protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Create an unparsable-timestamp error.
    pub fn unparsable_timestamp(raw: &str) -> Self {
        Self::new(
            ErrorKind::UnparsableTimestamp,
            format!("Unparsable timestamp: '{raw}'"),
        )
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error came from the device layer.
    pub fn is_device_error(&self) -> bool {
        matches!(self.kind, ErrorKind::DeviceUnreachable | ErrorKind::Protocol)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_code() {
        let err = AppError::already_processed("Request already approved");
        assert_eq!(err.to_string(), "ALREADY_PROCESSED: Request already approved");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = AppError::from(io);
        assert!(std::error::Error::source(&err).is_some());
        let cloned = err.clone();
        assert!(cloned.source.is_none());
        assert_eq!(cloned.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_device_error_classification() {
        assert!(AppError::device_unreachable("timeout").is_device_error());
        assert!(AppError::protocol("bad frame").is_device_error());
        assert!(!AppError::not_found("missing").is_device_error());
    }
}
