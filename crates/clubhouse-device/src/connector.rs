//! Transport traits implemented by each terminal driver.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::DeviceError;
use crate::types::{DeviceEndpoint, DeviceInfo, DeviceRecord, DeviceUser};

/// Per-session I/O bounds.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

/// Opens sessions to terminals.
#[async_trait]
pub trait DeviceConnector: Send + Sync + std::fmt::Debug {
    /// Open a protocol session.
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        timeouts: SessionTimeouts,
    ) -> Result<Box<dyn DeviceSession>, DeviceError>;

    /// Connect-only reachability probe.
    async fn probe(&self, endpoint: &DeviceEndpoint, timeout: Duration) -> bool {
        let addr = endpoint.to_string();
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }
}

/// An open session to one terminal.
#[async_trait]
pub trait DeviceSession: Send {
    async fn info(&mut self) -> Result<DeviceInfo, DeviceError>;

    /// Every punch stored on the terminal.
    async fn punches(&mut self) -> Result<Vec<DeviceRecord>, DeviceError>;

    /// Every enrolled user.
    async fn users(&mut self) -> Result<Vec<DeviceUser>, DeviceError>;

    /// Enroll (or overwrite) a user slot.
    async fn provision_user(
        &mut self,
        uid: u16,
        device_user_id: &str,
        name: &str,
    ) -> Result<(), DeviceError>;

    /// Remove a user slot.
    async fn deprovision_user(&mut self, uid: u16) -> Result<(), DeviceError>;

    /// End the session.
    async fn close(&mut self) -> Result<(), DeviceError>;
}
