//! Connector for ZK terminals over TCP.

use async_trait::async_trait;

use super::session::ZkSession;
use crate::connector::{DeviceConnector, DeviceSession, SessionTimeouts};
use crate::error::DeviceError;
use crate::types::DeviceEndpoint;

/// Opens [`ZkSession`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZkConnector;

impl ZkConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceConnector for ZkConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        timeouts: SessionTimeouts,
    ) -> Result<Box<dyn DeviceSession>, DeviceError> {
        let session = ZkSession::open(endpoint, timeouts).await?;
        Ok(Box::new(session))
    }
}
