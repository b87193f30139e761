//! Timeout-bounded, always-closing operations against one terminal.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use clubhouse_core::config::DeviceConfig;

use crate::connector::{DeviceConnector, DeviceSession, SessionTimeouts};
use crate::error::DeviceError;
use crate::types::{DeviceEndpoint, DeviceInfo, DeviceRecord, DeviceStatus, DeviceUser, ScanHit};

/// Result of one user write in a bulk provisioning session.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub uid: u16,
    pub device_user_id: String,
    pub result: Result<(), DeviceError>,
}

/// Stateless front door to the terminals.
#[derive(Debug, Clone)]
pub struct DeviceGateway {
    connector: Arc<dyn DeviceConnector>,
    status_timeout: Duration,
    connect_timeout: Duration,
    read_timeout: Duration,
    scan_concurrency: usize,
    default_port: u16,
}

impl DeviceGateway {
    pub fn new(connector: Arc<dyn DeviceConnector>, config: &DeviceConfig) -> Self {
        Self {
            connector,
            status_timeout: Duration::from_millis(config.status_timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            scan_concurrency: config.scan_concurrency.max(1),
            default_port: config.default_port,
        }
    }

    /// Port used for machines registered without one.
    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            connect: self.connect_timeout,
            read: self.read_timeout,
        }
    }

    async fn bounded<T>(
        limit: Duration,
        what: String,
        fut: impl Future<Output = Result<T, DeviceError>>,
    ) -> Result<T, DeviceError> {
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeviceError::Timeout(what))?
    }

    async fn open(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn DeviceSession>, DeviceError> {
        Self::bounded(
            self.connect_timeout,
            format!("connect to {endpoint}"),
            self.connector.connect(endpoint, self.session_timeouts()),
        )
        .await
    }

    async fn finish(&self, endpoint: &DeviceEndpoint, mut session: Box<dyn DeviceSession>) {
        let closed = Self::bounded(
            self.status_timeout,
            format!("close {endpoint}"),
            session.close(),
        )
        .await;
        if let Err(e) = closed {
            warn!(endpoint = %endpoint, error = %e, "Failed to close device session");
        }
    }

    /// Binary reachability: native info first, then a TCP connect probe.
    pub async fn check_status(&self, endpoint: &DeviceEndpoint) -> (DeviceStatus, Option<DeviceInfo>) {
        match self.native_info(endpoint, self.status_timeout).await {
            Ok(info) => (DeviceStatus::Online, Some(info)),
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, "Native status check failed, probing TCP");
                if self.connector.probe(endpoint, self.status_timeout).await {
                    (DeviceStatus::Online, None)
                } else {
                    (DeviceStatus::Offline, None)
                }
            }
        }
    }

    async fn native_info(
        &self,
        endpoint: &DeviceEndpoint,
        limit: Duration,
    ) -> Result<DeviceInfo, DeviceError> {
        let mut session = Self::bounded(
            limit,
            format!("connect to {endpoint}"),
            self.connector.connect(
                endpoint,
                SessionTimeouts {
                    connect: limit,
                    read: limit,
                },
            ),
        )
        .await?;
        let info = Self::bounded(limit, format!("info from {endpoint}"), session.info()).await;
        self.finish(endpoint, session).await;
        info
    }

    /// Device identity and counters.
    pub async fn fetch_info(&self, endpoint: &DeviceEndpoint) -> Result<DeviceInfo, DeviceError> {
        let mut session = self.open(endpoint).await?;
        let result = Self::bounded(self.read_timeout, format!("info from {endpoint}"), session.info()).await;
        self.finish(endpoint, session).await;
        result
    }

    /// Every punch stored on the terminal.
    pub async fn fetch_punches(&self, endpoint: &DeviceEndpoint) -> Result<Vec<DeviceRecord>, DeviceError> {
        let mut session = self.open(endpoint).await?;
        let result = Self::bounded(
            self.read_timeout,
            format!("attendance from {endpoint}"),
            session.punches(),
        )
        .await;
        self.finish(endpoint, session).await;
        if let Ok(records) = &result {
            info!(endpoint = %endpoint, count = records.len(), "Fetched punches");
        }
        result
    }

    /// Every enrolled user.
    pub async fn fetch_users(&self, endpoint: &DeviceEndpoint) -> Result<Vec<DeviceUser>, DeviceError> {
        let mut session = self.open(endpoint).await?;
        let result = Self::bounded(self.read_timeout, format!("users from {endpoint}"), session.users()).await;
        self.finish(endpoint, session).await;
        result
    }

    /// Enroll one user slot.
    pub async fn provision_user(
        &self,
        endpoint: &DeviceEndpoint,
        uid: u16,
        device_user_id: &str,
        name: &str,
    ) -> Result<(), DeviceError> {
        let mut session = self.open(endpoint).await?;
        let result = Self::bounded(
            self.read_timeout,
            format!("provision on {endpoint}"),
            session.provision_user(uid, device_user_id, name),
        )
        .await;
        self.finish(endpoint, session).await;
        result
    }

    /// Enroll many user slots in one session. A connection failure fails
    /// every entry.
    pub async fn provision_users(
        &self,
        endpoint: &DeviceEndpoint,
        users: &[(u16, String, String)],
    ) -> Vec<ProvisionOutcome> {
        let mut session = match self.open(endpoint).await {
            Ok(session) => session,
            Err(e) => {
                return users
                    .iter()
                    .map(|(uid, device_user_id, _)| ProvisionOutcome {
                        uid: *uid,
                        device_user_id: device_user_id.clone(),
                        result: Err(e.clone()),
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(users.len());
        for (uid, device_user_id, name) in users {
            let result = Self::bounded(
                self.read_timeout,
                format!("provision on {endpoint}"),
                session.provision_user(*uid, device_user_id, name),
            )
            .await;
            outcomes.push(ProvisionOutcome {
                uid: *uid,
                device_user_id: device_user_id.clone(),
                result,
            });
        }
        self.finish(endpoint, session).await;
        outcomes
    }

    /// Remove one user slot.
    pub async fn deprovision_user(&self, endpoint: &DeviceEndpoint, uid: u16) -> Result<(), DeviceError> {
        let mut session = self.open(endpoint).await?;
        let result = Self::bounded(
            self.read_timeout,
            format!("deprovision on {endpoint}"),
            session.deprovision_user(uid),
        )
        .await;
        self.finish(endpoint, session).await;
        result
    }

    /// Probe endpoints concurrently; returns the responding ones sorted.
    pub async fn scan(&self, targets: Vec<DeviceEndpoint>) -> Vec<ScanHit> {
        info!(targets = targets.len(), concurrency = self.scan_concurrency, "Starting device scan");
        let mut hits: Vec<ScanHit> = stream::iter(targets)
            .map(|endpoint| async move {
                if !self.connector.probe(&endpoint, self.status_timeout).await {
                    return None;
                }
                let info = self.native_info(&endpoint, self.status_timeout).await.ok();
                Some(ScanHit {
                    native: info.is_some(),
                    endpoint,
                    info,
                })
            })
            .buffer_unordered(self.scan_concurrency)
            .filter_map(|hit| async move { hit })
            .collect()
            .await;
        hits.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        info!(found = hits.len(), "Device scan finished");
        hits
    }
}
