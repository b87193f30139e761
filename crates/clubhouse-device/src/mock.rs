//! In-memory terminal simulator for development and testing.
//!
//! Simulates reachable and unreachable terminals without any hardware.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing;

use crate::connector::{DeviceConnector, DeviceSession, SessionTimeouts};
use crate::error::DeviceError;
use crate::types::{DeviceEndpoint, DeviceInfo, DeviceRecord, DeviceUser};

/// State of one simulated terminal.
#[derive(Debug, Clone)]
pub struct MockTerminal {
    pub info: DeviceInfo,
    pub punches: Vec<DeviceRecord>,
    pub users: BTreeMap<u16, DeviceUser>,
    /// Unreachable terminals refuse connections and probes.
    pub reachable: bool,
    /// Answer TCP probes but fail the protocol handshake.
    pub tcp_only: bool,
    /// Reject user writes with a protocol error.
    pub reject_writes: bool,
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self {
            info: DeviceInfo {
                serial_number: Some("MOCK0001".to_string()),
                firmware_version: Some("Ver 6.60 (mock)".to_string()),
                user_capacity: 3000,
                fingerprint_capacity: 3000,
                record_capacity: 100_000,
                ..DeviceInfo::default()
            },
            punches: Vec::new(),
            users: BTreeMap::new(),
            reachable: true,
            tcp_only: false,
            reject_writes: false,
        }
    }
}

impl MockTerminal {
    pub fn with_punches(mut self, punches: Vec<DeviceRecord>) -> Self {
        self.punches = punches;
        self
    }

    fn current_info(&self) -> DeviceInfo {
        DeviceInfo {
            user_count: self.users.len() as u32,
            record_count: self.punches.len() as u32,
            ..self.info.clone()
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    terminals: Mutex<HashMap<DeviceEndpoint, MockTerminal>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    connect_delay_ms: AtomicU64,
}

/// Connector serving [`MockTerminal`]s keyed by endpoint.
#[derive(Debug, Clone, Default)]
pub struct MockDeviceConnector {
    registry: Arc<Registry>,
}

impl MockDeviceConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a terminal.
    pub fn add_terminal(&self, endpoint: DeviceEndpoint, terminal: MockTerminal) {
        let mut terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        tracing::info!("[MockDevice] Registered terminal at {}", endpoint);
        terminals.insert(endpoint, terminal);
    }

    /// Toggle reachability of a registered terminal.
    pub fn set_reachable(&self, endpoint: &DeviceEndpoint, reachable: bool) {
        self.update(endpoint, |t| t.reachable = reachable);
    }

    /// Append a punch to a registered terminal.
    pub fn push_punch(&self, endpoint: &DeviceEndpoint, record: DeviceRecord) {
        self.update(endpoint, |t| t.punches.push(record));
    }

    /// Enrolled users of a terminal.
    pub fn users(&self, endpoint: &DeviceEndpoint) -> Vec<DeviceUser> {
        let terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        terminals
            .get(endpoint)
            .map(|t| t.users.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Hold every handshake for `delay` before answering.
    pub fn set_connect_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.registry.connect_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of sessions opened so far.
    pub fn connect_count(&self) -> usize {
        self.registry.connects.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far.
    pub fn close_count(&self) -> usize {
        self.registry.closes.load(Ordering::SeqCst)
    }

    fn update(&self, endpoint: &DeviceEndpoint, f: impl FnOnce(&mut MockTerminal)) {
        let mut terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(terminal) = terminals.get_mut(endpoint) {
            f(terminal);
        }
    }
}

#[async_trait]
impl DeviceConnector for MockDeviceConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        _timeouts: SessionTimeouts,
    ) -> Result<Box<dyn DeviceSession>, DeviceError> {
        let delay = self.registry.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        match terminals.get(endpoint) {
            Some(t) if t.reachable && !t.tcp_only => {
                self.registry.connects.fetch_add(1, Ordering::SeqCst);
                tracing::debug!("[MockDevice] Session opened to {}", endpoint);
                Ok(Box::new(MockSession {
                    registry: Arc::clone(&self.registry),
                    endpoint: endpoint.clone(),
                    closed: false,
                }))
            }
            Some(t) if t.reachable => Err(DeviceError::protocol(format!(
                "{endpoint} did not answer the handshake"
            ))),
            _ => {
                tracing::debug!("[MockDevice] Connection to {} refused", endpoint);
                Err(DeviceError::Unreachable(format!("{endpoint}: connection refused")))
            }
        }
    }

    async fn probe(&self, endpoint: &DeviceEndpoint, _timeout: Duration) -> bool {
        let terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        terminals.get(endpoint).is_some_and(|t| t.reachable)
    }
}

/// Session against a [`MockTerminal`].
#[derive(Debug)]
struct MockSession {
    registry: Arc<Registry>,
    endpoint: DeviceEndpoint,
    closed: bool,
}

impl MockSession {
    fn with_terminal<T>(
        &self,
        f: impl FnOnce(&mut MockTerminal) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let mut terminals = self.registry.terminals.lock().unwrap_or_else(|e| e.into_inner());
        match terminals.get_mut(&self.endpoint) {
            Some(t) if t.reachable => f(t),
            _ => Err(DeviceError::Unreachable(format!(
                "{}: connection reset",
                self.endpoint
            ))),
        }
    }
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn info(&mut self) -> Result<DeviceInfo, DeviceError> {
        self.with_terminal(|t| Ok(t.current_info()))
    }

    async fn punches(&mut self) -> Result<Vec<DeviceRecord>, DeviceError> {
        self.with_terminal(|t| Ok(t.punches.clone()))
    }

    async fn users(&mut self) -> Result<Vec<DeviceUser>, DeviceError> {
        self.with_terminal(|t| Ok(t.users.values().cloned().collect()))
    }

    async fn provision_user(
        &mut self,
        uid: u16,
        device_user_id: &str,
        name: &str,
    ) -> Result<(), DeviceError> {
        let endpoint = self.endpoint.clone();
        self.with_terminal(|t| {
            if t.reject_writes {
                return Err(DeviceError::protocol("user write rejected"));
            }
            t.users.insert(
                uid,
                DeviceUser {
                    uid,
                    user_id: device_user_id.to_string(),
                    name: name.to_string(),
                    privilege: 0,
                    card: 0,
                },
            );
            tracing::info!("[MockDevice] Provisioned uid {} on {}", uid, endpoint);
            Ok(())
        })
    }

    async fn deprovision_user(&mut self, uid: u16) -> Result<(), DeviceError> {
        self.with_terminal(|t| {
            if t.reject_writes {
                return Err(DeviceError::protocol("user delete rejected"));
            }
            t.users.remove(&uid);
            Ok(())
        })
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        if !self.closed {
            self.closed = true;
            self.registry.closes.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("[MockDevice] Session to {} closed", self.endpoint);
        }
        Ok(())
    }
}
