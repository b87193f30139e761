//! # clubhouse-device
//!
//! Short-lived sessions to biometric terminals. The [`gateway::DeviceGateway`]
//! bounds every call with a timeout and always closes the session it opened.
//! Transports implement [`connector::DeviceConnector`]: [`zk`] speaks the
//! ZKTeco binary protocol over TCP, [`mock`] simulates terminals in memory.

pub mod connector;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod scan;
pub mod types;
pub mod zk;

pub use connector::{DeviceConnector, DeviceSession, SessionTimeouts};
pub use error::DeviceError;
pub use gateway::DeviceGateway;
pub use mock::{MockDeviceConnector, MockTerminal};
pub use types::{DeviceEndpoint, DeviceInfo, DeviceRecord, DeviceStatus, DeviceUser, ScanHit};
pub use zk::ZkConnector;
