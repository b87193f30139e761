//! ZKTeco/ESSL binary protocol over TCP.

pub mod codec;
pub mod command;
pub mod connector;
pub mod packet;
pub mod record;
pub mod session;
pub mod time;

pub use codec::ZkCodec;
pub use connector::ZkConnector;
pub use packet::Packet;
pub use session::ZkSession;
