//! Protocol command and reply codes.

pub const CMD_CONNECT: u16 = 1000;
pub const CMD_EXIT: u16 = 1001;
pub const CMD_ENABLE_DEVICE: u16 = 1002;
pub const CMD_DISABLE_DEVICE: u16 = 1003;
pub const CMD_REFRESH_DATA: u16 = 1013;
pub const CMD_GET_VERSION: u16 = 1100;

pub const CMD_USER_WRQ: u16 = 8;
pub const CMD_USERTEMP_RRQ: u16 = 9;
pub const CMD_OPTIONS_RRQ: u16 = 11;
pub const CMD_ATTLOG_RRQ: u16 = 13;
pub const CMD_DELETE_USER: u16 = 18;
pub const CMD_GET_FREE_SIZES: u16 = 50;

pub const CMD_PREPARE_DATA: u16 = 1500;
pub const CMD_DATA: u16 = 1501;
pub const CMD_FREE_DATA: u16 = 1502;
pub const CMD_DATA_WRRQ: u16 = 1503;
pub const CMD_DATA_RDY: u16 = 1504;

pub const CMD_ACK_OK: u16 = 2000;
pub const CMD_ACK_ERROR: u16 = 2001;
pub const CMD_ACK_DATA: u16 = 2002;
pub const CMD_ACK_UNAUTH: u16 = 2005;

/// Function selector for user table reads.
pub const FCT_USER: u32 = 5;

/// Largest chunk requested per `DATA_RDY` over TCP.
pub const MAX_CHUNK: u32 = 0xFFC0;

/// Replies that carry a successful outcome.
pub fn is_success(reply: u16) -> bool {
    matches!(reply, CMD_ACK_OK | CMD_PREPARE_DATA | CMD_DATA | CMD_ACK_DATA)
}
