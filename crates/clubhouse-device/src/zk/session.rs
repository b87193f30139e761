//! A protocol session over one TCP connection.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use super::codec::ZkCodec;
use super::command::*;
use super::packet::Packet;
use super::record;
use crate::connector::{DeviceSession, SessionTimeouts};
use crate::error::DeviceError;
use crate::types::{DeviceEndpoint, DeviceInfo, DeviceRecord, DeviceUser};

/// Counter value used for the first request of a session.
const INITIAL_REPLY_ID: u16 = 65534;

/// Storage counters reported by `GET_FREE_SIZES`.
#[derive(Debug, Clone, Copy, Default)]
struct TableSizes {
    users: u32,
    fingers: u32,
    records: u32,
    cards: u32,
    finger_capacity: u32,
    user_capacity: u32,
    record_capacity: u32,
}

/// An authenticated session to a ZK terminal.
#[derive(Debug)]
pub struct ZkSession {
    framed: Framed<TcpStream, ZkCodec>,
    endpoint: DeviceEndpoint,
    session_id: u16,
    reply_id: u16,
    read_timeout: Duration,
    closed: bool,
}

impl ZkSession {
    /// Connect and perform the `CONNECT` handshake.
    pub async fn open(
        endpoint: &DeviceEndpoint,
        timeouts: SessionTimeouts,
    ) -> Result<Self, DeviceError> {
        let stream = tokio::time::timeout(timeouts.connect, TcpStream::connect(endpoint.to_string()))
            .await
            .map_err(|_| DeviceError::Timeout(format!("connect to {endpoint}")))?
            .map_err(|e| DeviceError::Unreachable(format!("{endpoint}: {e}")))?;
        let _ = stream.set_nodelay(true);

        let mut session = Self {
            framed: Framed::new(stream, ZkCodec),
            endpoint: endpoint.clone(),
            session_id: 0,
            reply_id: INITIAL_REPLY_ID,
            read_timeout: timeouts.read,
            closed: false,
        };

        let reply = session.exchange(CMD_CONNECT, Bytes::new()).await?;
        match reply.command {
            CMD_ACK_OK => {
                session.session_id = reply.session_id;
                debug!(endpoint = %endpoint, session_id = reply.session_id, "ZK session opened");
                Ok(session)
            }
            CMD_ACK_UNAUTH => Err(DeviceError::protocol(format!(
                "{endpoint} requires a communication key"
            ))),
            other => Err(DeviceError::protocol(format!(
                "{endpoint} rejected connect with reply {other}"
            ))),
        }
    }

    async fn send(&mut self, command: u16, data: Bytes) -> Result<(), DeviceError> {
        let packet = Packet::request(command, self.session_id, self.reply_id, data);
        self.reply_id = packet.reply_id;
        tokio::time::timeout(self.read_timeout, self.framed.send(packet))
            .await
            .map_err(|_| DeviceError::Timeout(format!("send to {}", self.endpoint)))?
    }

    async fn receive(&mut self) -> Result<Packet, DeviceError> {
        let packet = tokio::time::timeout(self.read_timeout, self.framed.next())
            .await
            .map_err(|_| DeviceError::Timeout(format!("read from {}", self.endpoint)))?
            .ok_or_else(|| DeviceError::Unreachable(format!("{} closed the connection", self.endpoint)))??;
        self.reply_id = packet.reply_id;
        Ok(packet)
    }

    /// Send one command and read its reply.
    async fn exchange(&mut self, command: u16, data: Bytes) -> Result<Packet, DeviceError> {
        self.send(command, data).await?;
        self.receive().await
    }

    /// Send a command that must be acknowledged.
    async fn command(&mut self, command: u16, data: Bytes) -> Result<Packet, DeviceError> {
        let reply = self.exchange(command, data).await?;
        if is_success(reply.command) {
            Ok(reply)
        } else {
            Err(DeviceError::protocol(format!(
                "{} answered command {command} with {}",
                self.endpoint, reply.command
            )))
        }
    }

    async fn sizes(&mut self) -> Result<TableSizes, DeviceError> {
        let reply = self.command(CMD_GET_FREE_SIZES, Bytes::new()).await?;
        let data = &reply.data;
        if data.len() < 80 {
            return Err(DeviceError::protocol(format!(
                "Free sizes reply too short: {} bytes",
                data.len()
            )));
        }
        let field = |i: usize| {
            let at = i * 4;
            i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]).max(0) as u32
        };
        Ok(TableSizes {
            users: field(4),
            fingers: field(6),
            records: field(8),
            cards: field(12),
            finger_capacity: field(14),
            user_capacity: field(15),
            record_capacity: field(16),
        })
    }

    /// Read an option string such as `~SerialNumber`. Best effort.
    async fn option(&mut self, name: &str) -> Result<Option<String>, DeviceError> {
        let mut data = BytesMut::from(name.as_bytes());
        data.put_u8(0);
        let reply = self.exchange(CMD_OPTIONS_RRQ, data.freeze()).await?;
        if reply.command != CMD_ACK_OK {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&reply.data);
        let value = text
            .split_once('=')
            .map(|(_, v)| v)
            .unwrap_or(&text)
            .trim_end_matches('\0')
            .trim()
            .to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    async fn firmware(&mut self) -> Result<Option<String>, DeviceError> {
        let reply = self.exchange(CMD_GET_VERSION, Bytes::new()).await?;
        if reply.command != CMD_ACK_OK {
            return Ok(None);
        }
        let version = String::from_utf8_lossy(&reply.data)
            .trim_end_matches('\0')
            .trim()
            .to_string();
        Ok((!version.is_empty()).then_some(version))
    }

    /// Read a whole table through the buffered transfer.
    async fn read_buffer(&mut self, table: u16, fct: u32) -> Result<Vec<u8>, DeviceError> {
        let mut request = BytesMut::with_capacity(11);
        request.put_u8(1);
        request.put_u16_le(table);
        request.put_u32_le(fct);
        request.put_u32_le(0);

        let reply = self.command(CMD_DATA_WRRQ, request.freeze()).await?;
        if reply.command == CMD_DATA {
            return Ok(reply.data.to_vec());
        }
        if reply.data.len() < 5 {
            return Err(DeviceError::protocol("Buffered read reply missing size"));
        }
        let size = u32::from_le_bytes([reply.data[1], reply.data[2], reply.data[3], reply.data[4]]);

        let mut buffer = Vec::with_capacity(size as usize);
        let mut start = 0u32;
        while start < size {
            let chunk = (size - start).min(MAX_CHUNK);
            let data = self.read_chunk(start, chunk).await?;
            buffer.extend_from_slice(&data);
            start += chunk;
        }

        if let Err(e) = self.command(CMD_FREE_DATA, Bytes::new()).await {
            warn!(endpoint = %self.endpoint, error = %e, "Failed to free device buffer");
        }
        Ok(buffer)
    }

    async fn read_chunk(&mut self, start: u32, size: u32) -> Result<Vec<u8>, DeviceError> {
        let mut request = BytesMut::with_capacity(8);
        request.put_u32_le(start);
        request.put_u32_le(size);
        let reply = self.exchange(CMD_DATA_RDY, request.freeze()).await?;

        match reply.command {
            CMD_DATA => Ok(reply.data.to_vec()),
            CMD_PREPARE_DATA => {
                let expected = reply
                    .data
                    .get(..4)
                    .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
                    .unwrap_or(size as usize);
                let mut chunk = Vec::with_capacity(expected);
                while chunk.len() < expected {
                    let packet = self.receive().await?;
                    match packet.command {
                        CMD_DATA => chunk.extend_from_slice(&packet.data),
                        CMD_ACK_OK => break,
                        other => {
                            return Err(DeviceError::protocol(format!(
                                "Unexpected reply {other} while reading chunk"
                            )));
                        }
                    }
                }
                // Terminal acknowledges the end of the chunk.
                let ack = self.receive().await?;
                if ack.command != CMD_ACK_OK {
                    debug!(endpoint = %self.endpoint, reply = ack.command, "Chunk not acknowledged");
                }
                Ok(chunk)
            }
            other => Err(DeviceError::protocol(format!(
                "Unexpected reply {other} to chunk request"
            ))),
        }
    }
}

#[async_trait]
impl DeviceSession for ZkSession {
    async fn info(&mut self) -> Result<DeviceInfo, DeviceError> {
        let sizes = self.sizes().await?;
        let serial_number = self.option("~SerialNumber").await?;
        let firmware_version = self.firmware().await?;
        Ok(DeviceInfo {
            serial_number,
            firmware_version,
            user_count: sizes.users,
            fingerprint_count: sizes.fingers,
            record_count: sizes.records,
            card_count: sizes.cards,
            user_capacity: sizes.user_capacity,
            fingerprint_capacity: sizes.finger_capacity,
            record_capacity: sizes.record_capacity,
        })
    }

    async fn punches(&mut self) -> Result<Vec<DeviceRecord>, DeviceError> {
        let sizes = self.sizes().await?;
        if sizes.records == 0 {
            return Ok(Vec::new());
        }
        // Terminal stops accepting punches while the table is streamed.
        self.command(CMD_DISABLE_DEVICE, Bytes::new()).await?;
        let buffer = self.read_buffer(CMD_ATTLOG_RRQ, 0).await;
        if let Err(e) = self.command(CMD_ENABLE_DEVICE, Bytes::new()).await {
            warn!(endpoint = %self.endpoint, error = %e, "Failed to re-enable device");
        }
        let buffer = buffer?;
        let body = record::table_body(&buffer)?;
        let width = record::record_width(
            body.len(),
            sizes.records,
            &[record::ATTENDANCE_RECORD_LEN, record::ATTENDANCE_RECORD_LEN_COMPACT],
        )
        .ok_or_else(|| DeviceError::protocol(format!("Attendance table of {} bytes", body.len())))?;
        let records = record::decode_attendance(body, width)?;
        debug!(endpoint = %self.endpoint, count = records.len(), "Read attendance table");
        Ok(records)
    }

    async fn users(&mut self) -> Result<Vec<DeviceUser>, DeviceError> {
        let sizes = self.sizes().await?;
        if sizes.users == 0 {
            return Ok(Vec::new());
        }
        let buffer = self.read_buffer(CMD_USERTEMP_RRQ, FCT_USER).await?;
        let body = record::table_body(&buffer)?;
        let width = record::record_width(
            body.len(),
            sizes.users,
            &[record::USER_RECORD_LEN, record::USER_RECORD_LEN_COMPACT],
        )
        .ok_or_else(|| DeviceError::protocol(format!("User table of {} bytes", body.len())))?;
        record::decode_users(body, width)
    }

    async fn provision_user(
        &mut self,
        uid: u16,
        device_user_id: &str,
        name: &str,
    ) -> Result<(), DeviceError> {
        self.command(CMD_USER_WRQ, record::encode_user(uid, device_user_id, name))
            .await?;
        self.command(CMD_REFRESH_DATA, Bytes::new()).await?;
        debug!(endpoint = %self.endpoint, uid, device_user_id, "Provisioned user");
        Ok(())
    }

    async fn deprovision_user(&mut self, uid: u16) -> Result<(), DeviceError> {
        self.command(CMD_DELETE_USER, Bytes::copy_from_slice(&uid.to_le_bytes()))
            .await?;
        self.command(CMD_REFRESH_DATA, Bytes::new()).await?;
        debug!(endpoint = %self.endpoint, uid, "Deprovisioned user");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.exchange(CMD_EXIT, Bytes::new()).await.map(|_| ());
        let _ = self.framed.close().await;
        result
    }
}
