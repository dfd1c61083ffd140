// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Async SRTP client.
//!
//! The client owns one TCP connection and a wrapping 16-bit sequence
//! counter. It is deliberately not re-entrant: the PLC handles one
//! outstanding request per session, so every operation takes `&mut self`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use regmirror_core::{LinkError, MemoryArea, PlcLink};

use crate::error::{SrtpError, SrtpResult};
use crate::frame::{self, FrameKind, HEADER_LEN};
use crate::DEFAULT_SRTP_PORT;

// =============================================================================
// SrtpConfig
// =============================================================================

/// Connection settings for one PLC.
#[derive(Debug, Clone)]
pub struct SrtpConfig {
    /// PLC host (dotted-quad or hostname).
    pub host: String,
    /// SRTP TCP port.
    pub port: u16,
    /// Deadline for the TCP dial.
    pub connect_timeout: Duration,
    /// Deadline for one request/response exchange (handshake included).
    pub operation_timeout: Duration,
}

impl SrtpConfig {
    /// Creates a configuration with default port and timeouts.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SRTP_PORT,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the SRTP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the TCP connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-operation deadline.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Returns `host:port` for logging.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// ClientState
// =============================================================================

/// Session state of an [`SrtpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No TCP connection.
    Disconnected,
    /// TCP dial or handshake in progress.
    Connecting,
    /// Handshake complete; requests may be issued.
    Ready,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// SrtpClient
// =============================================================================

/// SRTP client for one PLC.
pub struct SrtpClient {
    config: SrtpConfig,
    state: ClientState,
    stream: Option<TcpStream>,
    seq: u16,
}

impl SrtpClient {
    /// Creates a disconnected client.
    pub fn new(config: SrtpConfig) -> Self {
        Self {
            config,
            state: ClientState::Disconnected,
            stream: None,
            seq: 0,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SrtpConfig {
        &self.config
    }

    /// Returns the current session state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Opens the TCP connection and performs the two-phase handshake.
    ///
    /// A no-op when the session is already established.
    pub async fn connect(&mut self) -> SrtpResult<()> {
        if self.state == ClientState::Ready {
            return Ok(());
        }

        self.state = ClientState::Connecting;
        match self.establish().await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ClientState::Ready;
                info!(peer = %self.config.socket_addr(), "SRTP session established");
                Ok(())
            }
            Err(e) => {
                self.stream = None;
                self.state = ClientState::Disconnected;
                Err(e)
            }
        }
    }

    /// Sends the disconnect frame and closes the socket, best-effort.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // Courtesy notice; errors on the way out are irrelevant.
            let _ = timeout(Duration::from_millis(250), stream.write_all(&frame::NULL_FRAME)).await;
            let _ = stream.shutdown().await;
            debug!(peer = %self.config.socket_addr(), "SRTP session closed");
        }
        self.state = ClientState::Disconnected;
    }

    /// Reads `count` words starting at the 1-based index `start`.
    ///
    /// Interim ACK frames from the PLC are consumed and discarded; the
    /// call resolves with the words of the first data frame.
    pub async fn read_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        count: u16,
    ) -> SrtpResult<Vec<u16>> {
        let op_timeout = self.config.operation_timeout;
        let seq = self.next_seq();
        let stream = self.session()?;
        let request = frame::encode_read_request(seq, area, start, count);

        timeout(op_timeout, async {
            stream.write_all(&request).await.map_err(SrtpError::from_io)?;
            recv_data_words(stream, count).await
        })
        .await
        .map_err(|_| SrtpError::Timeout {
            duration: op_timeout,
        })?
    }

    /// Writes `values` starting at the 1-based index `start`.
    ///
    /// Succeeds iff the PLC answers with a completion (`0x03`) frame.
    pub async fn write_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        values: &[u16],
    ) -> SrtpResult<()> {
        let op_timeout = self.config.operation_timeout;
        let seq = self.next_seq();
        let stream = self.session()?;
        let request = frame::encode_write_request(seq, area, start, values);

        timeout(op_timeout, async {
            stream.write_all(&request).await.map_err(SrtpError::from_io)?;

            let mut reply = [0u8; HEADER_LEN];
            stream
                .read_exact(&mut reply)
                .await
                .map_err(SrtpError::from_io)?;
            match FrameKind::classify(reply[0]) {
                Some(FrameKind::Data) => Ok(()),
                _ => Err(SrtpError::UnexpectedFrame { kind: reply[0] }),
            }
        })
        .await
        .map_err(|_| SrtpError::Timeout {
            duration: op_timeout,
        })?
    }

    /// Advances the wrapping sequence counter. Incremented pre-send; the
    /// PLC does not enforce uniqueness across wraparound.
    fn next_seq(&mut self) -> u16 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    fn session(&mut self) -> SrtpResult<&mut TcpStream> {
        if self.state != ClientState::Ready {
            return Err(SrtpError::NotConnected);
        }
        self.stream.as_mut().ok_or(SrtpError::NotConnected)
    }

    async fn establish(&self) -> SrtpResult<TcpStream> {
        let mut stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await
        .map_err(|_| {
            SrtpError::connect(
                &self.config.host,
                self.config.port,
                format!("dial timed out after {:?}", self.config.connect_timeout),
            )
        })?
        .map_err(|e| SrtpError::connect(&self.config.host, self.config.port, e.to_string()))?;

        stream.set_nodelay(true).ok();

        timeout(self.config.operation_timeout, handshake(&mut stream))
            .await
            .map_err(|_| SrtpError::Timeout {
                duration: self.config.operation_timeout,
            })??;

        Ok(stream)
    }
}

impl fmt::Debug for SrtpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrtpClient")
            .field("peer", &self.config.socket_addr())
            .field("state", &self.state)
            .field("seq", &self.seq)
            .finish()
    }
}

// =============================================================================
// Wire helpers
// =============================================================================

/// Two fixed frames: 56 zero bytes (expect `0x01`), then the session
/// frame (expect `0x03`). Any other reply byte fails the phase.
async fn handshake(stream: &mut TcpStream) -> SrtpResult<()> {
    let mut reply = [0u8; HEADER_LEN];

    stream
        .write_all(&frame::NULL_FRAME)
        .await
        .map_err(SrtpError::from_io)?;
    stream
        .read_exact(&mut reply)
        .await
        .map_err(SrtpError::from_io)?;
    if FrameKind::classify(reply[0]) != Some(FrameKind::HandshakeAck) {
        return Err(SrtpError::handshake(1, 0x01, reply[0]));
    }

    stream
        .write_all(&frame::SESSION_FRAME)
        .await
        .map_err(SrtpError::from_io)?;
    stream
        .read_exact(&mut reply)
        .await
        .map_err(SrtpError::from_io)?;
    if FrameKind::classify(reply[0]) != Some(FrameKind::Data) {
        return Err(SrtpError::handshake(2, 0x03, reply[0]));
    }

    Ok(())
}

/// Accumulates response bytes until a full data frame is in hand.
///
/// Preliminary `0x01`/`0x02` frames reset the accumulator entirely; the
/// discipline is "restart accumulation until `0x03` appears".
async fn recv_data_words(stream: &mut TcpStream, count: u16) -> SrtpResult<Vec<u16>> {
    let expected = HEADER_LEN + count as usize * 2;
    let mut buf: Vec<u8> = Vec::with_capacity(expected);
    let mut chunk = [0u8; 512];

    loop {
        if buf.len() >= HEADER_LEN {
            match FrameKind::classify(buf[0]) {
                Some(FrameKind::Data) => {
                    if buf.len() >= expected {
                        return Ok(frame::decode_words(&buf[HEADER_LEN..expected]));
                    }
                }
                Some(FrameKind::HandshakeAck) | Some(FrameKind::Ack) => {
                    buf.clear();
                }
                None => {
                    return Err(SrtpError::UnexpectedFrame { kind: buf[0] });
                }
            }
        }

        let n = stream.read(&mut chunk).await.map_err(SrtpError::from_io)?;
        if n == 0 {
            if buf.len() >= HEADER_LEN && FrameKind::classify(buf[0]) == Some(FrameKind::Data) {
                return Err(SrtpError::Truncated {
                    expected,
                    actual: buf.len(),
                });
            }
            return Err(SrtpError::PeerClosed);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

// =============================================================================
// PlcLink implementation
// =============================================================================

#[async_trait]
impl PlcLink for SrtpClient {
    async fn connect(&mut self) -> Result<(), LinkError> {
        SrtpClient::connect(self).await.map_err(Into::into)
    }

    async fn disconnect(&mut self) {
        SrtpClient::disconnect(self).await;
    }

    async fn read_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, LinkError> {
        SrtpClient::read_registers(self, area, start, count)
            .await
            .map_err(Into::into)
    }

    async fn write_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        values: &[u16],
    ) -> Result<(), LinkError> {
        SrtpClient::write_registers(self, area, start, values)
            .await
            .map_err(Into::into)
    }
}

// =============================================================================
// Tests
// =============================================================================
