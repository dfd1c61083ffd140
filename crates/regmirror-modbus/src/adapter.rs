// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus/TCP adapter built on `tokio-modbus`.
//!
//! Block reads are split into chunks of at most [`MAX_READ_WORDS`] words
//! to stay under the protocol ceiling of 125 registers per request with
//! margin. Writes always use single-register requests: they are cheap on
//! the server and keep partial-change semantics simple.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_modbus::client::{Context as ModbusContext, Reader, Writer};
use tokio_modbus::prelude::*;
use tokio_modbus::{Error as TokioModbusError, ExceptionCode};
use tracing::{debug, info, warn};

use regmirror_core::{LinkError, ModbusLink};

use crate::error::{ModbusError, ModbusResult};
use crate::{DEFAULT_MODBUS_PORT, DEFAULT_UNIT_ID};

// =============================================================================
// Constants
// =============================================================================

/// Largest holding-register slice requested in one read.
pub const MAX_READ_WORDS: u16 = 120;

// =============================================================================
// ModbusConfig
// =============================================================================

/// Connection settings for the shared Modbus server.
#[derive(Debug, Clone)]
pub struct ModbusConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Slave (unit) identifier.
    pub unit_id: u8,
    /// Deadline for the TCP dial.
    pub connect_timeout: Duration,
    /// Deadline for one Modbus request.
    pub operation_timeout: Duration,
}

impl ModbusConfig {
    /// Creates a configuration with default port, unit id, and timeouts.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MODBUS_PORT,
            unit_id: DEFAULT_UNIT_ID,
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the slave (unit) identifier.
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Returns `host:port` for logging.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// chunk_plan
// =============================================================================

/// Splits a block read into `(start, count)` spans of at most
/// [`MAX_READ_WORDS`] words, in address order.
pub fn chunk_plan(start: u16, count: u16) -> Vec<(u16, u16)> {
    let mut spans = Vec::new();
    let mut offset = 0u16;
    while offset < count {
        let len = (count - offset).min(MAX_READ_WORDS);
        spans.push((start + offset, len));
        offset += len;
    }
    spans
}

// =============================================================================
// ModbusAdapter
// =============================================================================

/// Modbus master for one synchronizer.
///
/// Every synchronizer holds its own adapter with its own TCP connection;
/// the shared server serializes the register image.
pub struct ModbusAdapter {
    config: ModbusConfig,
    context: Option<ModbusContext>,
}

impl ModbusAdapter {
    /// Creates a disconnected adapter.
    pub fn new(config: ModbusConfig) -> Self {
        Self {
            config,
            context: None,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ModbusConfig {
        &self.config
    }

    /// Returns `true` while a connection is held.
    pub fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    /// Connects to the Modbus server. A no-op when already connected.
    pub async fn connect(&mut self) -> ModbusResult<()> {
        if self.context.is_some() {
            return Ok(());
        }

        let socket_addr = resolve_address(&self.config).await?;
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(socket_addr))
            .await
            .map_err(|_| {
                ModbusError::connect(
                    &self.config.host,
                    self.config.port,
                    format!("dial timed out after {:?}", self.config.connect_timeout),
                )
            })?
            .map_err(|e| ModbusError::connect(&self.config.host, self.config.port, e.to_string()))?;

        stream.set_nodelay(true).ok();
        self.context = Some(tcp::attach_slave(stream, Slave(self.config.unit_id)));

        info!(
            host = %self.config.host,
            port = self.config.port,
            unit_id = self.config.unit_id,
            "connected to Modbus server"
        );
        Ok(())
    }

    /// Closes the connection, best-effort.
    pub async fn disconnect(&mut self) {
        if let Some(mut ctx) = self.context.take() {
            if let Err(e) = ctx.disconnect().await {
                warn!(error = %e, "error disconnecting from Modbus server");
            }
            debug!(peer = %self.config.socket_addr(), "Modbus connection closed");
        }
    }

    /// Reads `count` holding registers starting at `start`, concatenating
    /// chunked requests in address order.
    pub async fn read_holding_block(&mut self, start: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let mut words = Vec::with_capacity(count as usize);
        for (chunk_start, chunk_count) in chunk_plan(start, count) {
            let chunk = self.read_chunk(chunk_start, chunk_count).await?;
            words.extend_from_slice(&chunk);
        }
        Ok(words)
    }

    /// Writes one holding register.
    pub async fn write_single_register(&mut self, address: u16, value: u16) -> ModbusResult<()> {
        let op_timeout = self.config.operation_timeout;
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        timeout(op_timeout, ctx.write_single_register(address, value))
            .await
            .map_err(|_| ModbusError::timeout("write_single_register", op_timeout))?
            .map_err(|e| map_transport_error("write_single_register", e))?
            .map_err(|e| ModbusError::exception("write_single_register", exception_code(&e)))?;

        Ok(())
    }

    async fn read_chunk(&mut self, start: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let op_timeout = self.config.operation_timeout;
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        let words = timeout(op_timeout, ctx.read_holding_registers(start, count))
            .await
            .map_err(|_| ModbusError::timeout("read_holding_registers", op_timeout))?
            .map_err(|e| map_transport_error("read_holding_registers", e))?
            .map_err(|e| ModbusError::exception("read_holding_registers", exception_code(&e)))?;

        Ok(words)
    }

}

async fn resolve_address(config: &ModbusConfig) -> ModbusResult<SocketAddr> {
    let addr_str = config.socket_addr();
    if let Ok(addr) = addr_str.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let mut addrs = tokio::net::lookup_host(&addr_str)
        .await
        .map_err(|e| ModbusError::connect(&config.host, config.port, e.to_string()))?;

    addrs.next().ok_or_else(|| {
        ModbusError::connect(
            &config.host,
            config.port,
            "hostname resolved to no addresses",
        )
    })
}

impl std::fmt::Debug for ModbusAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusAdapter")
            .field("peer", &self.config.socket_addr())
            .field("unit_id", &self.config.unit_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// Error mapping
// =============================================================================

fn map_transport_error(operation: &'static str, error: TokioModbusError) -> ModbusError {
    match error {
        TokioModbusError::Transport(io_error) => {
            ModbusError::transport(operation, io_error.to_string())
        }
        other => ModbusError::transport(operation, other.to_string()),
    }
}

fn exception_code(code: &ExceptionCode) -> u8 {
    match code {
        ExceptionCode::IllegalFunction => 0x01,
        ExceptionCode::IllegalDataAddress => 0x02,
        ExceptionCode::IllegalDataValue => 0x03,
        ExceptionCode::ServerDeviceFailure => 0x04,
        ExceptionCode::Acknowledge => 0x05,
        ExceptionCode::ServerDeviceBusy => 0x06,
        ExceptionCode::MemoryParityError => 0x08,
        ExceptionCode::GatewayPathUnavailable => 0x0A,
        ExceptionCode::GatewayTargetDevice => 0x0B,
        _ => 0xFF,
    }
}

// =============================================================================
// ModbusLink implementation
// =============================================================================

#[async_trait]
impl ModbusLink for ModbusAdapter {
    async fn connect(&mut self) -> Result<(), LinkError> {
        ModbusAdapter::connect(self).await.map_err(Into::into)
    }

    async fn disconnect(&mut self) {
        ModbusAdapter::disconnect(self).await;
    }

    async fn read_holding_block(&mut self, start: u16, count: u16) -> Result<Vec<u16>, LinkError> {
        ModbusAdapter::read_holding_block(self, start, count)
            .await
            .map_err(Into::into)
    }

    async fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), LinkError> {
        ModbusAdapter::write_single_register(self, address, value)
            .await
            .map_err(Into::into)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_plan_respects_the_ceiling() {
        assert_eq!(chunk_plan(0, 250), vec![(0, 120), (120, 120), (240, 10)]);
        assert_eq!(chunk_plan(10, 120), vec![(10, 120)]);
        assert_eq!(chunk_plan(7, 1), vec![(7, 1)]);
        assert_eq!(chunk_plan(0, 0), Vec::<(u16, u16)>::new());
    }

    #[test]
    fn chunk_plan_covers_every_address_once() {
        let spans = chunk_plan(100, 333);
        let mut next = 100u16;
        for (start, count) in &spans {
            assert_eq!(*start, next);
            assert!(*count >= 1 && *count <= MAX_READ_WORDS);
            next += count;
        }
        assert_eq!(next, 100 + 333);
    }

    #[test]
    fn config_defaults() {
        let config = ModbusConfig::new("10.0.0.5");
        assert_eq!(config.port, 502);
        assert_eq!(config.unit_id, 1);
        assert_eq!(config.socket_addr(), "10.0.0.5:502");
    }

    #[tokio::test]
    async fn operations_require_a_connection() {
        let mut adapter = ModbusAdapter::new(ModbusConfig::new("127.0.0.1"));
        assert!(!adapter.is_connected());

        let err = adapter.read_holding_block(0, 4).await.unwrap_err();
        assert!(matches!(err, ModbusError::NotConnected));

        let err = adapter.write_single_register(0, 1).await.unwrap_err();
        assert!(matches!(err, ModbusError::NotConnected));
    }
}
