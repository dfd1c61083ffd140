// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract link layer between the synchronizer and the wire protocols.
//!
//! The synchronizer is generic over these two traits so the SRTP and
//! Modbus implementations live in their own crates and tests can inject
//! scripted mocks.

use async_trait::async_trait;

use crate::address::MemoryArea;
use crate::error::LinkError;

// =============================================================================
// PlcLink
// =============================================================================

/// The PLC side of the mirror.
///
/// Implementations are not re-entrant: the synchronizer issues at most
/// one request at a time, which is why every operation takes `&mut self`.
#[async_trait]
pub trait PlcLink: Send {
    /// Establishes the session (TCP connect plus protocol handshake).
    ///
    /// Calling this while already connected is a no-op.
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// Closes the session, best-effort. Must never fail loudly.
    async fn disconnect(&mut self);

    /// Reads `count` 16-bit words starting at the 1-based index `start`.
    ///
    /// The returned words are the wire-level values; no byte-order
    /// adjustment is applied.
    async fn read_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, LinkError>;

    /// Writes `values` starting at the 1-based index `start`.
    async fn write_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        values: &[u16],
    ) -> Result<(), LinkError>;
}

// =============================================================================
// ModbusLink
// =============================================================================

/// The Modbus side of the mirror.
///
/// Word values cross this boundary in the order the Modbus client
/// presents them; byte-order reconciliation is the synchronizer's job.
#[async_trait]
pub trait ModbusLink: Send {
    /// Connects to the Modbus server.
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// Closes the connection, best-effort.
    async fn disconnect(&mut self);

    /// Reads `count` holding registers starting at the 0-based `start`,
    /// chunking underlying requests as needed.
    async fn read_holding_block(&mut self, start: u16, count: u16) -> Result<Vec<u16>, LinkError>;

    /// Writes a single holding register.
    async fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), LinkError>;
}
