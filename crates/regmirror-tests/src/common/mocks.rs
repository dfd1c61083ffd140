// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock link implementations.
//!
//! Both mocks share their state through `Arc`s, so a test keeps a clone
//! as a handle while the synchronizer owns the instance: the test mutates
//! the simulated register images between ticks and inspects the write
//! history afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use regmirror_core::{LinkError, MemoryArea, ModbusLink, PlcLink};

// =============================================================================
// MockPlcLink
// =============================================================================

/// A scripted PLC with failure injection and interaction recording.
#[derive(Clone, Default)]
pub struct MockPlcLink {
    /// Simulated register image, keyed by `(area, 1-based index)`.
    registers: Arc<Mutex<HashMap<(MemoryArea, u16), u16>>>,
    connected: Arc<AtomicBool>,
    fail_next_read: Arc<AtomicBool>,
    fail_next_write: Arc<AtomicBool>,
    read_count: Arc<AtomicU64>,
    write_count: Arc<AtomicU64>,
    /// Every written word as `(area, 1-based index, value)`.
    write_history: Arc<Mutex<Vec<(MemoryArea, u16, u16)>>>,
}

impl MockPlcLink {
    /// Creates an empty mock; unset registers read as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` after `connect` and before `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Seeds a block of registers starting at the 1-based `start`.
    pub fn set_block(&self, area: MemoryArea, start: u16, values: &[u16]) {
        let mut registers = self.registers.lock().unwrap();
        for (i, value) in values.iter().enumerate() {
            registers.insert((area, start + i as u16), *value);
        }
    }

    /// Returns one register (zero when never set).
    pub fn get(&self, area: MemoryArea, index: u16) -> u16 {
        *self.registers.lock().unwrap().get(&(area, index)).unwrap_or(&0)
    }

    /// Forces the next read to fail.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Forces the next write to fail.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Returns how many reads were issued.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Returns every written word, in order.
    pub fn write_history(&self) -> Vec<(MemoryArea, u16, u16)> {
        self.write_history.lock().unwrap().clone()
    }

    /// Returns how many write requests were issued.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlcLink for MockPlcLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn read_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, LinkError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(LinkError::read_failed(
                format!("%{}{}", area.tag(), start),
                "injected read failure",
            ));
        }

        let registers = self.registers.lock().unwrap();
        Ok((0..count)
            .map(|i| *registers.get(&(area, start + i)).unwrap_or(&0))
            .collect())
    }

    async fn write_registers(
        &mut self,
        area: MemoryArea,
        start: u16,
        values: &[u16],
    ) -> Result<(), LinkError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(LinkError::write_failed(
                format!("%{}{}", area.tag(), start),
                "injected write failure",
            ));
        }

        let mut registers = self.registers.lock().unwrap();
        let mut history = self.write_history.lock().unwrap();
        for (i, value) in values.iter().enumerate() {
            registers.insert((area, start + i as u16), *value);
            history.push((area, start + i as u16, *value));
        }
        Ok(())
    }
}

// =============================================================================
// MockModbusLink
// =============================================================================

/// A scripted Modbus image with failure injection and recording.
#[derive(Clone, Default)]
pub struct MockModbusLink {
    registers: Arc<Mutex<HashMap<u16, u16>>>,
    connected: Arc<AtomicBool>,
    fail_next_read: Arc<AtomicBool>,
    fail_next_write: Arc<AtomicBool>,
    read_count: Arc<AtomicU64>,
    /// Every written register as `(address, value)`.
    write_history: Arc<Mutex<Vec<(u16, u16)>>>,
}

impl MockModbusLink {
    /// Creates an empty mock; unset registers read as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` after `connect` and before `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Seeds a block of holding registers starting at `start`.
    pub fn set_block(&self, start: u16, values: &[u16]) {
        let mut registers = self.registers.lock().unwrap();
        for (i, value) in values.iter().enumerate() {
            registers.insert(start + i as u16, *value);
        }
    }

    /// Returns one holding register (zero when never set).
    pub fn get(&self, address: u16) -> u16 {
        *self.registers.lock().unwrap().get(&address).unwrap_or(&0)
    }

    /// Forces the next block read to fail.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Forces the next single-register write to fail.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Returns how many block reads were issued.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Returns every written register, in order.
    pub fn write_history(&self) -> Vec<(u16, u16)> {
        self.write_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModbusLink for MockModbusLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn read_holding_block(&mut self, start: u16, count: u16) -> Result<Vec<u16>, LinkError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(LinkError::read_failed(
                format!("hr:{start}"),
                "injected read failure",
            ));
        }

        let registers = self.registers.lock().unwrap();
        Ok((0..count)
            .map(|i| *registers.get(&(start + i)).unwrap_or(&0))
            .collect())
    }

    async fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), LinkError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(LinkError::write_failed(
                format!("hr:{address}"),
                "injected write failure",
            ));
        }

        self.registers.lock().unwrap().insert(address, value);
        self.write_history.lock().unwrap().push((address, value));
        Ok(())
    }
}
