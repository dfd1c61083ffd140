// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # regmirror-core
//!
//! Core abstractions for the regmirror register bridge.
//!
//! This crate provides the types and logic shared by all regmirror
//! components:
//!
//! - **Address**: PLC memory-area tags and register reference parsing
//! - **Mapping**: the immutable description of one mirrored block
//! - **Link**: the async traits the SRTP and Modbus crates implement
//! - **Error**: the unified link/mirror error hierarchy
//! - **Sync**: per-PLC change detection and the reconciliation loop
//! - **Shutdown**: cooperative cancellation shared across tasks
//!
//! The synchronizer is generic over the two link traits, so the wire
//! protocols stay in their own crates and tests can substitute mocks.
//!
//! ## Example
//!
//! ```rust,ignore
//! use regmirror_core::{RegisterSyncMapping, MemoryArea, Synchronizer};
//!
//! let mapping = RegisterSyncMapping {
//!     area: MemoryArea::R,
//!     plc_start: 1001,
//!     modbus_start: 0,
//!     count: 16,
//!     swap_bytes: true,
//! };
//!
//! let mut sync = Synchronizer::new("plc-01", plc, modbus, vec![mapping], poll, listener);
//! sync.reconcile().await?;
//! sync.run().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod address;
pub mod error;
pub mod mapping;

// =============================================================================
// Link & Synchronizer Modules
// =============================================================================

pub mod link;
pub mod shutdown;
pub mod sync;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use address::{AddressError, MemoryArea, ModbusRef, PlcRef};
pub use error::{LinkError, LinkSide, MirrorError};
pub use link::{ModbusLink, PlcLink};
pub use mapping::{swap_if, RegisterSyncMapping};
pub use shutdown::{ShutdownCoordinator, ShutdownListener};
pub use sync::{SyncArea, Synchronizer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
