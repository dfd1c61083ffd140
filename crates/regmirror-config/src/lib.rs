// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # regmirror-config
//!
//! Configuration for the regmirror daemon.
//!
//! The configuration is a declarative document (JSON by convention,
//! YAML/TOML by extension) naming the poll cadence, the Modbus endpoint,
//! and per-PLC register links:
//!
//! ```json
//! {
//!   "PollMs": 100,
//!   "DefaultSwapBytes": true,
//!   "Plcs": [
//!     {
//!       "Ip": "192.168.30.244",
//!       "Links": [
//!         { "Plc": "R01001", "Modbus": "400001", "Count": 16 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `Plc` references are `<area tag><1-based index>`; `Modbus` references
//! ≥ 400001 use the conventional 4xxxxx numbering. [`MirrorConfig::resolve`]
//! turns the document into the typed mappings the synchronizers consume.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader};
pub use schema::{LinkEntry, MirrorConfig, ModbusEndpoint, PlcEntry, ResolvedMirror, ResolvedPlc};
