// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for regmirror.
//!
//! # Schema structure
//!
//! ```text
//! MirrorConfig
//! ├── PollMs: u64
//! ├── DefaultSwapBytes: bool
//! ├── Modbus: ModbusEndpoint   (Ip / Port / UnitId)
//! └── Plcs: [PlcEntry]
//!     ├── Ip, SrtpPort
//!     └── Links: [LinkEntry]   (Plc / Modbus / Count / SwapBytes)
//! ```
//!
//! Field names follow the document's PascalCase convention; camelCase,
//! snake_case, and all-lowercase spellings are accepted as aliases (the
//! YAML pipeline normalizes keys to lowercase).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use regmirror_core::{ModbusRef, PlcRef, RegisterSyncMapping};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default SRTP TCP port.
pub const DEFAULT_SRTP_PORT: u16 = 18245;

/// Default Modbus/TCP port.
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// Default Modbus slave (unit) identifier.
pub const DEFAULT_UNIT_ID: u8 = 1;

// =============================================================================
// MirrorConfig
// =============================================================================

/// The root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MirrorConfig {
    /// Tick period in milliseconds.
    #[serde(alias = "pollMs", alias = "poll_ms", alias = "pollms")]
    pub poll_ms: u64,

    /// Fallback byte-order setting for links that omit `SwapBytes`.
    #[serde(
        default,
        alias = "defaultSwapBytes",
        alias = "default_swap_bytes",
        alias = "defaultswapbytes"
    )]
    pub default_swap_bytes: bool,

    /// The shared Modbus endpoint.
    ///
    /// The source hard-codes these as process constants; they are lifted
    /// into configuration with the same values as defaults.
    #[serde(default, alias = "modbus")]
    pub modbus: ModbusEndpoint,

    /// PLC connections and their register links.
    #[serde(default, alias = "plcs")]
    pub plcs: Vec<PlcEntry>,
}

impl MirrorConfig {
    /// Returns the tick period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    /// Validates the document without resolving it.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_ms == 0 {
            return Err(ConfigError::validation("PollMs", "must be at least 1"));
        }
        if self.modbus.ip.is_empty() {
            return Err(ConfigError::validation("Modbus.Ip", "cannot be empty"));
        }

        for (pi, plc) in self.plcs.iter().enumerate() {
            if plc.ip.is_empty() {
                return Err(ConfigError::validation(
                    format!("Plcs[{pi}].Ip"),
                    "cannot be empty",
                ));
            }
            for (li, link) in plc.links.iter().enumerate() {
                link.resolve(self.default_swap_bytes).map_err(|e| match e {
                    ConfigError::Validation { message, .. } => ConfigError::validation(
                        format!("Plcs[{pi}].Links[{li}]"),
                        message,
                    ),
                    other => other,
                })?;
            }
        }

        Ok(())
    }

    /// Resolves the document into the typed model the supervisor runs on.
    pub fn resolve(&self) -> ConfigResult<ResolvedMirror> {
        self.validate()?;

        let plcs = self
            .plcs
            .iter()
            .map(|plc| {
                let mappings = plc
                    .links
                    .iter()
                    .map(|link| link.resolve(self.default_swap_bytes))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(ResolvedPlc {
                    ip: plc.ip.clone(),
                    srtp_port: plc.srtp_port.unwrap_or(DEFAULT_SRTP_PORT),
                    mappings,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(ResolvedMirror {
            poll_interval: self.poll_interval(),
            modbus: self.modbus.clone(),
            plcs,
        })
    }
}

// =============================================================================
// ModbusEndpoint
// =============================================================================

/// The shared Modbus server address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModbusEndpoint {
    /// Server host.
    #[serde(default = "default_modbus_ip", alias = "ip")]
    pub ip: String,

    /// Server port.
    #[serde(default = "default_modbus_port", alias = "port")]
    pub port: u16,

    /// Slave (unit) identifier.
    #[serde(
        default = "default_unit_id",
        alias = "unitId",
        alias = "unit_id",
        alias = "unitid",
        alias = "SlaveId",
        alias = "slaveId",
        alias = "slave_id",
        alias = "slaveid"
    )]
    pub unit_id: u8,
}

fn default_modbus_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_modbus_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_unit_id() -> u8 {
    DEFAULT_UNIT_ID
}

impl Default for ModbusEndpoint {
    fn default() -> Self {
        Self {
            ip: default_modbus_ip(),
            port: DEFAULT_MODBUS_PORT,
            unit_id: DEFAULT_UNIT_ID,
        }
    }
}

// =============================================================================
// PlcEntry
// =============================================================================

/// One PLC connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlcEntry {
    /// PLC host (dotted-quad or hostname).
    #[serde(alias = "ip")]
    pub ip: String,

    /// SRTP port; defaults to 18245 when omitted.
    #[serde(default, alias = "srtpPort", alias = "srtp_port", alias = "srtpport")]
    pub srtp_port: Option<u16>,

    /// Mirrored register blocks.
    #[serde(default, alias = "links")]
    pub links: Vec<LinkEntry>,
}

// =============================================================================
// LinkEntry
// =============================================================================

/// One mirrored register block, as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkEntry {
    /// PLC reference, e.g. `"R01001"`.
    #[serde(alias = "plc")]
    pub plc: String,

    /// Modbus reference: 4xxxxx numbering when ≥ 400001, else 0-based.
    #[serde(alias = "modbus")]
    pub modbus: String,

    /// Number of 16-bit words.
    #[serde(alias = "count")]
    pub count: u16,

    /// Byte-order override; falls back to `DefaultSwapBytes`.
    #[serde(default, alias = "swapBytes", alias = "swap_bytes", alias = "swapbytes")]
    pub swap_bytes: Option<bool>,
}

impl LinkEntry {
    /// Resolves this entry into a typed mapping.
    pub fn resolve(&self, default_swap: bool) -> ConfigResult<RegisterSyncMapping> {
        if self.count == 0 {
            return Err(ConfigError::validation("Count", "must be at least 1"));
        }

        let plc_ref = PlcRef::parse(&self.plc)?;
        let modbus_ref = ModbusRef::parse(&self.modbus)?;

        // Both address spaces are 16-bit; the block must fit.
        if u32::from(plc_ref.start - 1) + u32::from(self.count) > 0x1_0000 {
            return Err(ConfigError::validation(
                "Count",
                format!("block runs past the end of the PLC area ({})", self.plc),
            ));
        }
        if u32::from(modbus_ref.address) + u32::from(self.count) > 0x1_0000 {
            return Err(ConfigError::validation(
                "Count",
                format!("block runs past the holding-register space ({})", self.modbus),
            ));
        }

        Ok(RegisterSyncMapping {
            area: plc_ref.area,
            plc_start: plc_ref.start,
            modbus_start: modbus_ref.address,
            count: self.count,
            swap_bytes: self.swap_bytes.unwrap_or(default_swap),
        })
    }
}

// =============================================================================
// Resolved model
// =============================================================================

/// The fully resolved configuration the supervisor runs on.
#[derive(Debug, Clone)]
pub struct ResolvedMirror {
    /// Tick period.
    pub poll_interval: Duration,
    /// The shared Modbus endpoint.
    pub modbus: ModbusEndpoint,
    /// One entry per PLC.
    pub plcs: Vec<ResolvedPlc>,
}

/// One PLC with its resolved mappings.
#[derive(Debug, Clone)]
pub struct ResolvedPlc {
    /// PLC host.
    pub ip: String,
    /// SRTP port.
    pub srtp_port: u16,
    /// Mirrored blocks, in document order.
    pub mappings: Vec<RegisterSyncMapping>,
}

impl ResolvedPlc {
    /// Returns `host:port` for logging and task naming.
    pub fn label(&self) -> String {
        format!("{}:{}", self.ip, self.srtp_port)
    }
}

// =============================================================================
// Tests
// =============================================================================
