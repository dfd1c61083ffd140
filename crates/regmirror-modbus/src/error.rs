// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus adapter error types.

use std::time::Duration;

use thiserror::Error;

use regmirror_core::LinkError;

/// A Result type with [`ModbusError`].
pub type ModbusResult<T> = Result<T, ModbusError>;

// =============================================================================
// ModbusError
// =============================================================================

/// Errors produced by the Modbus adapter.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// The TCP dial or address resolution failed.
    #[error("connection to {host}:{port} failed: {message}")]
    Connect {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Description of the failure.
        message: String,
    },

    /// An operation was attempted without a connection.
    #[error("not connected to the Modbus server")]
    NotConnected,

    /// An operation did not complete within its deadline.
    #[error("Modbus {operation} timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The elapsed deadline.
        duration: Duration,
    },

    /// The server answered with a Modbus exception.
    #[error("Modbus exception {code:#04x} ({name}) during {operation}")]
    Exception {
        /// The operation that triggered the exception.
        operation: &'static str,
        /// Raw exception code.
        code: u8,
        /// Human-readable exception name.
        name: &'static str,
    },

    /// Transport-level failure reported by the client.
    #[error("Modbus transport error during {operation}: {message}")]
    Transport {
        /// The operation that failed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl ModbusError {
    /// Creates a connect error.
    pub fn connect(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: &'static str, duration: Duration) -> Self {
        Self::Timeout {
            operation,
            duration,
        }
    }

    /// Creates an exception error.
    pub fn exception(operation: &'static str, code: u8) -> Self {
        Self::Exception {
            operation,
            code,
            name: exception_name(code),
        }
    }

    /// Creates a transport error.
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }
}

/// Returns the standard name for a Modbus exception code.
pub fn exception_name(code: u8) -> &'static str {
    match code {
        0x01 => "Illegal Function",
        0x02 => "Illegal Data Address",
        0x03 => "Illegal Data Value",
        0x04 => "Server Device Failure",
        0x05 => "Acknowledge",
        0x06 => "Server Device Busy",
        0x08 => "Memory Parity Error",
        0x0A => "Gateway Path Unavailable",
        0x0B => "Gateway Target Device Failed to Respond",
        _ => "Unknown Exception",
    }
}

// =============================================================================
// Conversion into the core link error
// =============================================================================

impl From<ModbusError> for LinkError {
    fn from(error: ModbusError) -> Self {
        match error {
            ModbusError::Connect { .. } => LinkError::connection_failed(error.to_string()),
            ModbusError::NotConnected => LinkError::NotConnected,
            ModbusError::Timeout { duration, .. } => LinkError::timeout(duration),
            ModbusError::Exception { .. } => LinkError::protocol(error.to_string()),
            ModbusError::Transport { .. } => LinkError::connection_failed(error.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_names() {
        assert_eq!(exception_name(0x02), "Illegal Data Address");
        assert_eq!(exception_name(0x06), "Server Device Busy");
        assert_eq!(exception_name(0x7F), "Unknown Exception");
    }

    #[test]
    fn link_error_conversion() {
        assert!(matches!(
            LinkError::from(ModbusError::NotConnected),
            LinkError::NotConnected
        ));
        assert!(matches!(
            LinkError::from(ModbusError::exception("read_holding_registers", 0x02)),
            LinkError::Protocol { .. }
        ));
        assert!(matches!(
            LinkError::from(ModbusError::timeout(
                "write_single_register",
                Duration::from_secs(1)
            )),
            LinkError::Timeout { .. }
        ));
    }
}
