// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for regmirror.
//!
//! Protocol crates define their own rich error types and convert them
//! into [`LinkError`] at the trait boundary, so the synchronizer and the
//! supervisor only ever deal with one shape:
//!
//! ```text
//! MirrorError (root)
//! ├── Link       - a PLC or Modbus operation failed
//! └── Cancelled  - cooperative shutdown, consumed by the supervisor
//! ```
//!
//! Errors are not recovered locally: a failed read or write aborts the
//! current tick and propagates to the owning task.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// LinkError
// =============================================================================

/// Driver-level error common to both wire protocols.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Connecting (TCP dial or protocol handshake) failed.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        /// Description of the failure.
        message: String,
    },

    /// An operation was attempted without an established session.
    #[error("not connected")]
    NotConnected,

    /// An operation did not complete within its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The elapsed deadline.
        duration: Duration,
    },

    /// The peer violated the wire protocol.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },

    /// A read operation failed.
    #[error("read failed at {address}: {message}")]
    ReadFailed {
        /// Address the read targeted.
        address: String,
        /// Description of the failure.
        message: String,
    },

    /// A write operation failed.
    #[error("write failed at {address}: {message}")]
    WriteFailed {
        /// Address the write targeted.
        address: String,
        /// Description of the failure.
        message: String,
    },
}

impl LinkError {
    /// Creates a connection-failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a read-failed error.
    pub fn read_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a write-failed error.
    pub fn write_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if a retry could plausibly succeed.
    ///
    /// The synchronizer never retries within a tick; this hint exists for
    /// a supervising layer that chooses to restart a failed task.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected | Self::Timeout { .. } => true,
            Self::ReadFailed { .. } | Self::WriteFailed { .. } => true,
            Self::Protocol { .. } => false,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Protocol { .. } => "protocol",
            Self::ReadFailed { .. } => "read",
            Self::WriteFailed { .. } => "write",
        }
    }
}

// =============================================================================
// LinkSide
// =============================================================================

/// Which side of the mirror an error originated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    /// The SRTP (PLC) side.
    Plc,
    /// The Modbus side.
    Modbus,
}

impl std::fmt::Display for LinkSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plc => write!(f, "PLC"),
            Self::Modbus => write!(f, "Modbus"),
        }
    }
}

// =============================================================================
// MirrorError
// =============================================================================

/// The root error type for a synchronizer task.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A link operation failed; the tick was aborted.
    #[error("{side} link error: {source}")]
    Link {
        /// The side that failed.
        side: LinkSide,
        /// The underlying failure.
        #[source]
        source: LinkError,
    },

    /// Cooperative cancellation. Not a failure; the supervisor swallows it.
    #[error("cancelled")]
    Cancelled,
}

impl MirrorError {
    /// Wraps a PLC-side link error.
    pub fn plc(source: LinkError) -> Self {
        Self::Link {
            side: LinkSide::Plc,
            source,
        }
    }

    /// Wraps a Modbus-side link error.
    pub fn modbus(source: LinkError) -> Self {
        Self::Link {
            side: LinkSide::Modbus,
            source,
        }
    }

    /// Returns `true` for cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_hints() {
        assert!(LinkError::NotConnected.is_retryable());
        assert!(LinkError::timeout(Duration::from_secs(1)).is_retryable());
        assert!(!LinkError::protocol("bad frame").is_retryable());
    }

    #[test]
    fn mirror_error_display_names_the_side() {
        let err = MirrorError::plc(LinkError::NotConnected);
        assert!(err.to_string().starts_with("PLC link error"));

        let err = MirrorError::modbus(LinkError::protocol("exception 2"));
        assert!(err.to_string().starts_with("Modbus link error"));
    }

    #[test]
    fn cancellation_is_not_a_failure() {
        assert!(MirrorError::Cancelled.is_cancelled());
        assert!(!MirrorError::plc(LinkError::NotConnected).is_cancelled());
    }
}
