// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SRTP error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

use regmirror_core::LinkError;

/// A Result type with [`SrtpError`].
pub type SrtpResult<T> = Result<T, SrtpError>;

// =============================================================================
// SrtpError
// =============================================================================

/// Errors produced by the SRTP client.
#[derive(Debug, Error)]
pub enum SrtpError {
    /// The TCP dial failed.
    #[error("connection to {host}:{port} failed: {message}")]
    Connect {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Description of the failure.
        message: String,
    },

    /// The handshake produced an unexpected response byte.
    #[error("handshake phase {phase} failed: expected {expected:#04x}, got {got:#04x}")]
    HandshakeFailed {
        /// Handshake phase (1 or 2).
        phase: u8,
        /// The frame byte the phase requires.
        expected: u8,
        /// The byte actually received.
        got: u8,
    },

    /// An operation was attempted without an established session.
    #[error("no SRTP session established")]
    NotConnected,

    /// The socket returned zero bytes mid-frame.
    #[error("peer closed the connection mid-frame")]
    PeerClosed,

    /// The header announced data but the stream ended short of it.
    #[error("truncated data frame: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Total bytes the frame required.
        expected: usize,
        /// Bytes received before EOF.
        actual: usize,
    },

    /// The response type byte is not in the protocol.
    #[error("unrecognized response type {kind:#04x}")]
    UnexpectedFrame {
        /// The offending leading byte.
        kind: u8,
    },

    /// The operation did not complete within its deadline.
    #[error("SRTP operation timed out after {duration:?}")]
    Timeout {
        /// The elapsed deadline.
        duration: Duration,
    },

    /// Underlying socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SrtpError {
    /// Creates a connect error.
    pub fn connect(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Creates a handshake error.
    pub fn handshake(phase: u8, expected: u8, got: u8) -> Self {
        Self::HandshakeFailed {
            phase,
            expected,
            got,
        }
    }

    /// Maps a socket error, folding clean EOF into [`SrtpError::PeerClosed`].
    pub fn from_io(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Self::PeerClosed,
            _ => Self::Io(error),
        }
    }
}

// =============================================================================
// Conversion into the core link error
// =============================================================================

impl From<SrtpError> for LinkError {
    fn from(error: SrtpError) -> Self {
        match error {
            SrtpError::Connect { .. } | SrtpError::HandshakeFailed { .. } => {
                LinkError::connection_failed(error.to_string())
            }
            SrtpError::NotConnected => LinkError::NotConnected,
            SrtpError::Timeout { duration } => LinkError::timeout(duration),
            SrtpError::PeerClosed | SrtpError::Truncated { .. } | SrtpError::UnexpectedFrame { .. } => {
                LinkError::protocol(error.to_string())
            }
            SrtpError::Io(e) => LinkError::connection_failed(e.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
