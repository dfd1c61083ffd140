// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # regmirror-srtp
//!
//! GE/Emerson SRTP client for regmirror.
//!
//! SRTP (Service Request Transfer Protocol) is the proprietary TCP
//! protocol spoken by PACSystems / Series 90 PLCs, typically on port
//! 18245. It is undocumented at public level; the constant header fields
//! reproduced in [`frame`] are empirically required by the PLC firmware
//! and must match bit-exact.
//!
//! This crate provides:
//!
//! - **frame**: encoders for the fixed 56-byte request headers, the
//!   handshake frames, and response classification
//! - **client**: [`SrtpClient`], an async TCP client implementing the
//!   [`regmirror_core::PlcLink`] seam
//! - **error**: [`SrtpError`] with conversion into the core `LinkError`

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod frame;

pub use client::{ClientState, SrtpClient, SrtpConfig};
pub use error::{SrtpError, SrtpResult};
pub use frame::{FrameKind, HEADER_LEN};

/// Default SRTP TCP port.
pub const DEFAULT_SRTP_PORT: u16 = 18245;
