// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! PLC memory areas and register reference parsing.
//!
//! SRTP addresses registers by a 1-byte memory-area code plus a word
//! offset. Configuration files refer to the same registers with compact
//! string tokens:
//!
//! - `"R01001"`: area tag prefix + 1-based word index (leading zeros and
//!   a leading `%` are accepted, case-insensitive)
//! - `"400123"`: Modbus holding register; values >= 400001 use the
//!   conventional 4xxxxx numbering, smaller values are raw 0-based
//!   addresses

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// =============================================================================
// AddressError
// =============================================================================

/// Errors produced while parsing register references.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The memory-area tag is not in the SRTP code table.
    #[error("unknown memory area tag '{tag}'")]
    UnknownArea {
        /// The offending tag.
        tag: String,
    },

    /// The reference string is malformed.
    #[error("invalid register reference '{reference}': {reason}")]
    InvalidReference {
        /// The offending reference string.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl AddressError {
    /// Creates an unknown-area error.
    pub fn unknown_area(tag: impl Into<String>) -> Self {
        Self::UnknownArea { tag: tag.into() }
    }

    /// Creates an invalid-reference error.
    pub fn invalid(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// MemoryArea
// =============================================================================

/// SRTP memory-area selector.
///
/// Each area maps to the 1-byte code the PLC firmware expects in read and
/// write requests. `G`/`GA` and `S`/`SA` are aliases on the wire but are
/// kept distinct so configuration round-trips keep the tag that was
/// written.
///
/// Bit-oriented areas (`I`, `Q`, `M`, ...) are read as 16-bit words with
/// the same codec as the register areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MemoryArea {
    R,
    W,
    Ai,
    Aq,
    Q,
    I,
    M,
    T,
    G,
    Ga,
    Gb,
    Gc,
    Gd,
    Ge,
    S,
    Sa,
    Sb,
    Sc,
}

impl MemoryArea {
    /// Returns the wire code for this area.
    pub const fn code(self) -> u8 {
        match self {
            Self::R => 0x08,
            Self::W => 0x09,
            Self::Ai => 0x0A,
            Self::Aq => 0x0C,
            Self::Q => 0x12,
            Self::I => 0x10,
            Self::M => 0x16,
            Self::T => 0x14,
            Self::G | Self::Ga => 0x20,
            Self::Gb => 0x22,
            Self::Gc => 0x24,
            Self::Gd => 0x26,
            Self::Ge => 0x28,
            Self::S | Self::Sa => 0x30,
            Self::Sb => 0x32,
            Self::Sc => 0x34,
        }
    }

    /// Returns the canonical configuration tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::W => "W",
            Self::Ai => "AI",
            Self::Aq => "AQ",
            Self::Q => "Q",
            Self::I => "I",
            Self::M => "M",
            Self::T => "T",
            Self::G => "G",
            Self::Ga => "GA",
            Self::Gb => "GB",
            Self::Gc => "GC",
            Self::Gd => "GD",
            Self::Ge => "GE",
            Self::S => "S",
            Self::Sa => "SA",
            Self::Sb => "SB",
            Self::Sc => "SC",
        }
    }

    /// Looks up an area by tag, case-insensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "R" => Some(Self::R),
            "W" => Some(Self::W),
            "AI" => Some(Self::Ai),
            "AQ" => Some(Self::Aq),
            "Q" => Some(Self::Q),
            "I" => Some(Self::I),
            "M" => Some(Self::M),
            "T" => Some(Self::T),
            "G" => Some(Self::G),
            "GA" => Some(Self::Ga),
            "GB" => Some(Self::Gb),
            "GC" => Some(Self::Gc),
            "GD" => Some(Self::Gd),
            "GE" => Some(Self::Ge),
            "S" => Some(Self::S),
            "SA" => Some(Self::Sa),
            "SB" => Some(Self::Sb),
            "SC" => Some(Self::Sc),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.tag())
    }
}

impl FromStr for MemoryArea {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| AddressError::unknown_area(s.trim()))
    }
}

// =============================================================================
// PlcRef
// =============================================================================

/// A parsed PLC register reference, e.g. `"R01001"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlcRef {
    /// Memory area.
    pub area: MemoryArea,
    /// 1-based word index within the area.
    pub start: u16,
}

impl PlcRef {
    /// Parses a `<tag><digits>` reference.
    ///
    /// The tag is matched case-insensitively, surrounding whitespace and
    /// an optional leading `%` are stripped, and leading zeros in the
    /// index are allowed. The index is 1-based and must be ≥ 1.
    pub fn parse(reference: &str) -> Result<Self, AddressError> {
        let trimmed = reference.trim().trim_start_matches('%');
        let split = trimmed
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .ok_or_else(|| AddressError::invalid(reference, "missing register index"))?;

        let (tag, digits) = trimmed.split_at(split);
        if tag.is_empty() {
            return Err(AddressError::invalid(reference, "missing area tag"));
        }

        let area = MemoryArea::from_tag(tag).ok_or_else(|| AddressError::unknown_area(tag))?;
        let start: u16 = digits
            .parse()
            .map_err(|_| AddressError::invalid(reference, "register index out of range"))?;
        if start == 0 {
            return Err(AddressError::invalid(reference, "register index is 1-based"));
        }

        Ok(Self { area, start })
    }
}

impl FromStr for PlcRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}{:05}", self.area.tag(), self.start)
    }
}

// =============================================================================
// ModbusRef
// =============================================================================

/// A parsed Modbus holding-register reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusRef {
    /// 0-based holding-register address.
    pub address: u16,
}

impl ModbusRef {
    /// Parses a decimal holding-register reference.
    ///
    /// Values ≥ 400001 are interpreted in the conventional 4xxxxx
    /// numbering (400001 → address 0); smaller values are taken as raw
    /// 0-based addresses.
    pub fn parse(reference: &str) -> Result<Self, AddressError> {
        let raw: u32 = reference
            .trim()
            .parse()
            .map_err(|_| AddressError::invalid(reference, "expected a decimal register number"))?;

        let address = if raw >= 400_001 { raw - 400_001 } else { raw };
        let address = u16::try_from(address)
            .map_err(|_| AddressError::invalid(reference, "holding register address out of range"))?;

        Ok(Self { address })
    }
}

impl FromStr for ModbusRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Tests
// =============================================================================
