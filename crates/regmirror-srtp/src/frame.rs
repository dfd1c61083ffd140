// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SRTP frame construction and classification.
//!
//! Every request carries a fixed-layout 56-byte header; write requests
//! append a little-endian word payload. The constant fields below are
//! reproduced from captured firmware exchanges and are required verbatim.
//! Frames are built as fixed-offset writes into flat buffers rather than
//! nested records, which is how the layout is naturally described.

use regmirror_core::MemoryArea;

// =============================================================================
// Constants
// =============================================================================

/// Length of every SRTP header, in bytes.
pub const HEADER_LEN: usize = 56;

/// The all-zero frame.
///
/// Sent as handshake phase 1 and again as the graceful-disconnect
/// notice before closing the socket.
pub const NULL_FRAME: [u8; HEADER_LEN] = [0; HEADER_LEN];

/// Handshake phase-2 session frame, transmitted verbatim.
///
/// Only the leading `08 00 01 00` is meaningful; none of the bytes are
/// derived from session parameters.
pub const SESSION_FRAME: [u8; HEADER_LEN] = {
    let mut frame = [0u8; HEADER_LEN];
    frame[0] = 0x08;
    frame[2] = 0x01;
    frame
};

// =============================================================================
// FrameKind
// =============================================================================

/// Classification of a received frame by its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `0x01`: handshake ACK, phase 1.
    HandshakeAck,
    /// `0x02`: interim ACK to a request; consumed and discarded.
    Ack,
    /// `0x03`: data / completion response.
    Data,
}

impl FrameKind {
    /// Classifies a leading frame byte.
    pub fn classify(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::HandshakeAck),
            0x02 => Some(Self::Ack),
            0x03 => Some(Self::Data),
            _ => None,
        }
    }
}

// =============================================================================
// Request Builders
// =============================================================================

/// Builds a read-request header.
///
/// `start` is the 1-based word index; the wire carries `start - 1`.
pub fn encode_read_request(seq: u16, area: MemoryArea, start: u16, count: u16) -> [u8; HEADER_LEN] {
    debug_assert!(start >= 1, "plc word index is 1-based");
    let mut frame = [0u8; HEADER_LEN];
    let offset = start - 1;

    frame[0] = 0x02; // message type: request
    frame[2] = (seq & 0xFF) as u8;
    frame[9] = 0x01; // service code: read
    frame[17] = 0x01;
    frame[30] = (seq & 0xFF) as u8; // inner header marker
    frame[31] = 0xC0;
    frame[36] = 0x10; // mailbox / length
    frame[37] = 0x0E;
    frame[40] = 0x01; // subcode
    frame[41] = 0x01;
    frame[42] = 0x04; // read memory
    frame[43] = area.code();
    frame[44..=45].copy_from_slice(&offset.to_le_bytes());
    frame[46..=47].copy_from_slice(&count.to_le_bytes());
    frame[48] = 0x01; // trailer
    frame[49] = 0x01;

    frame
}

/// Builds a write request: 56-byte header immediately followed by the
/// little-endian word payload.
pub fn encode_write_request(seq: u16, area: MemoryArea, start: u16, values: &[u16]) -> Vec<u8> {
    debug_assert!(start >= 1, "plc word index is 1-based");
    let count = values.len() as u16;
    let payload_len = count * 2;
    let offset = start - 1;

    let mut frame = vec![0u8; HEADER_LEN + payload_len as usize];

    frame[0] = 0x02;
    frame[2] = (seq & 0xFF) as u8;
    frame[4..=5].copy_from_slice(&payload_len.to_le_bytes());
    frame[9] = 0x02; // service code: write
    frame[17] = 0x02;
    frame[30] = (seq & 0xFF) as u8;
    frame[31] = 0x80;
    frame[36] = 0x10;
    frame[37] = 0x0E;
    frame[40] = 0x01;
    frame[41] = 0x01;
    frame[42] = 0x32;
    frame[48] = 0x01;
    frame[49] = 0x01;
    frame[50] = 0x07;
    frame[51] = area.code();
    frame[52..=53].copy_from_slice(&offset.to_le_bytes());
    frame[54..=55].copy_from_slice(&count.to_le_bytes());

    for (i, value) in values.iter().enumerate() {
        let at = HEADER_LEN + i * 2;
        frame[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    frame
}

/// Decodes a little-endian word payload.
pub fn decode_words(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects the indices of all nonzero bytes.
    fn nonzero(frame: &[u8]) -> Vec<usize> {
        frame
            .iter()
            .enumerate()
            .filter(|(_, b)| **b != 0)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn read_request_layout() {
        let frame = encode_read_request(0x1234, MemoryArea::R, 1001, 3);
        assert_eq!(frame.len(), HEADER_LEN);

        assert_eq!(frame[0], 0x02);
        assert_eq!(frame[2], 0x34); // low byte of seq
        assert_eq!(frame[9], 0x01);
        assert_eq!(frame[17], 0x01);
        assert_eq!(frame[30], 0x34);
        assert_eq!(frame[31], 0xC0);
        assert_eq!(frame[36], 0x10);
        assert_eq!(frame[37], 0x0E);
        assert_eq!(frame[40], 0x01);
        assert_eq!(frame[41], 0x01);
        assert_eq!(frame[42], 0x04);
        assert_eq!(frame[43], 0x08); // %R
        assert_eq!(&frame[44..=45], &1000u16.to_le_bytes()); // start - 1
        assert_eq!(&frame[46..=47], &3u16.to_le_bytes());
        assert_eq!(frame[48], 0x01);
        assert_eq!(frame[49], 0x01);

        // Every byte not named above is zero.
        assert_eq!(
            nonzero(&frame),
            vec![0, 2, 9, 17, 30, 31, 36, 37, 40, 41, 42, 43, 44, 45, 46, 48, 49]
        );
    }

    #[test]
    fn write_request_layout() {
        let frame = encode_write_request(0xAB01, MemoryArea::Ai, 17, &[0x1234, 0x00FF]);
        assert_eq!(frame.len(), HEADER_LEN + 4);

        assert_eq!(frame[0], 0x02);
        assert_eq!(frame[2], 0x01);
        assert_eq!(&frame[4..=5], &4u16.to_le_bytes()); // payload byte-length
        assert_eq!(frame[9], 0x02);
        assert_eq!(frame[17], 0x02);
        assert_eq!(frame[30], 0x01);
        assert_eq!(frame[31], 0x80);
        assert_eq!(frame[36], 0x10);
        assert_eq!(frame[37], 0x0E);
        assert_eq!(frame[40], 0x01);
        assert_eq!(frame[41], 0x01);
        assert_eq!(frame[42], 0x32);
        assert_eq!(frame[48], 0x01);
        assert_eq!(frame[49], 0x01);
        assert_eq!(frame[50], 0x07);
        assert_eq!(frame[51], 0x0A); // %AI
        assert_eq!(&frame[52..=53], &16u16.to_le_bytes()); // start - 1
        assert_eq!(&frame[54..=55], &2u16.to_le_bytes());

        // Payload: low byte first.
        assert_eq!(&frame[56..], &[0x34, 0x12, 0xFF, 0x00]);
    }

    #[test]
    fn read_request_seq_uses_low_byte_only() {
        let a = encode_read_request(0x0042, MemoryArea::R, 1, 1);
        let b = encode_read_request(0xFF42, MemoryArea::R, 1, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn session_frame_prefix() {
        assert_eq!(&SESSION_FRAME[..4], &[0x08, 0x00, 0x01, 0x00]);
        assert!(SESSION_FRAME[4..].iter().all(|b| *b == 0));
        assert!(NULL_FRAME.iter().all(|b| *b == 0));
    }

    #[test]
    fn frame_kind_classification() {
        assert_eq!(FrameKind::classify(0x01), Some(FrameKind::HandshakeAck));
        assert_eq!(FrameKind::classify(0x02), Some(FrameKind::Ack));
        assert_eq!(FrameKind::classify(0x03), Some(FrameKind::Data));
        assert_eq!(FrameKind::classify(0x00), None);
        assert_eq!(FrameKind::classify(0x04), None);
    }

    #[test]
    fn decode_words_is_little_endian() {
        assert_eq!(decode_words(&[0x34, 0x12, 0xFF, 0x00]), vec![0x1234, 0x00FF]);
        assert_eq!(decode_words(&[]), Vec::<u16>::new());
    }

    #[test]
    fn words_round_trip_through_write_payload() {
        let words = [0u16, 1, 0xABCD, u16::MAX];
        let frame = encode_write_request(7, MemoryArea::R, 1, &words);
        assert_eq!(decode_words(&frame[HEADER_LEN..]), words.to_vec());
    }
}
