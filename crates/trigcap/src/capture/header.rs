//! Capture header.
//!
//! On-disk layout (all integers little-endian):
//!
//! | offset | size | field                      |
//! |--------|------|----------------------------|
//! | 0x00   | 4    | ident `"TCAP"`             |
//! | 0x04   | 4    | version                    |
//! | 0x08   | 4    | record count               |
//! | 0x0C   | 4    | header size                |
//! | 0x10   | 4    | record size                |
//! | 0x14   | 12   | reserved (zero)            |
//!
//! Readers honour `header_size`, so later versions may grow the header
//! without breaking older parsers.
use crate::binutil::{write_slice, write_u32};
use std::convert::TryFrom;

/// File identifier.
pub const CAPTURE_IDENT: &[u8; 4] = b"TCAP";

/// Version written by this crate (1.00).
pub const CAPTURE_VERSION: u32 = 0x0000_0100;

/// Size of the header written by this crate.
pub const CAPTURE_HEADER_SIZE: u32 = 0x20;

/// Size of one record: control block plus four lane blocks.
pub const CAPTURE_RECORD_SIZE: u32 = 0xB0;

/// Capture header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    pub version: u32,
    pub record_count: u32,
    pub header_size: u32,
    pub record_size: u32,
}

impl Default for CaptureHeader {
    fn default() -> Self {
        Self {
            version: CAPTURE_VERSION,
            record_count: 0,
            header_size: CAPTURE_HEADER_SIZE,
            record_size: CAPTURE_RECORD_SIZE,
        }
    }
}

impl CaptureHeader {
    /// Major version number (high byte of the version word's low half).
    pub fn major_version(&self) -> u32 {
        (self.version >> 8) & 0xFF
    }

    /// Serialize the header.
    ///
    /// The output is `header_size` bytes long (never shorter than the fixed
    /// fields); bytes beyond the known fields are zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = (self.header_size as usize).max(CAPTURE_HEADER_SIZE as usize);
        let mut buf = vec![0u8; len];
        write_slice(&mut buf, 0x00, CAPTURE_IDENT);
        write_u32(&mut buf, 0x04, self.version);
        write_u32(&mut buf, 0x08, self.record_count);
        write_u32(&mut buf, 0x0C, self.header_size);
        write_u32(&mut buf, 0x10, self.record_size);
        buf
    }
}

/// Attempt to convert raw capture bytes into a `CaptureHeader`.
impl TryFrom<&[u8]> for CaptureHeader {
    type Error = crate::binutil::ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        crate::capture::parser::parse_capture_header(bytes)
    }
}
