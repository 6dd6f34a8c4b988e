//! Utilities used by the capture codec: parse error type and byte readers/writers.
use std::fmt;

/// Error type returned by the parsing helpers in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An attempted read was outside the available buffer range.
    ///
    /// - `offset` is the index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the current buffer length.
    /// - `context` is an optional string describing the logical location
    ///   (for example `"record"` or `"header_size"`) where the access
    ///   was attempted.
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<String>,
    },

    /// The four-byte file identifier did not match `"TCAP"`.
    ///
    /// The contained array is the raw 4 bytes that were read.
    InvalidIdent([u8; 4]),

    /// The capture uses a version the parser does not support.
    UnsupportedVersion(u32),

    /// A header was shorter than the minimum required length.
    ///
    /// The contained `String` identifies which header or field was too short.
    HeaderTooShort(String),

    /// A generic error with a human-readable message.
    Other(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "offset out of range at {}: 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "offset out of range: 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
            ParseError::InvalidIdent(id) => write!(f, "invalid ident: {:?}", id),
            ParseError::UnsupportedVersion(v) => write!(f, "unsupported version: 0x{:08X}", v),
            ParseError::HeaderTooShort(name) => write!(f, "header too short: {}", name),
            ParseError::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `Err(ParseError::OffsetOutOfRange)` when the buffer is too short.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    let s = read_slice(bytes, off, 4)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(s);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, ParseError> {
    let s = read_slice(bytes, off, 2)?;
    Ok(u16::from_le_bytes([s[0], s[1]]))
}

/// Read a 16-bit little-endian signed integer from `bytes` at `off`.
///
/// The bit pattern is reinterpreted, never range-checked.
pub fn read_i16_le_at(bytes: &[u8], off: usize) -> Result<i16, ParseError> {
    let v = read_u16_le_at(bytes, off)?;
    Ok(i16::from_le_bytes(v.to_le_bytes()))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    bytes.get(off).copied().ok_or(ParseError::OffsetOutOfRange {
        offset: off,
        needed: 1,
        available: bytes.len(),
        context: None,
    })
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
///
/// Returns `Err(ParseError::OffsetOutOfRange)` when the requested range
/// exceeds the available buffer.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    match off.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[off..end]),
        _ => Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: len,
            // Remaining number of bytes from `off` to the end of the buffer.
            available: bytes.len().saturating_sub(off),
            context: Some("read_slice".into()),
        }),
    }
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// No bounds checking; callers must ensure the destination range is valid.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Write a 16-bit little-endian signed integer `v` into `buf` at `off`.
pub fn write_i16(buf: &mut [u8], off: usize, v: i16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

/// Write a single byte `v` into `buf` at `off`.
pub fn write_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}

/// Copy the contents of `s` into `buf` starting at `off`.
pub fn write_slice(buf: &mut [u8], off: usize, s: &[u8]) {
    buf[off..off + s.len()].copy_from_slice(s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_out_of_range_reports_remaining() {
        let bytes = [0u8; 6];
        let err = read_u32_le_at(&bytes, 4).unwrap_err();
        assert_eq!(
            err,
            ParseError::OffsetOutOfRange {
                offset: 4,
                needed: 4,
                available: 2,
                context: Some("read_slice".into()),
            }
        );
    }

    #[test]
    fn test_read_slice_offset_overflow() {
        let bytes = [0u8; 4];
        assert!(read_slice(&bytes, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_signed_readback() {
        let mut buf = [0u8; 4];
        write_i16(&mut buf, 0, i16::MIN);
        write_i16(&mut buf, 2, -1);
        assert_eq!(read_i16_le_at(&buf, 0).unwrap(), i16::MIN);
        assert_eq!(read_i16_le_at(&buf, 2).unwrap(), -1);
        assert_eq!(read_u16_le_at(&buf, 2).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_read_u8_past_end() {
        assert!(read_u8_at(&[1, 2], 2).is_err());
        assert_eq!(read_u8_at(&[1, 2], 1).unwrap(), 2);
    }
}
