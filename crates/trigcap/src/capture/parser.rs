//! Capture parser.
//!
//! Entry points:
//! - `parse_capture(bytes)`: parse a complete capture into a `CaptureDocument`.
//! - `parse_capture_header(bytes)`: parse only the header.
//! - `parse_record(bytes, off)`: decode one record starting at `off`.
//!
//! Parsing is strict: short buffers, a wrong identifier, an unknown major
//! version, truncated records and trailing bytes are all reported as
//! `ParseError`. Headers and records longer than this version's layout are
//! accepted and their extra bytes are skipped.
use crate::beat::{BEAT_DATA_BYTES, Beat};
use crate::binutil::{ParseError, read_i16_le_at, read_slice, read_u8_at, read_u32_le_at};
use crate::capture::document::{
    CONTROL_BLOCK_SIZE, CaptureDocument, CaptureRecord, LANE_BLOCK_SIZE,
};
use crate::capture::header::{
    CAPTURE_HEADER_SIZE, CAPTURE_IDENT, CAPTURE_RECORD_SIZE, CaptureHeader,
};
use crate::trigger::{LANES, TriggerControl};

/// Parse a complete capture from a byte slice.
pub fn parse_capture(bytes: &[u8]) -> Result<CaptureDocument, ParseError> {
    let header = parse_capture_header(bytes)?;
    let record_size = header.record_size as usize;
    let mut off = header.header_size as usize;

    let mut records = Vec::with_capacity((header.record_count as usize).min(1 << 16));
    for index in 0..header.record_count as usize {
        if bytes.len().saturating_sub(off) < record_size {
            return Err(ParseError::OffsetOutOfRange {
                offset: off,
                needed: record_size,
                available: bytes.len().saturating_sub(off),
                context: Some(format!("record {}", index)),
            });
        }
        records.push(parse_record(bytes, off)?);
        off += record_size;
    }

    if off < bytes.len() {
        return Err(ParseError::Other(format!(
            "trailing bytes after {} records: {} bytes at 0x{:X}",
            header.record_count,
            bytes.len() - off,
            off
        )));
    }

    Ok(CaptureDocument { header, records })
}

/// Parse and validate the capture header.
pub fn parse_capture_header(bytes: &[u8]) -> Result<CaptureHeader, ParseError> {
    if bytes.len() < CAPTURE_HEADER_SIZE as usize {
        return Err(ParseError::HeaderTooShort("capture header (0x20)".into()));
    }

    let ident_slice = read_slice(bytes, 0x00, 4)?;
    if ident_slice != CAPTURE_IDENT {
        let mut id: [u8; 4] = [0; 4];
        id.copy_from_slice(ident_slice);
        return Err(ParseError::InvalidIdent(id));
    }

    let header = CaptureHeader {
        version: read_u32_le_at(bytes, 0x04)?,
        record_count: read_u32_le_at(bytes, 0x08)?,
        header_size: read_u32_le_at(bytes, 0x0C)?,
        record_size: read_u32_le_at(bytes, 0x10)?,
    };

    if header.major_version() != 1 {
        return Err(ParseError::UnsupportedVersion(header.version));
    }
    if header.header_size < CAPTURE_HEADER_SIZE {
        return Err(ParseError::HeaderTooShort(format!(
            "header_size field 0x{:X}",
            header.header_size
        )));
    }
    if header.record_size < CAPTURE_RECORD_SIZE {
        return Err(ParseError::Other(format!(
            "record size 0x{:X} is smaller than 0x{:X}",
            header.record_size, CAPTURE_RECORD_SIZE
        )));
    }
    if bytes.len() < header.header_size as usize {
        return Err(ParseError::OffsetOutOfRange {
            offset: 0,
            needed: header.header_size as usize,
            available: bytes.len(),
            context: Some("header_size".into()),
        });
    }

    Ok(header)
}

/// Decode one record starting at `off`.
pub fn parse_record(bytes: &[u8], off: usize) -> Result<CaptureRecord, ParseError> {
    let mut thresholds = [0; LANES];
    for (lane, threshold) in thresholds.iter_mut().enumerate() {
        *threshold = read_i16_le_at(bytes, off + lane * 2)?;
    }
    let control = TriggerControl {
        thresholds,
        window_beats: read_u8_at(bytes, off + 0x08)?,
        clear_trigger: read_u8_at(bytes, off + 0x09)? & 0x01 != 0,
        packet_beats: read_u32_le_at(bytes, off + 0x0C)?,
    };

    let mut beats = [Beat::zeroed(); LANES];
    for (lane, beat) in beats.iter_mut().enumerate() {
        let base = off + CONTROL_BLOCK_SIZE + lane * LANE_BLOCK_SIZE;
        let mut data = [0u8; BEAT_DATA_BYTES];
        data.copy_from_slice(read_slice(bytes, base, BEAT_DATA_BYTES)?);
        *beat = Beat::from_data_bytes(&data);
        beat.keep = read_u32_le_at(bytes, base + BEAT_DATA_BYTES)?;
        beat.last = read_u8_at(bytes, base + BEAT_DATA_BYTES + 4)? & 0x01 != 0;
    }

    Ok(CaptureRecord { control, beats })
}
