//! Capture document and builder.
//!
//! `CaptureDocument` holds the header and the ordered records of a capture.
//! `CaptureBuilder` assembles documents programmatically, carrying the
//! current control inputs forward from record to record the way a host
//! writes control registers once and streams beats afterwards.
//!
//! Conversions: `TryFrom<&[u8]> for CaptureDocument` (parsing) and
//! `From<CaptureDocument> for Vec<u8>` (serialization).
use crate::beat::{BEAT_DATA_BYTES, Beat};
use crate::binutil::{write_i16, write_slice, write_u8, write_u32};
use crate::capture::header::{CAPTURE_RECORD_SIZE, CaptureHeader};
use crate::capture::parser;
use crate::trigger::{LANES, TriggerControl};
use std::convert::TryFrom;

/// Size of the control block at the start of each record.
pub(crate) const CONTROL_BLOCK_SIZE: usize = 16;

/// Size of one lane block: data word, keep mask, flags, padding.
pub(crate) const LANE_BLOCK_SIZE: usize = 40;

/// One recorded invocation: the control inputs and one beat per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureRecord {
    pub control: TriggerControl,
    pub beats: [Beat; LANES],
}

impl CaptureRecord {
    /// Serialize the record into `CAPTURE_RECORD_SIZE` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; CAPTURE_RECORD_SIZE as usize];

        for (lane, threshold) in self.control.thresholds.iter().enumerate() {
            write_i16(&mut buf, lane * 2, *threshold);
        }
        write_u8(&mut buf, 0x08, self.control.window_beats);
        write_u8(&mut buf, 0x09, self.control.clear_trigger as u8);
        write_u32(&mut buf, 0x0C, self.control.packet_beats);

        for (lane, beat) in self.beats.iter().enumerate() {
            let base = CONTROL_BLOCK_SIZE + lane * LANE_BLOCK_SIZE;
            write_slice(&mut buf, base, &beat.to_data_bytes());
            write_u32(&mut buf, base + BEAT_DATA_BYTES, beat.keep);
            write_u8(&mut buf, base + BEAT_DATA_BYTES + 4, beat.last as u8);
        }

        buf
    }
}

/// A complete capture: header and ordered records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureDocument {
    pub header: CaptureHeader,
    pub records: Vec<CaptureRecord>,
}

impl CaptureDocument {
    /// Serialize the document. The record count is taken from `records`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = CaptureHeader {
            record_count: self.records.len() as u32,
            record_size: CAPTURE_RECORD_SIZE,
            ..self.header
        };
        let mut out = header.to_bytes();
        out.reserve(self.records.len() * CAPTURE_RECORD_SIZE as usize);
        for record in &self.records {
            out.extend_from_slice(&record.to_bytes());
        }
        out
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the capture holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records by reference.
    pub fn iter(&self) -> std::slice::Iter<'_, CaptureRecord> {
        self.records.iter()
    }
}

/// Builder for assembling a `CaptureDocument`.
///
/// # Examples
///
/// ```
/// use trigcap::{Beat, CaptureBuilder, CaptureDocument, TriggerControl};
///
/// let mut builder = CaptureBuilder::new();
/// builder.set_control(TriggerControl::uniform(1000, 8, 16));
/// builder.clear_next();
/// builder.add_idle(15);
/// builder.add_beats([Beat::with_first_sample(2000, false); 4]);
/// let doc = builder.finalize();
///
/// let bytes: Vec<u8> = (&doc).into();
/// let parsed = CaptureDocument::try_from(bytes.as_slice()).unwrap();
/// assert_eq!(parsed.len(), 16);
/// assert!(parsed.records[0].control.clear_trigger);
/// assert!(!parsed.records[1].control.clear_trigger);
/// ```
#[derive(Debug, Default)]
pub struct CaptureBuilder {
    document: CaptureDocument,
    control: TriggerControl,
    clear_pending: bool,
}

impl CaptureBuilder {
    /// Create a builder with an empty document and zeroed control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the control applied to subsequently added beats.
    ///
    /// A `clear_trigger` set here is level-sensitive: it is recorded on every
    /// following record until replaced. Use `clear_next` for a one-shot clear.
    pub fn set_control(&mut self, control: TriggerControl) -> &mut Self {
        self.control = control;
        self
    }

    /// Current control.
    pub fn control(&self) -> &TriggerControl {
        &self.control
    }

    /// Assert `clear_trigger` on the next added record only.
    pub fn clear_next(&mut self) -> &mut Self {
        self.clear_pending = true;
        self
    }

    /// Append one beat per lane using the current control.
    pub fn add_beats(&mut self, beats: [Beat; LANES]) -> &mut Self {
        let mut control = self.control;
        if self.clear_pending {
            control.clear_trigger = true;
            self.clear_pending = false;
        }
        self.document.records.push(CaptureRecord { control, beats });
        self
    }

    /// Append a fully specified record. A pending one-shot clear is kept for
    /// the next `add_beats`.
    pub fn add_record(&mut self, record: CaptureRecord) -> &mut Self {
        self.document.records.push(record);
        self
    }

    /// Append `count` silent beats.
    pub fn add_idle(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.add_beats([Beat::zeroed(); LANES]);
        }
        self
    }

    /// Finalize the builder and return the assembled document.
    pub fn finalize(mut self) -> CaptureDocument {
        self.document.header.record_count = self.document.records.len() as u32;
        self.document
    }
}

/// Conversion from `CaptureDocument` to `CaptureBuilder` for appending.
impl From<CaptureDocument> for CaptureBuilder {
    fn from(document: CaptureDocument) -> Self {
        let control = document
            .records
            .last()
            .map(|r| r.control.with_clear(false))
            .unwrap_or_default();
        CaptureBuilder {
            document,
            control,
            clear_pending: false,
        }
    }
}

/// Parse raw capture bytes into a `CaptureDocument`.
impl TryFrom<&[u8]> for CaptureDocument {
    type Error = crate::binutil::ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parser::parse_capture(bytes)
    }
}

/// Convert a `CaptureDocument` into its serialized bytes.
impl From<CaptureDocument> for Vec<u8> {
    fn from(document: CaptureDocument) -> Vec<u8> {
        document.to_bytes()
    }
}

/// Convert a borrowed `CaptureDocument` into serialized bytes.
impl From<&CaptureDocument> for Vec<u8> {
    fn from(document: &CaptureDocument) -> Vec<u8> {
        document.to_bytes()
    }
}

/// Consume the document and iterate its records by value.
impl IntoIterator for CaptureDocument {
    type Item = CaptureRecord;
    type IntoIter = std::vec::IntoIter<CaptureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Iterate over records by reference: `for r in &doc { ... }`.
impl<'a> IntoIterator for &'a CaptureDocument {
    type Item = &'a CaptureRecord;
    type IntoIter = std::slice::Iter<'a, CaptureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
