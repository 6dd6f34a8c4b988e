//! Capture files.
//!
//! A capture stores a sequence of trigger invocations: for every beat the
//! control inputs and the four input beats. Captures are the replayable
//! stimulus for a [`TriggerStream`](crate::TriggerStream) and the interchange
//! format of the `trigcap` command line tools.
//!
//! This module exposes the document and header types and the parser entry
//! points.
mod document;
mod header;
pub mod parser;

pub use document::{CaptureBuilder, CaptureDocument, CaptureRecord};
pub use header::{
    CAPTURE_HEADER_SIZE, CAPTURE_IDENT, CAPTURE_RECORD_SIZE, CAPTURE_VERSION, CaptureHeader,
};
