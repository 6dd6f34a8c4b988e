#![doc = include_str!("../README.md")]
//! trigcap — four-lane streaming coincidence trigger
//!
//! `trigcap` models a trigger-capture front end: four synchronized lanes
//! carry packed beats of sixteen 16-bit samples each. Every beat, the
//! detector checks each lane against its own amplitude threshold, keeps a
//! per-lane hold window open after a hit, and latches a sticky trigger when
//! all four windows are open at once. The passthrough beats get their
//! end-of-frame flags re-stamped at a configurable cadence.
//!
//! Key pieces:
//! - [`CoincidenceTrigger`]: the per-beat state machine. Never fails, all
//!   arithmetic wraps at fixed width.
//! - [`TriggerStream`]: lock-step lane queues around the trigger; an
//!   invocation happens only once all four lanes supplied a beat.
//! - [`TriggerCallbackStream`]: callbacks for beats, lane hits, clears,
//!   frame boundaries and trigger latches.
//! - [`CaptureBuilder`] / [`CaptureDocument`]: a binary capture format that
//!   records control inputs and beats for offline replay.
//!
//! Example: the coincidence window
//!
//! ```rust
//! use trigcap::{Beat, CoincidenceTrigger, TriggerControl};
//!
//! let mut trigger = CoincidenceTrigger::new();
//! let control = TriggerControl::uniform(1000, 8, 16);
//!
//! // Lanes hit on local beats 10, 12, 15 and 17.
//! let hits = [10, 12, 15, 17];
//! let mut fired_at = None;
//! for b in 0..30 {
//!     let beats = hits.map(|h| Beat::with_first_sample(if h == b { 2000 } else { 0 }, false));
//!     let out = trigger.process_beat(beats, &control);
//!     if out.trigger_event && fired_at.is_none() {
//!         fired_at = Some(out.trigger_beat_index);
//!     }
//! }
//! assert_eq!(fired_at, Some(17));
//! ```
//!
//! Example: replaying a capture
//!
//! ```rust
//! use trigcap::{Beat, CaptureBuilder, CaptureDocument, TriggerControl, TriggerStream};
//! use trigcap::stream::StreamResult;
//!
//! let mut builder = CaptureBuilder::new();
//! builder.set_control(TriggerControl::uniform(1000, 8, 4));
//! builder.clear_next();
//! builder.add_idle(8);
//! let bytes: Vec<u8> = builder.finalize().into();
//!
//! let doc = CaptureDocument::try_from(bytes.as_slice()).expect("valid capture");
//! let mut boundaries = 0;
//! for result in TriggerStream::from_document(doc) {
//!     match result {
//!         Ok(StreamResult::Beat(out)) => boundaries += out.beats[0].last as usize,
//!         Ok(StreamResult::NeedsMoreData) | Ok(StreamResult::EndOfStream) => break,
//!         Err(e) => panic!("stream error: {}", e),
//!     }
//! }
//! assert_eq!(boundaries, 2);
//! ```
pub mod beat;
mod binutil;
pub mod callback_stream;
pub mod capture;
pub mod event;
pub mod stream;
pub mod trigger;

pub use beat::{Beat, KEEP_ALL, SAMPLES_PER_BEAT, Sample};
pub use binutil::ParseError;
pub use callback_stream::TriggerCallbackStream;
pub use capture::{
    CAPTURE_HEADER_SIZE, CAPTURE_IDENT, CAPTURE_RECORD_SIZE, CAPTURE_VERSION, CaptureBuilder,
    CaptureDocument, CaptureHeader, CaptureRecord,
};
pub use event::TriggerEvent;
pub use stream::{StreamError, StreamResult, TriggerStream};
pub use trigger::{BeatOutput, CoincidenceTrigger, LANES, TriggerControl};
