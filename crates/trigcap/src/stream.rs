//! Lock-step lane streaming.
//!
//! This module implements the software side of the four stream ports around
//! a [`CoincidenceTrigger`]. Beats arrive on each lane independently and are
//! queued; an invocation proceeds only once every lane has supplied a beat,
//! and then consumes exactly one beat from each lane.
//!
//! `TriggerStream` is an iterator. Each step yields either the output of one
//! invocation, `NeedsMoreData` when a lane is starved, or `EndOfStream` when a
//! replayed capture is exhausted.
use crate::beat::Beat;
use crate::capture::{CaptureDocument, CaptureRecord};
use crate::trigger::{BeatOutput, CoincidenceTrigger, LANES, TriggerControl};
use std::collections::VecDeque;
use std::fmt;

/// Default per-lane limit of queued input beats.
const DEFAULT_MAX_PENDING_BEATS: usize = 65536;

/// Errors raised by the lane plumbing around the trigger.
///
/// The trigger itself never fails; these describe misuse of the stream ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A lane index outside `0..LANES` was used.
    InvalidLane { lane: usize },
    /// Queuing another beat on `lane` would exceed `limit` pending beats.
    ///
    /// This happens when one lane is fed while another never is.
    QueueFull { lane: usize, limit: usize },
    /// Beats were pushed into a stream replaying a capture.
    SourceIsCapture,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::InvalidLane { lane } => {
                write!(f, "invalid lane {} (expected 0..{})", lane, LANES)
            }
            StreamError::QueueFull { lane, limit } => {
                write!(f, "lane {} queue full ({} pending beats)", lane, limit)
            }
            StreamError::SourceIsCapture => {
                write!(f, "cannot push beats into a stream replaying a capture")
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// Result of one iteration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamResult {
    /// One lock-step invocation completed.
    Beat(BeatOutput),
    /// At least one lane has no queued beat.
    NeedsMoreData,
    /// The replayed capture has no more records.
    EndOfStream,
}

/// Where the input beats come from.
#[derive(Debug)]
enum TriggerStreamSource {
    /// Beats pushed per lane by the caller.
    Lanes { queues: [VecDeque<Beat>; LANES] },
    /// Records replayed from a capture document.
    Capture {
        document: Box<CaptureDocument>,
        current_index: usize,
    },
}

/// Lock-step stream processor around one `CoincidenceTrigger`.
///
/// # Examples
///
/// ```
/// use trigcap::{Beat, TriggerControl, TriggerStream};
/// use trigcap::stream::StreamResult;
///
/// let mut stream = TriggerStream::new();
/// stream.set_control(TriggerControl::uniform(1000, 8, 0));
///
/// // Lanes may be fed at different times; nothing runs until all four have a beat.
/// stream.push_beat(0, Beat::with_first_sample(2000, false)).unwrap();
/// assert_eq!(stream.next(), Some(Ok(StreamResult::NeedsMoreData)));
/// assert_eq!(stream.starved_lanes(), vec![1, 2, 3]);
///
/// for lane in 1..4 {
///     stream.push_beat(lane, Beat::with_first_sample(2000, false)).unwrap();
/// }
/// match stream.next() {
///     Some(Ok(StreamResult::Beat(out))) => assert!(out.trigger_event),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
#[derive(Debug)]
pub struct TriggerStream {
    source: TriggerStreamSource,
    trigger: CoincidenceTrigger,
    /// Control used for lane-fed beats.
    control: TriggerControl,
    /// Replaces recorded control when replaying a capture.
    control_override: Option<TriggerControl>,
    /// One-shot clear for the next invocation.
    clear_pending: bool,
    /// Beats processed since construction or reset.
    processed_beats: u64,
    max_pending_beats: usize,
}

impl TriggerStream {
    /// Create a stream fed beat by beat through `push_beat`.
    pub fn new() -> Self {
        Self::with_source(TriggerStreamSource::Lanes {
            queues: std::array::from_fn(|_| VecDeque::new()),
        })
    }

    /// Create a stream replaying the records of `document` in order.
    ///
    /// Each record is processed with its own recorded control unless an
    /// override is set.
    pub fn from_document(document: CaptureDocument) -> Self {
        Self::with_source(TriggerStreamSource::Capture {
            document: Box::new(document),
            current_index: 0,
        })
    }

    fn with_source(source: TriggerStreamSource) -> Self {
        Self {
            source,
            trigger: CoincidenceTrigger::new(),
            control: TriggerControl::default(),
            control_override: None,
            clear_pending: false,
            processed_beats: 0,
            max_pending_beats: DEFAULT_MAX_PENDING_BEATS,
        }
    }

    /// Queue one beat on `lane`.
    pub fn push_beat(&mut self, lane: usize, beat: Beat) -> Result<(), StreamError> {
        let limit = self.max_pending_beats;
        match &mut self.source {
            TriggerStreamSource::Lanes { queues } => {
                let queue = queues
                    .get_mut(lane)
                    .ok_or(StreamError::InvalidLane { lane })?;
                if queue.len() >= limit {
                    return Err(StreamError::QueueFull { lane, limit });
                }
                queue.push_back(beat);
                Ok(())
            }
            TriggerStreamSource::Capture { .. } => Err(StreamError::SourceIsCapture),
        }
    }

    /// Queue one beat on every lane.
    ///
    /// Either all four beats are queued or none is.
    pub fn push_beats(&mut self, beats: [Beat; LANES]) -> Result<(), StreamError> {
        let limit = self.max_pending_beats;
        match &mut self.source {
            TriggerStreamSource::Lanes { queues } => {
                if let Some(lane) = queues.iter().position(|q| q.len() >= limit) {
                    return Err(StreamError::QueueFull { lane, limit });
                }
                for (queue, beat) in queues.iter_mut().zip(beats) {
                    queue.push_back(beat);
                }
                Ok(())
            }
            TriggerStreamSource::Capture { .. } => Err(StreamError::SourceIsCapture),
        }
    }

    /// Set the control inputs for lane-fed beats.
    ///
    /// The values take effect on the next invocation. A `clear_trigger` set
    /// here stays asserted on every beat until replaced.
    pub fn set_control(&mut self, control: TriggerControl) {
        self.control = control;
    }

    /// Control inputs for lane-fed beats.
    pub fn control(&self) -> &TriggerControl {
        &self.control
    }

    /// Replace the recorded control of a replayed capture.
    ///
    /// Recorded clears are still honoured; `None` restores the recorded
    /// control.
    pub fn set_control_override(&mut self, control: Option<TriggerControl>) {
        self.control_override = control;
    }

    /// Assert `clear_trigger` for exactly the next invocation.
    pub fn request_clear(&mut self) {
        self.clear_pending = true;
    }

    /// Sets the per-lane limit of queued input beats.
    pub fn set_max_pending_beats(&mut self, limit: usize) {
        self.max_pending_beats = limit;
    }

    /// Gets the per-lane limit of queued input beats.
    pub fn max_pending_beats(&self) -> usize {
        self.max_pending_beats
    }

    /// Number of queued beats on `lane`, `0` for a capture source.
    pub fn pending_beats(&self, lane: usize) -> usize {
        match &self.source {
            TriggerStreamSource::Lanes { queues } => queues.get(lane).map_or(0, VecDeque::len),
            TriggerStreamSource::Capture { .. } => 0,
        }
    }

    /// Lanes that currently have no queued beat.
    pub fn starved_lanes(&self) -> Vec<usize> {
        match &self.source {
            TriggerStreamSource::Lanes { queues } => queues
                .iter()
                .enumerate()
                .filter(|(_, q)| q.is_empty())
                .map(|(lane, _)| lane)
                .collect(),
            TriggerStreamSource::Capture { .. } => Vec::new(),
        }
    }

    /// The trigger core, for reading its control outputs.
    pub fn trigger(&self) -> &CoincidenceTrigger {
        &self.trigger
    }

    /// Beats processed since construction or the last reset.
    pub fn processed_beats(&self) -> u64 {
        self.processed_beats
    }

    /// Drop queued beats, rewind a replayed capture and reset the trigger.
    pub fn reset(&mut self) {
        match &mut self.source {
            TriggerStreamSource::Lanes { queues } => queues.iter_mut().for_each(VecDeque::clear),
            TriggerStreamSource::Capture { current_index, .. } => *current_index = 0,
        }
        self.trigger.reset();
        self.clear_pending = false;
        self.processed_beats = 0;
    }

    /// Take the next beat tuple and its control, if every lane can supply one.
    fn next_input(&mut self) -> Option<CaptureRecord> {
        match &mut self.source {
            TriggerStreamSource::Lanes { queues } => {
                if queues.iter().any(VecDeque::is_empty) {
                    return None;
                }
                let mut beats = [Beat::zeroed(); LANES];
                for (beat, queue) in beats.iter_mut().zip(queues.iter_mut()) {
                    *beat = queue.pop_front()?;
                }
                Some(CaptureRecord {
                    control: self.control,
                    beats,
                })
            }
            TriggerStreamSource::Capture {
                document,
                current_index,
            } => {
                let mut record = *document.records.get(*current_index)?;
                *current_index += 1;
                if let Some(control) = self.control_override {
                    let recorded_clear = record.control.clear_trigger;
                    record.control = control;
                    record.control.clear_trigger |= recorded_clear;
                }
                Some(record)
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        match &self.source {
            TriggerStreamSource::Lanes { .. } => false,
            TriggerStreamSource::Capture {
                document,
                current_index,
            } => *current_index >= document.records.len(),
        }
    }

    fn next_result(&mut self) -> StreamResult {
        let Some(mut record) = self.next_input() else {
            return if self.is_exhausted() {
                StreamResult::EndOfStream
            } else {
                StreamResult::NeedsMoreData
            };
        };

        if self.clear_pending {
            record.control.clear_trigger = true;
            self.clear_pending = false;
        }

        let output = self.trigger.process_beat(record.beats, &record.control);
        log::trace!(
            "beat {}: trigger={} holds={:?}",
            self.processed_beats,
            output.trigger_event,
            self.trigger.holds()
        );
        self.processed_beats += 1;
        StreamResult::Beat(output)
    }
}

impl Default for TriggerStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Iteration itself never yields `Err`: misuse of the lane ports is reported
/// by `push_beat`/`push_beats`, and a replayed capture was validated when it
/// was parsed.
impl Iterator for TriggerStream {
    type Item = Result<StreamResult, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(Ok(self.next_result()))
    }
}
