//! Trigger stream with callback support.
//!
//! `TriggerCallbackStream` wraps a [`TriggerStream`] and invokes registered
//! callbacks as beats are processed: for every beat, for every derived
//! [`TriggerEvent`], and for each rising edge of the sticky trigger.
//!
//! # Iterator Behavior
//!
//! When the underlying stream reaches `StreamResult::EndOfStream`, this
//! iterator returns `None`. `NeedsMoreData` is passed through, so a lane-fed
//! stream can be topped up via `inner_mut()` and iterated again.
//!
//! The rising-edge tracking follows the wrapped trigger, so a `reset()` or a
//! clear through `inner_mut()` re-arms `on_trigger`.
//!
//! # Examples
//!
//! ```
//! use trigcap::{Beat, CaptureBuilder, TriggerCallbackStream, TriggerControl};
//!
//! let mut builder = CaptureBuilder::new();
//! builder.set_control(TriggerControl::uniform(1000, 8, 0));
//! builder.add_idle(3);
//! builder.add_beats([Beat::with_first_sample(2000, false); 4]);
//! let doc = builder.finalize();
//!
//! let mut fired = Vec::new();
//! let mut stream = TriggerCallbackStream::from_document(doc);
//! stream.on_trigger(|beat_index, position| fired.push((beat_index, position)));
//! for _ in &mut stream {}
//! drop(stream);
//!
//! assert_eq!(fired, vec![(3, 3)]);
//! ```
use crate::capture::CaptureDocument;
use crate::event::TriggerEvent;
use crate::stream::{StreamError, StreamResult, TriggerStream};
use crate::trigger::BeatOutput;

type BeatCallback<'a> = Option<Box<dyn FnMut(&BeatOutput, u64) + 'a>>;
type EventCallback<'a> = Option<Box<dyn FnMut(&TriggerEvent, u64) + 'a>>;
type TriggerCallback<'a> = Option<Box<dyn FnMut(u32, u64) + 'a>>;

/// Stream wrapper dispatching per-beat callbacks.
pub struct TriggerCallbackStream<'a> {
    stream: TriggerStream,
    on_beat: BeatCallback<'a>,
    on_event: EventCallback<'a>,
    on_trigger: TriggerCallback<'a>,
    /// Sticky flag reported by the previous beat.
    previous_trigger_event: bool,
}

impl<'a> TriggerCallbackStream<'a> {
    /// Wrap an existing stream.
    pub fn new(stream: TriggerStream) -> Self {
        let previous_trigger_event = stream.trigger().trigger_event();
        Self {
            stream,
            on_beat: None,
            on_event: None,
            on_trigger: None,
            previous_trigger_event,
        }
    }

    /// Create a callback stream replaying `document`.
    pub fn from_document(document: CaptureDocument) -> Self {
        Self::new(TriggerStream::from_document(document))
    }

    /// Register a callback invoked with every processed beat and its stream
    /// position.
    pub fn on_beat<F>(&mut self, callback: F)
    where
        F: FnMut(&BeatOutput, u64) + 'a,
    {
        self.on_beat = Some(Box::new(callback));
    }

    /// Register a callback invoked for every derived event.
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: FnMut(&TriggerEvent, u64) + 'a,
    {
        self.on_event = Some(Box::new(callback));
    }

    /// Register a callback invoked with the latched beat index and the
    /// stream position each time the sticky trigger fires.
    pub fn on_trigger<F>(&mut self, callback: F)
    where
        F: FnMut(u32, u64) + 'a,
    {
        self.on_trigger = Some(Box::new(callback));
    }

    /// The wrapped stream.
    pub fn inner(&self) -> &TriggerStream {
        &self.stream
    }

    /// The wrapped stream, for pushing beats or changing control.
    pub fn inner_mut(&mut self) -> &mut TriggerStream {
        &mut self.stream
    }

    /// Unwrap into the underlying stream.
    pub fn into_inner(self) -> TriggerStream {
        self.stream
    }

    fn dispatch(&mut self, output: &BeatOutput) {
        // processed_beats already counts this beat
        let position = self.stream.processed_beats().saturating_sub(1);

        if let Some(ref mut callback) = self.on_beat {
            callback(output, position);
        }

        if self.on_event.is_some() || self.on_trigger.is_some() {
            let events = TriggerEvent::from_transition(self.previous_trigger_event, output);
            for event in &events {
                if let Some(ref mut callback) = self.on_event {
                    callback(event, position);
                }
                if let TriggerEvent::Triggered { beat_index } = *event
                    && let Some(ref mut callback) = self.on_trigger
                {
                    callback(beat_index, position);
                }
            }
        }

        self.previous_trigger_event = output.trigger_event;
    }
}

impl Iterator for TriggerCallbackStream<'_> {
    type Item = Result<StreamResult, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        // the stream may have been reset through inner_mut()
        self.previous_trigger_event = self.stream.trigger().trigger_event();
        let result = self.stream.next()?;
        match result {
            Ok(StreamResult::Beat(ref output)) => {
                self.dispatch(output);
                Some(result)
            }
            Ok(StreamResult::EndOfStream) => None,
            _ => Some(result),
        }
    }
}
