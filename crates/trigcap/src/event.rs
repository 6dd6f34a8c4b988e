//! Trigger events.
//!
//! Events are derived from consecutive [`BeatOutput`]s and describe the
//! notable transitions of a beat: clears, lane hits, the rising edge of the
//! sticky trigger and frame boundaries on the output lanes.

use crate::trigger::BeatOutput;

/// Events that can be emitted while processing a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// A clear was applied before the beat was processed.
    Cleared,

    /// A lane saw a sample whose magnitude exceeded its threshold.
    LaneHit {
        /// Lane number (0-based)
        lane: u8,
    },

    /// The sticky trigger rose from false to true.
    Triggered {
        /// Beat counter value latched at the coincidence
        beat_index: u32,
    },

    /// The output beats carry an end-of-frame flag.
    FrameBoundary,
}

impl TriggerEvent {
    /// Derive the events of `output`, given the trigger flag of the
    /// previous beat.
    ///
    /// Events are ordered `Cleared`, `LaneHit` (ascending lane),
    /// `Triggered`, `FrameBoundary`.
    ///
    /// A clear resets the sticky flag before detection, so a trigger that
    /// is still reported after a clearing beat is a fresh latch.
    pub fn from_transition(previous_trigger_event: bool, output: &BeatOutput) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        if output.cleared {
            events.push(TriggerEvent::Cleared);
        }

        events.extend(
            output
                .lane_hits
                .iter()
                .enumerate()
                .filter(|&(_, &hit)| hit)
                .map(|(lane, _)| TriggerEvent::LaneHit { lane: lane as u8 }),
        );

        let armed = !previous_trigger_event || output.cleared;
        if armed && output.trigger_event {
            events.push(TriggerEvent::Triggered {
                beat_index: output.trigger_beat_index,
            });
        }

        if output.beats.iter().any(|b| b.last) {
            events.push(TriggerEvent::FrameBoundary);
        }

        events
    }
}
