//! Four-lane coincidence trigger.
//!
//! `CoincidenceTrigger` is the per-beat state machine. Every call to
//! [`CoincidenceTrigger::process_beat`] consumes exactly one beat per lane and
//! produces exactly one beat per lane, in this order:
//!
//! 1. clear (sticky flag and frame position)
//! 2. frame-boundary re-stamp of the passthrough beats
//! 3. per-lane threshold hit detection
//! 4. per-lane hold window update
//! 5. four-way coincidence test and sticky latch
//! 6. outputs, then the beat counter advances
//!
//! All arithmetic is fixed width and wraps; the operation cannot fail.

use crate::beat::{Beat, Sample};

/// Number of lock-stepped lanes.
pub const LANES: usize = 4;

/// Control inputs for one invocation.
///
/// Every field is read fresh on each call; there is no staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerControl {
    /// Per-lane amplitude threshold. A lane hits when a sample's magnitude
    /// is strictly greater.
    pub thresholds: [Sample; LANES],
    /// Hold duration in beats after a hit.
    pub window_beats: u8,
    /// Frame length in beats. `0` passes the input end-of-frame flags through.
    pub packet_beats: u32,
    /// Clear the sticky trigger and the frame position before this beat.
    pub clear_trigger: bool,
}

impl TriggerControl {
    /// Control with the same threshold on every lane.
    pub fn uniform(threshold: Sample, window_beats: u8, packet_beats: u32) -> Self {
        Self {
            thresholds: [threshold; LANES],
            window_beats,
            packet_beats,
            clear_trigger: false,
        }
    }

    /// Copy of this control with `clear_trigger` set to `clear`.
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear_trigger = clear;
        self
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatOutput {
    /// Passthrough beats with re-stamped end-of-frame flags.
    pub beats: [Beat; LANES],
    /// Sticky trigger flag after this beat.
    pub trigger_event: bool,
    /// Beat counter value latched when the trigger last fired.
    pub trigger_beat_index: u32,
    /// Lanes that saw a threshold-exceeding sample on this beat.
    pub lane_hits: [bool; LANES],
    /// Whether a clear was applied on this beat.
    pub cleared: bool,
}

/// Coincidence trigger state.
///
/// State is created zeroed and only changes through `process_beat`, or is
/// returned to its constructed form with `reset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoincidenceTrigger {
    /// Per-lane hold countdown.
    hold: [u8; LANES],
    /// Latched coincidence flag.
    sticky_triggered: bool,
    /// Beats processed, wrapping at 2^32.
    beat_counter: u32,
    /// `beat_counter` at the latch; stale after a clear.
    latched_trigger_beat: u32,
    /// Position within the current frame. Shared by all lanes.
    frame_position: u32,
}

impl CoincidenceTrigger {
    /// Create a trigger with all state zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one beat on every lane.
    ///
    /// # Examples
    ///
    /// ```
    /// use trigcap::{Beat, CoincidenceTrigger, TriggerControl};
    ///
    /// let mut trigger = CoincidenceTrigger::new();
    /// let control = TriggerControl::uniform(1000, 8, 0);
    ///
    /// let hit = Beat::with_first_sample(2000, false);
    /// let out = trigger.process_beat([hit; 4], &control);
    /// assert!(out.trigger_event);
    /// assert_eq!(out.trigger_beat_index, 0);
    /// assert_eq!(trigger.beat_counter(), 1);
    /// ```
    pub fn process_beat(&mut self, input: [Beat; LANES], control: &TriggerControl) -> BeatOutput {
        if control.clear_trigger {
            self.sticky_triggered = false;
            self.frame_position = 0;
            log::debug!("trigger cleared at beat {}", self.beat_counter);
        }

        let beats = self.restamp(input, control.packet_beats);

        let lane_hits: [bool; LANES] =
            std::array::from_fn(|lane| input[lane].exceeds(control.thresholds[lane]));

        for (hold, &hit) in self.hold.iter_mut().zip(lane_hits.iter()) {
            if hit {
                *hold = control.window_beats;
            } else if *hold > 0 {
                *hold -= 1;
            }
        }

        if !self.sticky_triggered && self.hold.iter().all(|&h| h > 0) {
            self.sticky_triggered = true;
            self.latched_trigger_beat = self.beat_counter;
            log::debug!(
                "coincidence latched at beat {} (holds {:?})",
                self.beat_counter,
                self.hold
            );
        }

        let output = BeatOutput {
            beats,
            trigger_event: self.sticky_triggered,
            trigger_beat_index: self.latched_trigger_beat,
            lane_hits,
            cleared: control.clear_trigger,
        };

        self.beat_counter = self.beat_counter.wrapping_add(1);
        output
    }

    /// Copy the input beats and stamp the shared end-of-frame flag.
    fn restamp(&mut self, input: [Beat; LANES], packet_beats: u32) -> [Beat; LANES] {
        if packet_beats == 0 {
            return input;
        }

        let last = self.frame_position == packet_beats - 1;
        self.frame_position = if last {
            0
        } else {
            self.frame_position.wrapping_add(1)
        };
        input.map(|beat| beat.with_last(last))
    }

    /// Return every field to its constructed state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current sticky trigger flag.
    pub fn trigger_event(&self) -> bool {
        self.sticky_triggered
    }

    /// Beat index latched by the most recent trigger.
    ///
    /// Meaningful only while `trigger_event()` is true.
    pub fn trigger_beat_index(&self) -> u32 {
        self.latched_trigger_beat
    }

    /// Hold counter of `lane`, or `None` for an out-of-range lane.
    pub fn hold(&self, lane: usize) -> Option<u8> {
        self.hold.get(lane).copied()
    }

    /// All hold counters.
    pub fn holds(&self) -> [u8; LANES] {
        self.hold
    }

    /// Number of beats processed so far, modulo 2^32.
    pub fn beat_counter(&self) -> u32 {
        self.beat_counter
    }

    /// Position of the next beat within the current frame.
    pub fn frame_position(&self) -> u32 {
        self.frame_position
    }
}
