use trigcap::{Beat, BeatOutput, CoincidenceTrigger, LANES, Sample, TriggerControl};

const THRESHOLD: Sample = 1000;
const AMPLITUDE: Sample = 2000;
const WINDOW: u8 = 8;
const PACKET: u32 = 16;

/// Beats where lane `i` carries `AMPLITUDE` iff `hits[i] == b`.
fn beats_at(hits: [i32; LANES], b: i32) -> [Beat; LANES] {
    hits.map(|h| Beat::with_first_sample(if h == b { AMPLITUDE } else { 0 }, false))
}

fn idle() -> [Beat; LANES] {
    [Beat::zeroed(); LANES]
}

/// Reference model of the shared frame phase, kept alongside the trigger.
struct FramePhase {
    packet_beats: u32,
    phase: u32,
}

impl FramePhase {
    fn expect_last(&self) -> bool {
        self.packet_beats != 0 && self.phase == self.packet_beats - 1
    }

    fn advance(&mut self) {
        if self.packet_beats != 0 {
            self.phase = if self.expect_last() { 0 } else { self.phase + 1 };
        }
    }
}

fn assert_lanes_last(out: &BeatOutput, expected: bool, beat: i32) {
    for (lane, b) in out.beats.iter().enumerate() {
        assert_eq!(b.last, expected, "last flag mismatch at beat {} lane {}", beat, lane);
    }
}

#[test]
fn test_scenario_coincidence_within_window() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);
    let hits = [10, 12, 15, 17];

    let mut observed = None;
    for b in 0..30 {
        let out = trigger.process_beat(beats_at(hits, b), &control);
        if b < 17 {
            assert!(!out.trigger_event, "triggered early at beat {}", b);
        }
        if out.trigger_event && observed.is_none() {
            observed = Some((b, out.trigger_beat_index));
        }
    }

    assert_eq!(observed, Some((17, 17)));
    assert!(trigger.trigger_event());
}

#[test]
fn test_scenario_out_of_window_no_trigger() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);
    let hits = [5, 20, 21, 22];

    for b in 0..40 {
        let out = trigger.process_beat(beats_at(hits, b), &control);
        assert!(!out.trigger_event, "unexpected trigger at beat {}", b);
    }
    assert!(!trigger.trigger_event());
}

#[test]
fn test_scenario_packet_boundary() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, PACKET);

    for b in 0..16 {
        let c = control.with_clear(b == 0);
        let out = trigger.process_beat(idle(), &c);
        assert_lanes_last(&out, b == 15, b);
    }
    assert_eq!(trigger.frame_position(), 0);
}

/// Warm-up, coincidence, clear and out-of-window phases on one trigger
/// instance with frame re-stamping checked on every beat.
#[test]
fn test_full_capture_session() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, PACKET);
    let mut phase = FramePhase {
        packet_beats: PACKET,
        phase: 0,
    };
    let mut global_beat: u32 = 0;

    // warm-up, clear on the first beat
    for b in 0..16 {
        let out = trigger.process_beat(idle(), &control.with_clear(b == 0));
        assert_lanes_last(&out, phase.expect_last(), b);
        phase.advance();
        global_beat += 1;
    }
    assert!(!trigger.trigger_event());

    // coincidence within the window
    let hits = [10, 12, 15, 17];
    let mut observed_global = None;
    for b in 0..30 {
        let out = trigger.process_beat(beats_at(hits, b), &control);
        assert_lanes_last(&out, phase.expect_last(), b);
        let this_global = global_beat;
        global_beat += 1;
        phase.advance();
        if b >= 17 && out.trigger_event {
            observed_global = Some(this_global);
            assert_eq!(out.trigger_beat_index, this_global);
            break;
        }
    }
    assert_eq!(observed_global, Some(16 + 17));

    // clear; the frame restarts at the clearing beat
    phase.phase = 0;
    let out = trigger.process_beat(idle(), &control.with_clear(true));
    assert_lanes_last(&out, phase.expect_last(), 1000);
    assert!(!out.trigger_event);
    phase.advance();

    // hits spread beyond the window
    let hits = [5, 20, 21, 22];
    for b in 0..40 {
        let out = trigger.process_beat(beats_at(hits, b), &control);
        assert_lanes_last(&out, phase.expect_last(), b);
        assert!(!out.trigger_event);
        phase.advance();
    }
}

#[test]
fn test_sticky_until_clear() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, 2, 0);

    let out = trigger.process_beat(beats_at([0; LANES], 0), &control);
    assert!(out.trigger_event);
    let latched = out.trigger_beat_index;

    // long silence: holds decay to zero but the trigger stays latched
    for _ in 0..100 {
        let out = trigger.process_beat(idle(), &control);
        assert!(out.trigger_event);
        assert_eq!(out.trigger_beat_index, latched);
    }
    assert_eq!(trigger.holds(), [0; LANES]);

    // a second coincidence does not move the latched index
    let out = trigger.process_beat(beats_at([0; LANES], 0), &control);
    assert_eq!(out.trigger_beat_index, latched);

    let out = trigger.process_beat(idle(), &control.with_clear(true));
    // holds are still open from the previous beat, so the clearing beat
    // re-latches immediately
    assert!(out.trigger_event);
    assert_eq!(out.trigger_beat_index, 102);
}

#[test]
fn test_clear_then_fresh_trigger() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, 1, 0);

    trigger.process_beat(beats_at([0; LANES], 0), &control);
    assert!(trigger.trigger_event());
    assert_eq!(trigger.trigger_beat_index(), 0);

    // window 1: holds are gone after one quiet beat
    let out = trigger.process_beat(idle(), &control.with_clear(true));
    assert!(!out.trigger_event);

    for _ in 0..5 {
        assert!(!trigger.process_beat(idle(), &control).trigger_event);
    }

    let out = trigger.process_beat(beats_at([0; LANES], 0), &control);
    assert!(out.trigger_event);
    assert_eq!(out.trigger_beat_index, 7);
}

#[test]
fn test_window_decay_boundary() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);

    // lane 0 hits at beat 0
    trigger.process_beat(beats_at([0, -1, -1, -1], 0), &control);
    for _ in 1..WINDOW {
        trigger.process_beat(idle(), &control);
    }
    // beat WINDOW - 1: last beat with the hold open
    assert_eq!(trigger.hold(0), Some(1));

    // beat WINDOW: the other lanes hit, lane 0's hold has just expired
    let out = trigger.process_beat(beats_at([-1, 0, 0, 0], 0), &control);
    assert_eq!(trigger.hold(0), Some(0));
    assert!(!out.trigger_event);
}

#[test]
fn test_coincidence_on_last_open_beat() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);

    trigger.process_beat(beats_at([0, -1, -1, -1], 0), &control);
    for _ in 1..(WINDOW as i32 - 1) {
        trigger.process_beat(idle(), &control);
    }
    // beat WINDOW - 1: lane 0's hold decays to 1, still open
    let out = trigger.process_beat(beats_at([-1, 0, 0, 0], 0), &control);
    assert!(out.trigger_event);
    assert_eq!(out.trigger_beat_index, WINDOW as u32 - 1);
}

#[test]
fn test_per_lane_thresholds() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl {
        thresholds: [100, 200, 300, 400],
        window_beats: 4,
        packet_beats: 0,
        clear_trigger: false,
    };

    let beats = [250, 250, 250, 250].map(|v| Beat::with_first_sample(v, false));
    let out = trigger.process_beat(beats, &control);
    assert_eq!(out.lane_hits, [true, true, false, false]);
    assert!(!out.trigger_event);

    let beats = [0, 0, -301, 401].map(|v| Beat::with_first_sample(v, false));
    let out = trigger.process_beat(beats, &control);
    assert_eq!(out.lane_hits, [false, false, true, true]);
    assert!(out.trigger_event);
    assert_eq!(out.trigger_beat_index, 1);
}

#[test]
fn test_most_negative_sample_never_hits() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(0, WINDOW, 0);
    let out = trigger.process_beat([Beat::with_first_sample(i16::MIN, false); LANES], &control);
    assert_eq!(out.lane_hits, [false; LANES]);
    assert_eq!(trigger.holds(), [0; LANES]);
}

#[test]
fn test_passthrough_preserves_input_flags() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);

    for b in 0..20usize {
        let input: [Beat; LANES] =
            std::array::from_fn(|lane| Beat::zeroed().with_last((b + lane) % 3 == 0));
        let out = trigger.process_beat(input, &control);
        assert_eq!(out.beats, input);
    }
    assert_eq!(trigger.frame_position(), 0);
}

#[test]
fn test_restamp_overrides_input_flags_but_keeps_data() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 3);

    for b in 0..9 {
        let mut input: [Beat; LANES] = std::array::from_fn(|lane| {
            let mut beat = Beat::with_first_sample((b * 10 + lane as i16) as Sample, true);
            beat.keep = 0x00FF_00FF;
            beat
        });
        input[1].last = false;
        let out = trigger.process_beat(input, &control);
        for lane in 0..LANES {
            assert_eq!(out.beats[lane].samples, input[lane].samples);
            assert_eq!(out.beats[lane].keep, 0x00FF_00FF);
            assert_eq!(out.beats[lane].last, b % 3 == 2);
        }
    }
}

#[test]
fn test_frame_periodicity_with_control_changes() {
    let mut trigger = CoincidenceTrigger::new();
    let mut boundaries = Vec::new();

    for b in 0..24u32 {
        let control = TriggerControl::uniform(THRESHOLD, WINDOW, 4);
        let out = trigger.process_beat(idle(), &control);
        if out.beats[0].last {
            boundaries.push(b);
        }
    }
    assert_eq!(boundaries, vec![3, 7, 11, 15, 19, 23]);

    // switching to passthrough leaves the position untouched
    let passthrough = TriggerControl::uniform(THRESHOLD, WINDOW, 0);
    trigger.process_beat(idle(), &TriggerControl::uniform(THRESHOLD, WINDOW, 4));
    assert_eq!(trigger.frame_position(), 1);
    trigger.process_beat(idle(), &passthrough);
    assert_eq!(trigger.frame_position(), 1);
}

#[test]
fn test_packet_of_one_marks_every_beat() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 1);
    for b in 0..5 {
        let out = trigger.process_beat(idle(), &control);
        assert_lanes_last(&out, true, b);
    }
}

#[test]
fn test_clear_restarts_frame() {
    let mut trigger = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 4);

    for _ in 0..2 {
        trigger.process_beat(idle(), &control);
    }
    let mut lasts = Vec::new();
    for b in 0..8 {
        let out = trigger.process_beat(idle(), &control.with_clear(b == 0));
        lasts.push(out.beats[0].last);
    }
    assert_eq!(
        lasts,
        vec![false, false, false, true, false, false, false, true]
    );
}

#[test]
fn test_instances_are_independent() {
    let mut a = CoincidenceTrigger::new();
    let mut b = CoincidenceTrigger::new();
    let control = TriggerControl::uniform(THRESHOLD, WINDOW, 0);

    a.process_beat(beats_at([0; LANES], 0), &control);
    assert!(a.trigger_event());
    assert!(!b.trigger_event());
    assert_eq!(b.beat_counter(), 0);

    b.process_beat(idle(), &control);
    assert_eq!(a.beat_counter(), 1);
    assert_eq!(b.beat_counter(), 1);
}
