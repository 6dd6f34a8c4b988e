use trigcap::{
    Beat, BeatOutput, CaptureBuilder, CoincidenceTrigger, LANES, StreamError, StreamResult,
    TriggerControl, TriggerStream,
};

fn hit(last: bool) -> Beat {
    Beat::with_first_sample(2000, last)
}

fn collect_outputs(stream: &mut TriggerStream) -> Vec<BeatOutput> {
    let mut outputs = Vec::new();
    for result in stream {
        match result {
            Ok(StreamResult::Beat(out)) => outputs.push(out),
            Ok(StreamResult::NeedsMoreData) | Ok(StreamResult::EndOfStream) => break,
            Err(e) => panic!("stream error: {}", e),
        }
    }
    outputs
}

#[test]
fn test_waits_for_every_lane() {
    let mut stream = TriggerStream::new();
    stream.set_control(TriggerControl::uniform(1000, 8, 0));

    // lane 3 lags behind the others
    for lane in 0..3 {
        for _ in 0..3 {
            stream.push_beat(lane, Beat::zeroed()).unwrap();
        }
    }
    assert_eq!(stream.next(), Some(Ok(StreamResult::NeedsMoreData)));
    assert_eq!(stream.starved_lanes(), vec![3]);
    assert_eq!(stream.processed_beats(), 0);
    assert_eq!(stream.trigger().beat_counter(), 0);

    stream.push_beat(3, Beat::zeroed()).unwrap();
    assert_eq!(collect_outputs(&mut stream).len(), 1);
    assert_eq!(stream.pending_beats(0), 2);
    assert_eq!(stream.pending_beats(3), 0);
    assert_eq!(stream.starved_lanes(), vec![3]);

    stream.push_beat(3, Beat::zeroed()).unwrap();
    stream.push_beat(3, Beat::zeroed()).unwrap();
    assert_eq!(collect_outputs(&mut stream).len(), 2);
    assert_eq!(stream.starved_lanes(), vec![0, 1, 2, 3]);
    assert_eq!(stream.processed_beats(), 3);
}

#[test]
fn test_lane_order_is_preserved() {
    let mut stream = TriggerStream::new();
    stream.set_control(TriggerControl::uniform(i16::MAX, 0, 0));

    for lane in 0..LANES {
        for n in 0..4i16 {
            let value = lane as i16 * 100 + n;
            stream.push_beat(lane, Beat::with_first_sample(value, false)).unwrap();
        }
    }
    let outputs = collect_outputs(&mut stream);
    assert_eq!(outputs.len(), 4);
    for (n, out) in outputs.iter().enumerate() {
        for lane in 0..LANES {
            assert_eq!(out.beats[lane].samples[0], lane as i16 * 100 + n as i16);
        }
    }
}

#[test]
fn test_stream_matches_direct_invocation() {
    let control = TriggerControl::uniform(1000, 4, 5);
    let pattern: Vec<[Beat; LANES]> = (0..40usize)
        .map(|b| {
            std::array::from_fn(|lane| {
                if (b + lane) % 4 == 0 {
                    hit(false)
                } else {
                    Beat::zeroed()
                }
            })
        })
        .collect();

    let mut direct = CoincidenceTrigger::new();
    let expected: Vec<BeatOutput> = pattern
        .iter()
        .map(|beats| direct.process_beat(*beats, &control))
        .collect();

    let mut stream = TriggerStream::new();
    stream.set_control(control);
    for beats in &pattern {
        stream.push_beats(*beats).unwrap();
    }
    assert!(expected[3].trigger_event);
    assert_eq!(collect_outputs(&mut stream), expected);
    assert_eq!(stream.trigger(), &direct);
}

#[test]
fn test_request_clear_is_one_shot() {
    let mut stream = TriggerStream::new();
    stream.set_control(TriggerControl::uniform(1000, 1, 0));

    stream.push_beats([hit(false); LANES]).unwrap();
    assert!(collect_outputs(&mut stream)[0].trigger_event);

    stream.request_clear();
    for _ in 0..3 {
        stream.push_beats([Beat::zeroed(); LANES]).unwrap();
    }
    let outputs = collect_outputs(&mut stream);
    let cleared: Vec<bool> = outputs.iter().map(|o| o.cleared).collect();
    assert_eq!(cleared, vec![true, false, false]);
    assert!(outputs.iter().all(|o| !o.trigger_event));
    assert!(!stream.control().clear_trigger);
}

#[test]
fn test_level_clear_holds_trigger_low() {
    let mut stream = TriggerStream::new();
    stream.set_control(TriggerControl::uniform(1000, 8, 0).with_clear(true));

    for _ in 0..3 {
        stream.push_beats([hit(false); LANES]).unwrap();
    }
    // clear runs before detection, so every beat re-latches at its own index
    let indices: Vec<u32> = collect_outputs(&mut stream)
        .iter()
        .map(|o| o.trigger_beat_index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_push_beats_is_atomic() {
    let mut stream = TriggerStream::new();
    stream.set_max_pending_beats(1);
    stream.push_beat(2, Beat::zeroed()).unwrap();

    assert_eq!(
        stream.push_beats([Beat::zeroed(); LANES]),
        Err(StreamError::QueueFull { lane: 2, limit: 1 })
    );
    assert_eq!(stream.pending_beats(0), 0);
    assert_eq!(stream.pending_beats(2), 1);
    assert_eq!(stream.max_pending_beats(), 1);
}

#[test]
fn test_reset_drops_queues_and_state() {
    let mut stream = TriggerStream::new();
    stream.set_control(TriggerControl::uniform(1000, 8, 4));
    stream.push_beats([hit(false); LANES]).unwrap();
    collect_outputs(&mut stream);
    stream.push_beat(0, Beat::zeroed()).unwrap();
    stream.request_clear();

    stream.reset();
    assert_eq!(stream.processed_beats(), 0);
    assert_eq!(stream.pending_beats(0), 0);
    assert_eq!(stream.trigger(), &CoincidenceTrigger::new());

    // reset keeps the configured control but drops the pending clear
    stream.push_beats([Beat::zeroed(); LANES]).unwrap();
    let outputs = collect_outputs(&mut stream);
    assert!(!outputs[0].cleared);
    assert_eq!(stream.trigger().frame_position(), 1);
}

#[test]
fn test_replay_uses_recorded_control() {
    let mut b = CaptureBuilder::new();
    b.set_control(TriggerControl::uniform(1000, 8, 4));
    b.clear_next();
    b.add_idle(3);
    // raise the thresholds: the hits below no longer count
    b.set_control(TriggerControl::uniform(3000, 8, 4));
    b.add_beats([hit(false); LANES]);
    b.set_control(TriggerControl::uniform(1000, 8, 4));
    b.add_beats([hit(false); LANES]);
    let doc = b.finalize();

    let mut stream = TriggerStream::from_document(doc);
    let outputs = collect_outputs(&mut stream);
    assert_eq!(outputs.len(), 5);
    assert!(outputs[0].cleared);
    assert!(!outputs[3].trigger_event);
    assert!(outputs[4].trigger_event);
    assert_eq!(outputs[4].trigger_beat_index, 4);
    let lasts: Vec<bool> = outputs.iter().map(|o| o.beats[0].last).collect();
    assert_eq!(lasts, vec![false, false, false, true, false]);

    assert_eq!(stream.next(), Some(Ok(StreamResult::EndOfStream)));
    assert_eq!(stream.next(), Some(Ok(StreamResult::EndOfStream)));
}

#[test]
fn test_replay_with_override_keeps_recorded_clears() {
    let mut b = CaptureBuilder::new();
    b.set_control(TriggerControl::uniform(3000, 8, 0));
    b.add_beats([hit(false); LANES]);
    b.clear_next();
    b.add_beats([hit(false); LANES]);
    let doc = b.finalize();

    let mut recorded = TriggerStream::from_document(doc.clone());
    assert!(collect_outputs(&mut recorded).iter().all(|o| !o.trigger_event));

    let mut overridden = TriggerStream::from_document(doc);
    overridden.set_control_override(Some(TriggerControl::uniform(1000, 8, 0)));
    let outputs = collect_outputs(&mut overridden);
    assert!(outputs[0].trigger_event);
    assert!(!outputs[0].cleared);
    assert!(outputs[1].cleared);
    assert_eq!(outputs[1].trigger_beat_index, 1);
}

#[test]
fn test_replay_rewinds_on_reset() {
    let mut b = CaptureBuilder::new();
    b.set_control(TriggerControl::uniform(1000, 2, 0));
    b.add_idle(2);
    b.add_beats([hit(false); LANES]);
    let doc = b.finalize();

    let mut stream = TriggerStream::from_document(doc);
    let first = collect_outputs(&mut stream);
    stream.reset();
    let second = collect_outputs(&mut stream);
    assert_eq!(first, second);
    assert_eq!(stream.processed_beats(), 3);
}

#[test]
fn test_replay_request_clear() {
    let mut b = CaptureBuilder::new();
    b.set_control(TriggerControl::uniform(1000, 8, 0));
    b.add_beats([hit(false); LANES]);
    b.add_idle(2);
    let doc = b.finalize();

    let mut stream = TriggerStream::from_document(doc);
    assert!(matches!(stream.next(), Some(Ok(StreamResult::Beat(o))) if o.trigger_event));
    stream.request_clear();
    match stream.next() {
        Some(Ok(StreamResult::Beat(out))) => {
            assert!(out.cleared);
            // holds are still open: fresh latch on the clearing beat
            assert!(out.trigger_event);
            assert_eq!(out.trigger_beat_index, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}
