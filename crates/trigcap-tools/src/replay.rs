use std::cell::RefCell;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use trigcap::{CaptureDocument, LANES, TriggerCallbackStream, TriggerControl, TriggerEvent};

/// Outcome of replaying a capture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub beats: u64,
    /// `(latched beat index, stream position)` of every trigger.
    pub triggers: Vec<(u32, u64)>,
    pub clears: u64,
    pub frame_boundaries: u64,
    pub lane_hits: [u64; LANES],
}

/// Replay a capture through the trigger and collect the events.
///
/// With `control_override`, the recorded control inputs are replaced (the
/// recorded clears still apply). Every event is passed to `sink` with its
/// stream position.
pub fn replay<F>(
    doc: CaptureDocument,
    control_override: Option<TriggerControl>,
    mut sink: F,
) -> Result<ReplaySummary>
where
    F: FnMut(u64, &TriggerEvent),
{
    let summary = RefCell::new(ReplaySummary::default());

    let mut stream = TriggerCallbackStream::from_document(doc);
    stream.inner_mut().set_control_override(control_override);
    stream.on_event(|event, position| {
        let mut s = summary.borrow_mut();
        match *event {
            TriggerEvent::Cleared => s.clears += 1,
            TriggerEvent::LaneHit { lane } => s.lane_hits[lane as usize] += 1,
            TriggerEvent::Triggered { beat_index } => s.triggers.push((beat_index, position)),
            TriggerEvent::FrameBoundary => s.frame_boundaries += 1,
        }
        sink(position, event);
    });

    for result in &mut stream {
        result?;
    }
    let beats = stream.inner().processed_beats();
    drop(stream);

    let mut summary = summary.into_inner();
    summary.beats = beats;
    Ok(summary)
}

/// Replay a capture file and print its events and a summary.
pub fn run(
    path: &Path,
    data: Vec<u8>,
    control_override: Option<TriggerControl>,
    dry_run: bool,
) -> Result<ReplaySummary> {
    let doc = CaptureDocument::try_from(data.as_slice())
        .with_context(|| format!("failed to parse capture: {}", path.display()))?;

    if !dry_run {
        println!("=== Capture: {} ===", path.display());
        println!("Records: {}", doc.len());
        if let Some(control) = &control_override {
            println!(
                "Control override: thresholds={:?} window={} packet={}",
                control.thresholds, control.window_beats, control.packet_beats
            );
        }
        println!();
        println!("{:<12} Event", "Beat");
        println!("{}", "-".repeat(40));
    }

    let summary = replay(doc, control_override, |position, event| {
        if !dry_run {
            println!("{:<12} {}", position, describe(event));
        }
    })?;

    log::info!(
        "replayed {} beats, {} trigger(s)",
        summary.beats,
        summary.triggers.len()
    );

    if !dry_run {
        println!();
        print_summary(&summary);
    }
    Ok(summary)
}

fn describe(event: &TriggerEvent) -> String {
    match event {
        TriggerEvent::Cleared => "clear".to_string(),
        TriggerEvent::LaneHit { lane } => format!("lane {} hit", lane),
        TriggerEvent::Triggered { beat_index } => format!("TRIGGER (latched beat {})", beat_index),
        TriggerEvent::FrameBoundary => "frame end".to_string(),
    }
}

fn print_summary(summary: &ReplaySummary) {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![Cell::new("Beats"), Cell::new(summary.beats)]);
    table.add_row(vec![Cell::new("Clears"), Cell::new(summary.clears)]);
    table.add_row(vec![
        Cell::new("Frame boundaries"),
        Cell::new(summary.frame_boundaries),
    ]);
    let triggers = if summary.triggers.is_empty() {
        "none".to_string()
    } else {
        summary
            .triggers
            .iter()
            .map(|(index, position)| format!("{} @ {}", index, position))
            .collect::<Vec<_>>()
            .join(", ")
    };
    table.add_row(vec![Cell::new("Triggers"), Cell::new(triggers)]);
    for (lane, hits) in summary.lane_hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("Lane {} hits", lane)),
            Cell::new(hits),
        ]);
    }
    println!("{}", table);
}
