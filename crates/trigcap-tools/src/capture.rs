use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use trigcap::{CaptureDocument, LANES, Sample};

/// Per-lane statistics over all records of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneSummary {
    /// Beats exceeding the threshold recorded with them.
    pub hits: u64,
    /// Largest sample magnitude seen.
    pub peak: Sample,
    /// Beats carrying an input end-of-frame flag.
    pub frame_ends: u64,
}

/// Aggregate statistics of a capture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSummary {
    pub records: usize,
    pub clears: usize,
    /// Number of times the control inputs change between records.
    pub control_changes: usize,
    pub lanes: [LaneSummary; LANES],
}

impl CaptureSummary {
    pub fn from_document(doc: &CaptureDocument) -> Self {
        let mut summary = CaptureSummary {
            records: doc.len(),
            ..CaptureSummary::default()
        };

        let mut previous = None;
        for record in doc {
            if record.control.clear_trigger {
                summary.clears += 1;
            }
            let control = record.control.with_clear(false);
            if previous.is_some_and(|p| p != control) {
                summary.control_changes += 1;
            }
            previous = Some(control);

            for (lane, beat) in record.beats.iter().enumerate() {
                let stats = &mut summary.lanes[lane];
                if beat.exceeds(record.control.thresholds[lane]) {
                    stats.hits += 1;
                }
                stats.peak = stats.peak.max(beat.peak());
                if beat.last {
                    stats.frame_ends += 1;
                }
            }
        }
        summary
    }
}

/// Print header fields and per-lane statistics of a capture.
pub fn info(path: &Path, data: Vec<u8>) -> Result<()> {
    let doc = CaptureDocument::try_from(data.as_slice())
        .with_context(|| format!("failed to parse capture: {}", path.display()))?;
    let summary = CaptureSummary::from_document(&doc);

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let rows: Vec<(&str, String)> = vec![
        ("File", path.display().to_string()),
        ("Size", format!("{} bytes", data.len())),
        (
            "Version",
            format!("0x{:08X} (major {})", doc.header.version, doc.header.major_version()),
        ),
        ("Header size", format!("0x{:X}", doc.header.header_size)),
        ("Record size", format!("0x{:X}", doc.header.record_size)),
        ("Records", summary.records.to_string()),
        ("Clears", summary.clears.to_string()),
        ("Control changes", summary.control_changes.to_string()),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("{}", table);

    if let Some(first) = doc.records.first() {
        println!(
            " initial control: thresholds={:?} window={} packet={}",
            first.control.thresholds, first.control.window_beats, first.control.packet_beats
        );
    }
    println!();

    let mut lanes = Table::new();
    lanes.load_preset(NOTHING);
    lanes.set_content_arrangement(ContentArrangement::Dynamic);
    lanes.set_header(vec![
        Cell::new("Lane"),
        Cell::new("Hits"),
        Cell::new("Peak"),
        Cell::new("Frame ends"),
    ]);
    for (lane, stats) in summary.lanes.iter().enumerate() {
        lanes.add_row(vec![
            Cell::new(lane),
            Cell::new(stats.hits),
            Cell::new(stats.peak),
            Cell::new(stats.frame_ends),
        ]);
    }
    println!("{}", lanes);

    Ok(())
}

/// Parse, serialize and re-parse a capture and compare the results.
///
/// A capture written by another version may carry a larger header or
/// records; those round-trip semantically but not byte for byte.
pub fn test_roundtrip(path: &Path, data: Vec<u8>) -> Result<()> {
    let doc = CaptureDocument::try_from(data.as_slice())
        .with_context(|| format!("\"{}\": parse error", path.display()))?;

    let rebuilt: Vec<u8> = (&doc).into();
    let reparsed = CaptureDocument::try_from(rebuilt.as_slice()).with_context(|| {
        format!(
            "\"{}\": re-parse of {} serialized bytes failed",
            path.display(),
            rebuilt.len()
        )
    })?;

    if rebuilt == data {
        println!(
            "\"{}\": roundtrip: serialized matches original ({} bytes)",
            path.display(),
            rebuilt.len()
        );
        return Ok(());
    }

    if reparsed.records == doc.records {
        println!(
            "\"{}\": roundtrip: records match (original {} bytes, serialized {} bytes)",
            path.display(),
            data.len(),
            rebuilt.len()
        );
        return Ok(());
    }

    let first_diff = doc
        .records
        .iter()
        .zip(&reparsed.records)
        .position(|(a, b)| a != b)
        .unwrap_or(doc.len().min(reparsed.len()));
    bail!(
        "\"{}\": roundtrip: MISMATCH at record {} (original {} bytes, serialized {} bytes)",
        path.display(),
        first_diff,
        data.len(),
        rebuilt.len()
    )
}
