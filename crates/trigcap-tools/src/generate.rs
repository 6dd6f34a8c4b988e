use std::path::Path;

use anyhow::{Result, bail};
use trigcap::{Beat, CaptureBuilder, CaptureDocument, LANES, Sample, TriggerControl};

use crate::io::write_capture_bytes;

/// Single-hit stimulus: lane `i` pulses once at beat `hits[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    /// Beat (counted after the warm-up) at which each lane pulses.
    pub hits: [u32; LANES],
    /// Beats following the warm-up.
    pub beats: u32,
    /// Pulse amplitude, placed in sample 0.
    pub amplitude: Sample,
    /// Silent beats before the stimulus.
    pub warmup: u32,
    /// Assert a one-shot clear on the first recorded beat.
    pub clear_first: bool,
}

impl Stimulus {
    /// Convert the `--hits` argument list into lane hit positions.
    pub fn hits_from_args(values: &[u32]) -> Result<[u32; LANES]> {
        match <[u32; LANES]>::try_from(values) {
            Ok(hits) => Ok(hits),
            Err(_) => bail!(
                "--hits expects {} comma separated beats, got {}",
                LANES,
                values.len()
            ),
        }
    }

    /// Build the capture for this stimulus under `control`.
    pub fn build(&self, control: TriggerControl) -> CaptureDocument {
        let mut builder = CaptureBuilder::new();
        builder.set_control(control);
        if self.clear_first {
            builder.clear_next();
        }
        builder.add_idle(self.warmup as usize);
        for b in 0..self.beats {
            let beats = self.hits.map(|hit| {
                let value = if hit == b { self.amplitude } else { 0 };
                Beat::with_first_sample(value, false)
            });
            builder.add_beats(beats);
        }
        builder.finalize()
    }
}

/// Generate a capture file for `stimulus`.
pub fn generate(output: &Path, stimulus: &Stimulus, control: TriggerControl) -> Result<()> {
    if let Some(lane) = stimulus.hits.iter().position(|&h| h >= stimulus.beats) {
        log::warn!(
            "lane {} hit at beat {} falls outside the {} generated beats",
            lane,
            stimulus.hits[lane],
            stimulus.beats
        );
    }

    let doc = stimulus.build(control);
    let bytes: Vec<u8> = (&doc).into();
    write_capture_bytes(output, &bytes)?;
    log::info!(
        "wrote {} records ({} bytes) to {}",
        doc.len(),
        bytes.len(),
        output.display()
    );
    Ok(())
}
