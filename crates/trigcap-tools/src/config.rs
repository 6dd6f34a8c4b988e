//! Trigger settings loaded from TOML and command line overrides.
use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use trigcap::{LANES, Sample, TriggerControl};

/// Threshold applied to every lane when nothing else is configured.
pub const DEFAULT_THRESHOLD: Sample = 1000;
/// Default hold window in beats.
pub const DEFAULT_WINDOW_BEATS: u8 = 8;
/// Default frame length in beats.
pub const DEFAULT_PACKET_BEATS: u32 = 16;

/// Contents of a settings file. Missing keys take the defaults.
///
/// ```toml
/// thresholds = [1000, 1000, 1000, 1000]
/// window_beats = 8
/// packet_beats = 16
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerSettings {
    pub thresholds: [Sample; LANES],
    pub window_beats: u8,
    pub packet_beats: u32,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            thresholds: [DEFAULT_THRESHOLD; LANES],
            window_beats: DEFAULT_WINDOW_BEATS,
            packet_beats: DEFAULT_PACKET_BEATS,
        }
    }
}

/// Settings flags shared by the subcommands that need a trigger control.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// TOML settings file (thresholds, window_beats, packet_beats)
    #[arg(long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Threshold for every lane (overrides the settings file)
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<Sample>,

    /// Hold window in beats (overrides the settings file)
    #[arg(long)]
    pub window: Option<u8>,

    /// Frame length in beats, 0 for passthrough (overrides the settings file)
    #[arg(long)]
    pub packet: Option<u32>,
}

impl TriggerSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid trigger settings")
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        let settings = Self::from_toml_str(&text)
            .with_context(|| format!("in settings file: {}", path.display()))?;
        log::debug!("loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Settings file (or defaults) with the command line flags applied.
    pub fn resolve(args: &SettingsArgs) -> anyhow::Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(threshold) = args.threshold {
            settings.thresholds = [threshold; LANES];
        }
        if let Some(window) = args.window {
            settings.window_beats = window;
        }
        if let Some(packet) = args.packet {
            settings.packet_beats = packet;
        }
        Ok(settings)
    }

    /// Control inputs for these settings, without a clear.
    pub fn control(&self) -> TriggerControl {
        TriggerControl {
            thresholds: self.thresholds,
            window_beats: self.window_beats,
            packet_beats: self.packet_beats,
            clear_trigger: false,
        }
    }
}

/// Print the resolved control as TOML.
pub fn show(args: &SettingsArgs) -> anyhow::Result<()> {
    let control = TriggerSettings::resolve(args)?.control();
    let text = toml::to_string(&control).context("failed to serialize control")?;
    print!("{}", text);
    Ok(())
}
