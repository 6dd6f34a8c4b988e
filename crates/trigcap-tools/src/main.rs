use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod capture;
mod config;
mod generate;
mod io;
mod replay;

use config::{SettingsArgs, TriggerSettings};
use generate::Stimulus;
use io::read_capture_bytes;
use trigcap::Sample;

/// trigcap command line tools
#[derive(Parser)]
#[command(
    name = "trigcap",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a capture in which each lane pulses once
    Generate {
        /// Output file (.gz or .tcz is gzip-compressed; use '-' for stdout)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Beat at which each lane pulses, e.g. 10,12,15,17
        #[arg(long, value_delimiter = ',', required = true)]
        hits: Vec<u32>,

        /// Number of beats after the warm-up
        #[arg(long, default_value_t = 40)]
        beats: u32,

        /// Silent beats before the stimulus
        #[arg(long, default_value_t = 0)]
        warmup: u32,

        /// Pulse amplitude
        #[arg(long, default_value_t = 2000, allow_negative_numbers = true)]
        amplitude: Sample,

        /// Assert a clear on the first beat
        #[arg(long)]
        clear_first: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Show summary info for a capture (accepts .tcap, .tcz, .gz; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Run parse -> serialize -> re-parse roundtrip test and compare binaries
    Test {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replay a capture through the trigger and print events
    Run {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Replace the recorded control with the configured settings
        #[arg(long = "override")]
        override_control: bool,

        /// Process the capture without printing events
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the resolved trigger control as TOML
    Config {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Generate {
            output,
            hits,
            beats,
            warmup,
            amplitude,
            clear_first,
            settings,
        } => {
            let stimulus = Stimulus {
                hits: Stimulus::hits_from_args(&hits)?,
                beats,
                amplitude,
                warmup,
                clear_first,
            };
            let control = TriggerSettings::resolve(&settings)?.control();
            generate::generate(&output, &stimulus, control)?;
        }
        Commands::Info { file } => {
            let bytes = read_capture_bytes(&file)?;
            capture::info(&file, bytes)?;
        }
        Commands::Test { file } => {
            let bytes = read_capture_bytes(&file)?;
            capture::test_roundtrip(&file, bytes)?;
        }
        Commands::Run {
            file,
            override_control,
            dry_run,
            settings,
        } => {
            let control_override = if override_control {
                Some(TriggerSettings::resolve(&settings)?.control())
            } else {
                if settings.config.is_some()
                    || settings.threshold.is_some()
                    || settings.window.is_some()
                    || settings.packet.is_some()
                {
                    log::warn!("settings are ignored without --override");
                }
                None
            };
            let bytes = read_capture_bytes(&file)?;
            replay::run(&file, bytes, control_override, dry_run)?;
        }
        Commands::Config { settings } => {
            config::show(&settings)?;
        }
    }

    Ok(())
}
