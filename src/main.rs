//! RTP hint planner
//!
//! Decides how the tracks of an MP4 file (or a track manifest) are streamed
//! over RTP: which tracks are hinted, their delivery groups, dynamic payload
//! types and bandwidth, and which single-sample systems tracks are carried
//! inline in the session description.

mod config;
mod config_file;
mod error;
mod report;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtp_hint_lib::plan_file;

use crate::config::{parse_flags, HinterConfig, LogFormat};
use crate::config_file::{generate_default_config, ConfigFile};
use crate::error::Result;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "rtp-hinter";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MP4 file, or a .toml/.json track manifest
    #[arg(required_unless_present = "generate_config")]
    input: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a default configuration file to this path and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<PathBuf>,

    /// Maximum RTP packet size in bytes
    #[arg(long)]
    mtu: Option<u32>,

    /// Maximum packet duration in milliseconds
    #[arg(long)]
    max_ptime: Option<u32>,

    /// RTP clock rate (0 = media timescale)
    #[arg(long)]
    rtp_rate: Option<u32>,

    /// Copy sample data into hint tracks
    #[arg(long)]
    copy: bool,

    /// Interleave access units in RTP packets
    #[arg(long)]
    interleave: bool,

    /// Keep a regular object descriptor profile (no sample embedding)
    #[arg(long)]
    iod: bool,

    /// Put audio and video in a single delivery group
    #[arg(long)]
    single_group: bool,

    /// Point every clock reference at the root descriptor track
    #[arg(long)]
    ocr: bool,

    /// Packing flag applied to every track (repeatable), e.g. SIGNAL_RAP
    #[arg(long = "flag", value_name = "NAME")]
    flags: Vec<String>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    fn apply(&self, config: &mut HinterConfig) -> Result<()> {
        let hint = &mut config.hint;
        if let Some(mtu) = self.mtu {
            hint.mtu = mtu;
        }
        if let Some(max_ptime) = self.max_ptime {
            hint.max_ptime = max_ptime;
        }
        if let Some(rtp_rate) = self.rtp_rate {
            hint.rtp_rate = rtp_rate;
        }
        hint.base_flags |= parse_flags(&self.flags)?;
        hint.copy_data |= self.copy;
        hint.interleave |= self.interleave;
        hint.regular_iod |= self.iod;
        hint.single_group |= self.single_group;
        hint.force_ocr |= self.ocr;
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<HinterConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigFile::from_file(path)?.into_hinter_config()?,
        None => HinterConfig::default(),
    };
    args.apply(&mut config)?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.generate_config {
        return match generate_default_config(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}: cannot write {}: {}", APP_NAME, path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);
    tracing::debug!("{} v{} - configuration: {:?}", APP_NAME, VERSION, config);

    let Some(input) = args.input.as_deref() else {
        return ExitCode::FAILURE;
    };
    match run(input, &config, args.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, config: &HinterConfig, json: bool) -> Result<()> {
    let plan = plan_file(input, &config.hint)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", report::render_text(&plan));
    }
    Ok(())
}

/// Initialize logging with tracing. Logs go to stderr, the plan to stdout.
fn init_logging(config: &HinterConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
