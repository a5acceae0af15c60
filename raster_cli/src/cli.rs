//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use raster_config::OffsetTarget;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Keeps the log file writer alive; taken and dropped to flush before exit.
pub static FILE_GUARD: OnceLock<Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> =
    OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "raster", version, about = "Raster acquisition run controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/raster_config.toml")]
    pub config: PathBuf,

    /// Persisted operator settings (offsets, custom plate); overrides the config
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Named pattern library (JSON)
    #[arg(long, value_name = "FILE")]
    pub patterns: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Which wells to visit.
#[derive(Args, Debug, Clone, Default)]
pub struct WellSelection {
    /// Comma-separated well labels in visit order (e.g. A01,B02 or Spot_3)
    #[arg(long, value_name = "LABELS", value_delimiter = ',', conflicts_with = "all")]
    pub wells: Vec<String>,
    /// Select every slot of the plate, row-major
    #[arg(long, action = ArgAction::SetTrue)]
    pub all: bool,
}

/// Offset slot for `set-offset`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OffsetTargetArg {
    Standard96,
    SlideA,
    SlideB,
}

impl From<OffsetTargetArg> for OffsetTarget {
    fn from(t: OffsetTargetArg) -> Self {
        match t {
            OffsetTargetArg::Standard96 => Self::Standard96,
            OffsetTargetArg::SlideA => Self::SlideA,
            OffsetTargetArg::SlideB => Self::SlideB,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite the method file, queue the acquisition and raster the selected wells
    Run {
        /// Acquisition file name (without .raw)
        #[arg(long)]
        name: String,
        #[command(flatten)]
        selection: WellSelection,
        /// Pattern name from the --patterns library; default is the well centre only
        #[arg(long, value_name = "NAME")]
        pattern: Option<String>,
        /// Print total runtime on completion
        #[arg(long, action = ArgAction::SetTrue)]
        print_runtime: bool,
    },
    /// Estimate per-well and total run time without touching hardware
    Preview {
        #[command(flatten)]
        selection: WellSelection,
        #[arg(long, value_name = "NAME")]
        pattern: Option<String>,
    },
    /// List every slot label with its well centre in millimeters
    Wells,
    /// Persist a plate offset to the --settings file
    SetOffset {
        #[arg(long, value_enum)]
        target: OffsetTargetArg,
        #[arg(long, value_name = "MM", allow_hyphen_values = true)]
        x: f64,
        #[arg(long, value_name = "MM", allow_hyphen_values = true)]
        y: f64,
    },
    /// Initiate the stage and return it home
    SelfCheck,
}
