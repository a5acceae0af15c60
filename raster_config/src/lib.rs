#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, persisted operator settings, and instrument file formats.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `settings` persists plate offsets and the custom plate layout.
//! - `method_file` reads and rewrites `Key,Value` instrument method files.
//! - `patterns` stores named raster patterns as JSON.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod method_file;
pub mod patterns;
pub mod settings;

pub use method_file::MethodFile;
pub use patterns::{PatternLibrary, PatternPoint};
pub use settings::{OffsetTarget, Settings, SettingsStore, TomlSettingsStore};

/// Upper bound on custom plate rows and on columns.
pub const MAX_CUSTOM_GRID: u32 = 1000;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlateKind {
    #[default]
    Standard96,
    Dual44,
    Custom,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct PlateSection {
    pub kind: PlateKind,
}

/// Operator-defined spot grid. Distances and diameter in millimeters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CustomPlateCfg {
    pub print_height: f64,
    pub print_width: f64,
    /// Top-left offset to the first spot centre.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Centre-to-centre spot distance.
    pub spot_distance_x: f64,
    pub spot_distance_y: f64,
    pub spot_diameter: f64,
    pub num_rows: u32,
    pub num_columns: u32,
}

impl Default for CustomPlateCfg {
    fn default() -> Self {
        Self {
            print_height: 26.0,
            print_width: 76.0,
            offset_x: 5.0,
            offset_y: 23.0,
            spot_distance_x: 3.0,
            spot_distance_y: 3.0,
            spot_diameter: 2.0,
            num_rows: 16,
            num_columns: 6,
        }
    }
}

impl CustomPlateCfg {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.num_rows == 0 {
            eyre::bail!("custom_plate.num_rows must be >= 1");
        }
        if self.num_columns == 0 {
            eyre::bail!("custom_plate.num_columns must be >= 1");
        }
        if self.num_rows > MAX_CUSTOM_GRID || self.num_columns > MAX_CUSTOM_GRID {
            eyre::bail!(
                "custom_plate.num_rows and custom_plate.num_columns must be <= {MAX_CUSTOM_GRID}"
            );
        }
        if !(self.spot_diameter.is_finite() && self.spot_diameter > 0.0) {
            eyre::bail!("custom_plate.spot_diameter must be > 0");
        }
        if !(self.offset_x.is_finite() && self.offset_x >= 0.0) {
            eyre::bail!("custom_plate.offset_x must be >= 0");
        }
        if !(self.offset_y.is_finite() && self.offset_y >= 0.0) {
            eyre::bail!("custom_plate.offset_y must be >= 0");
        }
        for (name, v) in [
            ("spot_distance_x", self.spot_distance_x),
            ("spot_distance_y", self.spot_distance_y),
            ("print_height", self.print_height),
            ("print_width", self.print_width),
        ] {
            if !(v.is_finite() && v > 0.0) {
                eyre::bail!("custom_plate.{name} must be > 0");
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
pub struct OffsetXY {
    pub x: f64,
    pub y: f64,
}

/// Per-plate-type stage translation in millimeters plus the startup delay.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OffsetsCfg {
    /// Wait after homing before the first approach move (seconds).
    pub startup_delay_s: f64,
    pub standard96: OffsetXY,
    pub slide_a: OffsetXY,
    pub slide_b: OffsetXY,
}

impl Default for OffsetsCfg {
    fn default() -> Self {
        Self {
            startup_delay_s: 8.0,
            standard96: OffsetXY { x: 10.0, y: 1.0 },
            slide_a: OffsetXY { x: 46.0, y: 11.0 },
            slide_b: OffsetXY { x: 46.0, y: 45.0 },
        }
    }
}

/// Constants used for time estimates and the per-well dwell passed to the method file.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TimingCfg {
    /// Average stage move between two pattern points.
    pub movement_time_s: f64,
    /// Time spent at each pattern point.
    pub dwell_time_s: f64,
    pub setup_time_s: f64,
    pub between_wells_time_s: f64,
    /// Lower clamp for the per-well dwell written to the method file.
    pub min_well_dwell_s: f64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            movement_time_s: 0.1,
            dwell_time_s: 0.5,
            setup_time_s: 12.0,
            between_wells_time_s: 1.0,
            min_well_dwell_s: 1.0,
        }
    }
}

/// Settle windows between scheduled controller callbacks.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    pub point_settle_ms: u64,
    pub between_wells_ms: u64,
    /// Wait at the standoff position before the first in-well move.
    pub approach_settle_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            point_settle_ms: 100,
            between_wells_ms: 1000,
            approach_settle_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StageCfg {
    pub units_per_mm: f64,
    /// Subtracted from the plate-X units of a well's first point.
    pub approach_offset_units: i64,
    /// The stage's first axis is plate Y.
    pub swap_axes: bool,
    pub contact_arm_value: i32,
    /// Parking move issued after the startup delay, in stage units.
    pub park_position: [i64; 2],
}

impl Default for StageCfg {
    fn default() -> Self {
        Self {
            units_per_mm: 400.0,
            approach_offset_units: 600,
            swap_axes: true,
            contact_arm_value: 200,
            park_position: [20, 20],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MethodMode {
    #[default]
    SingleChannel,
    MultiChannel,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MethodCfg {
    /// Instrument method file rewritten before each run.
    pub file: PathBuf,
    #[serde(default)]
    pub mode: MethodMode,
    /// Fixed per-scan instrument overhead (single-channel only).
    #[serde(default = "default_scan_overhead_s")]
    pub scan_overhead_s: f64,
    /// Scan rate (multi-channel only).
    #[serde(default = "default_scans_per_second")]
    pub scans_per_second: f64,
    #[serde(default = "default_x_length_mm")]
    pub x_length_mm: f64,
}

fn default_scan_overhead_s() -> f64 {
    0.014
}
fn default_scans_per_second() -> f64 {
    5.0
}
fn default_x_length_mm() -> f64 {
    5.0
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AcquisitionCfg {
    /// Where the instrument writes `<name>.raw` and where run records go.
    pub data_directory: PathBuf,
    pub queue_directory: PathBuf,
    /// Program run to stop acquisition; only logged when absent.
    pub stop_command: Option<String>,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            queue_directory: PathBuf::from("queue"),
            stop_command: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub plate: PlateSection,
    /// Required when `plate.kind = "custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_plate: Option<CustomPlateCfg>,
    #[serde(default)]
    pub offsets: OffsetsCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub stage: StageCfg,
    pub method: MethodCfg,
    #[serde(default)]
    pub acquisition: AcquisitionCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Plate
        match (&self.plate.kind, &self.custom_plate) {
            (PlateKind::Custom, None) => {
                eyre::bail!("plate.kind = \"custom\" requires a [custom_plate] section");
            }
            (_, Some(custom)) => custom.validate()?,
            _ => {}
        }

        // Offsets
        for (name, o) in [
            ("standard96", self.offsets.standard96),
            ("slide_a", self.offsets.slide_a),
            ("slide_b", self.offsets.slide_b),
        ] {
            if !(o.x.is_finite() && o.y.is_finite()) {
                eyre::bail!("offsets.{name} must be finite");
            }
        }
        if !non_negative(self.offsets.startup_delay_s) || self.offsets.startup_delay_s > 60.0 {
            eyre::bail!("offsets.startup_delay_s must be in [0, 60]");
        }

        // Timing
        for (name, v) in [
            ("movement_time_s", self.timing.movement_time_s),
            ("dwell_time_s", self.timing.dwell_time_s),
            ("setup_time_s", self.timing.setup_time_s),
            ("between_wells_time_s", self.timing.between_wells_time_s),
        ] {
            if !non_negative(v) {
                eyre::bail!("timing.{name} must be >= 0");
            }
        }
        if !(self.timing.min_well_dwell_s.is_finite() && self.timing.min_well_dwell_s > 0.0) {
            eyre::bail!("timing.min_well_dwell_s must be > 0");
        }

        // Runner
        for (name, v) in [
            ("point_settle_ms", self.runner.point_settle_ms),
            ("between_wells_ms", self.runner.between_wells_ms),
            ("approach_settle_ms", self.runner.approach_settle_ms),
        ] {
            if v > 60_000 {
                eyre::bail!("runner.{name} is unreasonably large (>60s)");
            }
        }

        // Stage
        if !(self.stage.units_per_mm.is_finite() && self.stage.units_per_mm > 0.0) {
            eyre::bail!("stage.units_per_mm must be > 0");
        }
        if self.stage.approach_offset_units < 0 {
            eyre::bail!("stage.approach_offset_units must be >= 0");
        }

        // Method
        if self.method.file.as_os_str().is_empty() {
            eyre::bail!("method.file must not be empty");
        }
        if !non_negative(self.method.scan_overhead_s) {
            eyre::bail!("method.scan_overhead_s must be >= 0");
        }
        if !(self.method.scans_per_second.is_finite() && self.method.scans_per_second > 0.0) {
            eyre::bail!("method.scans_per_second must be > 0");
        }
        if !(self.method.x_length_mm.is_finite() && self.method.x_length_mm > 0.0) {
            eyre::bail!("method.x_length_mm must be > 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
