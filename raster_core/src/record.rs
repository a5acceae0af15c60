//! What a finished run leaves behind for downstream processing.
//!
//! The well labels are the only contract with the offline viewer; every
//! export keeps them in selection order and byte-for-byte.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use crate::plate::{CustomPlate, PlateType};
use crate::status::RunOutcome;

pub const RUN_INFO_FILE: &str = "run_info.json";
pub const SELECTED_WELLS_FILE: &str = "selected_wells.txt";
pub const TIMING_CSV_FILE: &str = "well_timing.csv";

/// Seconds since run start; `None` when the run ended before that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellTiming {
    #[serde(rename = "well")]
    pub label: String,
    pub start_s: Option<f64>,
    pub end_s: Option<f64>,
}

/// Physical layout of one custom-plate spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellMapping {
    pub spot_id: String,
    pub row: u32,
    pub col: u32,
    pub x_position_mm: f64,
    pub y_position_mm: f64,
    pub spot_diameter_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub per_well_dwell_s: f64,
    pub scans_per_well: u32,
    pub x_step_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub name: String,
    pub plate_type: PlateType,
    pub total_wells: usize,
    pub selected_wells: Vec<String>,
    pub outcome: RunOutcome,
    pub run_start_time: DateTime<Utc>,
    pub well_timing: Vec<WellTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_plate_config: Option<CustomPlate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub well_mapping: Vec<WellMapping>,
}

impl RunRecord {
    pub fn timing_for(&self, label: &str) -> Option<&WellTiming> {
        self.well_timing.iter().find(|t| t.label == label)
    }

    pub fn completed_wells(&self) -> usize {
        self.well_timing.iter().filter(|t| t.end_s.is_some()).count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| eyre::Report::new(RasterError::Io(e.to_string())))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| eyre::Report::new(RasterError::Io(e.to_string())))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::Report::new(RasterError::Io(e.to_string())))
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).wrap_err_with(|| format!("parsing {}", path.display()))
    }

    /// Legacy `selected_wells.txt` body.
    pub fn selected_wells_text(&self) -> String {
        let mut out = String::from("Selected Wells:\n");
        out.push_str(&self.selected_wells.join("\n"));
        out
    }

    /// `well,start_s,end_s` rows in selection order.
    pub fn write_timing_csv<W: Write>(&self, w: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(w);
        for row in &self.well_timing {
            wtr.serialize(row)
                .map_err(|e| eyre::Report::new(RasterError::Io(e.to_string())))?;
        }
        wtr.flush()
            .map_err(|e| eyre::Report::new(RasterError::Io(e.to_string())))
    }
}

/// Receives one record per completed or cancelled run.
pub trait RunRecordSink {
    fn accept(&mut self, record: &RunRecord) -> Result<()>;
}

/// Writes `run_info.json`, `selected_wells.txt` and the timing CSV into
/// `<root>/<name>.raw/`, next to the acquired data.
#[derive(Debug, Clone)]
pub struct JsonRecordSink {
    root: PathBuf,
}

impl JsonRecordSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn run_dir(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.raw"))
    }
}

fn io_err(e: std::io::Error) -> eyre::Report {
    eyre::Report::new(RasterError::Io(e.to_string()))
}

impl RunRecordSink for JsonRecordSink {
    fn accept(&mut self, record: &RunRecord) -> Result<()> {
        let dir = self.run_dir(&record.name);
        std::fs::create_dir_all(&dir)
            .map_err(io_err)
            .wrap_err_with(|| format!("creating {}", dir.display()))?;

        std::fs::write(dir.join(RUN_INFO_FILE), record.to_json()?).map_err(io_err)?;
        std::fs::write(dir.join(SELECTED_WELLS_FILE), record.selected_wells_text())
            .map_err(io_err)?;
        let csv_file = std::fs::File::create(dir.join(TIMING_CSV_FILE)).map_err(io_err)?;
        record.write_timing_csv(csv_file)?;

        tracing::info!(dir = %dir.display(), wells = record.selected_wells.len(), "run record written");
        Ok(())
    }
}
