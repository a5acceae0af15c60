//! Rewrites `Key,Value` instrument method files for a per-well dwell.

use std::path::Path;

use raster_config::{MethodFile, MethodMode};
use raster_traits::{BoxError, MethodFileUpdater, MethodUpdate};

use crate::error::RasterError;
use crate::timing::{ScanMode, derive_method_parameters};

const SCAN_TIME_KEY: &str = "FunctionScanTime";
const CHANNELS_KEY: &str = "NoOfChannels,";

/// File-backed `MethodFileUpdater` for single-channel and MRM methods.
#[derive(Debug, Clone)]
pub struct ExpMethodUpdater {
    pub mode: MethodMode,
    pub scan_overhead_s: f64,
    pub scans_per_second: f64,
    pub x_length_mm: f64,
}

impl Default for ExpMethodUpdater {
    fn default() -> Self {
        Self {
            mode: MethodMode::SingleChannel,
            scan_overhead_s: 0.014,
            scans_per_second: 5.0,
            x_length_mm: 5.0,
        }
    }
}

fn method_err(e: impl std::fmt::Display) -> BoxError {
    Box::new(RasterError::MethodFile(e.to_string()))
}

fn into_box(r: eyre::Report) -> BoxError {
    match r.downcast::<RasterError>() {
        Ok(typed) => Box::new(typed),
        Err(other) => method_err(other),
    }
}

impl ExpMethodUpdater {
    /// Apply the rewrite to an in-memory method file.
    pub fn rewrite(
        &self,
        file: &mut MethodFile,
        per_well_dwell_s: f64,
    ) -> Result<MethodUpdate, BoxError> {
        match self.mode {
            MethodMode::SingleChannel => {
                let scan_time_s = file.field_f64(SCAN_TIME_KEY).map_err(method_err)?;
                let update = derive_method_parameters(
                    per_well_dwell_s,
                    ScanMode::SingleChannel {
                        scan_time_s,
                        overhead_s: self.scan_overhead_s,
                    },
                    self.x_length_mm,
                )
                .map_err(into_box)?;
                let x_length = self.x_length_mm.to_string();
                let x_step = format!("{:.6}", update.x_step_mm);
                for (key, value) in [
                    ("DesiXStart", "0"),
                    ("DesiYStart", "0"),
                    ("DesiXLength", x_length.as_str()),
                    ("DesiXStep", x_step.as_str()),
                    ("DesiXRate", "2500"),
                    ("DesiYLength", "500"),
                    ("DesiYStep", "1"),
                    ("DesiSlot", "Full"),
                ] {
                    file.set(key, value);
                }
                Ok(update)
            }
            MethodMode::MultiChannel => {
                let channels = file.field_u32(CHANNELS_KEY).map_err(method_err)?;
                let update = derive_method_parameters(
                    per_well_dwell_s,
                    ScanMode::MultiChannel {
                        scans_per_second: self.scans_per_second,
                        channels,
                    },
                    self.x_length_mm,
                )
                .map_err(into_box)?;
                let dwell = format!("{:.6}", update.channel_dwell_s.unwrap_or(update.scan_time_s));
                file.set_where(
                    |l| l.contains("FunctionScanTime(sec)"),
                    &format!("{:.6}", update.scan_time_s),
                );
                file.set_where(|l| l.contains("SIRDwellTime"), &dwell);
                file.set_where(|l| l.trim_start().starts_with("Dwell(s)_"), &dwell);
                file.set_where(
                    |l| l.contains("DesiXStep"),
                    &format!("{:.6}", update.x_step_mm),
                );
                Ok(update)
            }
        }
    }
}

impl MethodFileUpdater for ExpMethodUpdater {
    fn update(
        &mut self,
        method_file: &Path,
        per_well_dwell_s: f64,
    ) -> Result<MethodUpdate, BoxError> {
        let mut file = MethodFile::load(method_file).map_err(method_err)?;
        let update = self.rewrite(&mut file, per_well_dwell_s)?;
        file.save(method_file).map_err(method_err)?;
        tracing::info!(
            path = %method_file.display(),
            scans_per_well = update.scans_per_well,
            x_step_mm = update.x_step_mm,
            "method file updated"
        );
        Ok(update)
    }
}
