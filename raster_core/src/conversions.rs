//! `From` implementations bridging `raster_config` types to `raster_core` types.

use std::time::Duration;

use crate::controller::ControllerCfg;
use crate::error::RasterError;
use crate::method::ExpMethodUpdater;
use crate::pattern::StageUnits;
use crate::plate::{CustomPlate, Offsets, PlateConfig, PointMm};
use crate::timing::TimingModel;

// ── Plate ────────────────────────────────────────────────────────────────────

impl From<&raster_config::CustomPlateCfg> for CustomPlate {
    fn from(c: &raster_config::CustomPlateCfg) -> Self {
        Self {
            print_height: c.print_height,
            print_width: c.print_width,
            offset_x: c.offset_x,
            offset_y: c.offset_y,
            spot_distance_x: c.spot_distance_x,
            spot_distance_y: c.spot_distance_y,
            spot_diameter: c.spot_diameter,
            num_rows: c.num_rows,
            num_columns: c.num_columns,
        }
    }
}

impl TryFrom<&raster_config::Config> for PlateConfig {
    type Error = eyre::Report;

    fn try_from(c: &raster_config::Config) -> Result<Self, Self::Error> {
        Ok(match c.plate.kind {
            raster_config::PlateKind::Standard96 => Self::Standard96,
            raster_config::PlateKind::Dual44 => Self::Dual44,
            raster_config::PlateKind::Custom => {
                let custom = c.custom_plate.as_ref().ok_or_else(|| {
                    eyre::Report::new(RasterError::Configuration(
                        "custom plate selected but no custom plate configuration".into(),
                    ))
                })?;
                Self::Custom(CustomPlate::from(custom).validated()?)
            }
        })
    }
}

// ── Offsets ──────────────────────────────────────────────────────────────────

impl From<raster_config::OffsetXY> for PointMm {
    fn from(o: raster_config::OffsetXY) -> Self {
        Self { x: o.x, y: o.y }
    }
}

impl From<&raster_config::OffsetsCfg> for Offsets {
    fn from(c: &raster_config::OffsetsCfg) -> Self {
        Self {
            standard96: c.standard96.into(),
            slide_a: c.slide_a.into(),
            slide_b: c.slide_b.into(),
            startup_delay_s: c.startup_delay_s,
        }
    }
}

// ── Timing / stage ───────────────────────────────────────────────────────────

impl From<&raster_config::TimingCfg> for TimingModel {
    fn from(c: &raster_config::TimingCfg) -> Self {
        Self {
            movement_time_s: c.movement_time_s,
            dwell_time_s: c.dwell_time_s,
            setup_time_s: c.setup_time_s,
            between_wells_time_s: c.between_wells_time_s,
            min_well_dwell_s: c.min_well_dwell_s,
        }
    }
}

impl From<&raster_config::StageCfg> for StageUnits {
    fn from(c: &raster_config::StageCfg) -> Self {
        Self {
            units_per_mm: c.units_per_mm,
            approach_offset_units: c.approach_offset_units,
            swap_axes: c.swap_axes,
        }
    }
}

impl From<&raster_config::Config> for ControllerCfg {
    fn from(c: &raster_config::Config) -> Self {
        Self {
            timing: (&c.timing).into(),
            stage: (&c.stage).into(),
            contact_arm_value: c.stage.contact_arm_value,
            park_position: (c.stage.park_position[0], c.stage.park_position[1]),
            point_settle: Duration::from_millis(c.runner.point_settle_ms),
            between_wells: Duration::from_millis(c.runner.between_wells_ms),
            approach_settle: Duration::from_millis(c.runner.approach_settle_ms),
            method_file: c.method.file.clone(),
            data_directory: c.acquisition.data_directory.clone(),
        }
    }
}

// ── Method ───────────────────────────────────────────────────────────────────

impl From<&raster_config::MethodCfg> for ExpMethodUpdater {
    fn from(c: &raster_config::MethodCfg) -> Self {
        Self {
            mode: c.mode,
            scan_overhead_s: c.scan_overhead_s,
            scans_per_second: c.scans_per_second,
            x_length_mm: c.x_length_mm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_kind_without_section_is_configuration_error() {
        let mut cfg = raster_config::load_toml("[method]\nfile = \"m.exp\"\n").unwrap();
        cfg.plate.kind = raster_config::PlateKind::Custom;
        let err = PlateConfig::try_from(&cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RasterError>(),
            Some(RasterError::Configuration(_))
        ));
    }

    #[test]
    fn config_defaults_match_controller_defaults() {
        let cfg = raster_config::load_toml("[method]\nfile = \"m.exp\"\n").unwrap();
        let ctl = ControllerCfg::from(&cfg);
        let dflt = ControllerCfg::default();
        assert_eq!(ctl.timing, dflt.timing);
        assert_eq!(ctl.stage, dflt.stage);
        assert_eq!(ctl.park_position, dflt.park_position);
        assert_eq!(ctl.between_wells, dflt.between_wells);
        assert_eq!(Offsets::from(&cfg.offsets), Offsets::default());
    }
}
