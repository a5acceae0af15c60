//! Run-time estimates and instrument scan parameters.

use raster_traits::MethodUpdate;

use crate::error::{RasterError, Result};
use crate::pattern::Pattern;

/// `max(0, n-1) * movement + n * dwell`. Zero for an empty pattern, even though
/// execution still dwells once at the well centre.
pub fn pattern_time(point_count: usize, movement_time_s: f64, dwell_time_s: f64) -> f64 {
    if point_count == 0 {
        return 0.0;
    }
    let n = point_count as f64;
    (n - 1.0) * movement_time_s + n * dwell_time_s
}

/// `setup + wells * pattern + max(0, wells-1) * between`; zero for no wells.
pub fn total_run_time(
    well_count: usize,
    pattern_time_s: f64,
    setup_time_s: f64,
    between_wells_time_s: f64,
) -> f64 {
    if well_count == 0 {
        return 0.0;
    }
    let n = well_count as f64;
    setup_time_s + n * pattern_time_s + (n - 1.0) * between_wells_time_s
}

/// How the instrument paces its scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanMode {
    /// One channel; each scan takes `scan_time_s` plus a fixed overhead.
    SingleChannel { scan_time_s: f64, overhead_s: f64 },
    /// MRM-style acquisition cycling `channels` channels at a fixed scan rate.
    MultiChannel { scans_per_second: f64, channels: u32 },
}

/// Scans per well and X step for a per-well dwell.
///
/// Fails with `DegenerateTiming` when fewer than one scan fits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn derive_method_parameters(
    per_well_dwell_s: f64,
    mode: ScanMode,
    x_length_mm: f64,
) -> Result<MethodUpdate> {
    let (raw_scans, channels, scan_time_s, channel_dwell_s) = match mode {
        ScanMode::SingleChannel {
            scan_time_s,
            overhead_s,
        } => (
            (per_well_dwell_s / (scan_time_s + overhead_s)).floor(),
            1,
            scan_time_s,
            None,
        ),
        ScanMode::MultiChannel {
            scans_per_second,
            channels,
        } => {
            if channels == 0 {
                return Err(eyre::Report::new(RasterError::DegenerateTiming(
                    "method declares zero channels".into(),
                )));
            }
            let scan_time = 1.0 / scans_per_second;
            (
                (per_well_dwell_s * scans_per_second).floor(),
                channels,
                scan_time,
                Some(scan_time / f64::from(channels)),
            )
        }
    };
    if !raw_scans.is_finite() || raw_scans < 1.0 || raw_scans > f64::from(u32::MAX) {
        return Err(eyre::Report::new(RasterError::DegenerateTiming(format!(
            "{per_well_dwell_s:.3}s per well yields {raw_scans} scans"
        ))));
    }
    let scans_per_well = raw_scans as u32;
    Ok(MethodUpdate {
        scans_per_well,
        x_step_mm: x_length_mm / (f64::from(scans_per_well) * f64::from(channels)),
        scan_time_s,
        channel_dwell_s,
    })
}

/// Timing constants for previews and the per-well dwell.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingModel {
    pub movement_time_s: f64,
    pub dwell_time_s: f64,
    pub setup_time_s: f64,
    pub between_wells_time_s: f64,
    pub min_well_dwell_s: f64,
}

impl Default for TimingModel {
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

impl TimingModel {
    pub fn pattern_time(&self, pattern: &Pattern) -> f64 {
        pattern_time(pattern.len(), self.movement_time_s, self.dwell_time_s)
    }

    pub fn total_run_time(&self, well_count: usize, pattern: &Pattern) -> f64 {
        total_run_time(
            well_count,
            self.pattern_time(pattern),
            self.setup_time_s,
            self.between_wells_time_s,
        )
    }

    /// Pattern time clamped up to the minimum dwell the instrument accepts.
    pub fn per_well_dwell(&self, pattern: &Pattern) -> f64 {
        self.pattern_time(pattern).max(self.min_well_dwell_s)
    }
}

/// `"1h 2m 3s"`, `"2m 3s"` or `"3s"`; fractional seconds are dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_points_take_1_7_seconds() {
        assert!((pattern_time(3, 0.1, 0.5) - 1.7).abs() < 1e-12);
        assert_eq!(pattern_time(0, 0.1, 0.5), 0.0);
        assert!((pattern_time(1, 0.1, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn total_is_zero_without_wells() {
        assert_eq!(total_run_time(0, 1.7, 12.0, 1.0), 0.0);
        assert!((total_run_time(2, 1.7, 12.0, 1.0) - 16.4).abs() < 1e-12);
    }

    #[test]
    fn single_channel_parameters() {
        let m = derive_method_parameters(
            1.0,
            ScanMode::SingleChannel {
                scan_time_s: 0.2,
                overhead_s: 0.014,
            },
            5.0,
        )
        .unwrap();
        // 1.0 / 0.214 = 4.67
        assert_eq!(m.scans_per_well, 4);
        assert!((m.x_step_mm - 1.25).abs() < 1e-12);
        assert_eq!(m.channel_dwell_s, None);
    }

    #[test]
    fn multi_channel_parameters() {
        let m = derive_method_parameters(
            2.0,
            ScanMode::MultiChannel {
                scans_per_second: 5.0,
                channels: 4,
            },
            5.0,
        )
        .unwrap();
        assert_eq!(m.scans_per_well, 10);
        assert!((m.x_step_mm - 0.125).abs() < 1e-12);
        assert!((m.scan_time_s - 0.2).abs() < 1e-12);
        assert!((m.channel_dwell_s.unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn too_short_dwell_is_degenerate() {
        let err = derive_method_parameters(
            0.1,
            ScanMode::SingleChannel {
                scan_time_s: 0.5,
                overhead_s: 0.014,
            },
            5.0,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RasterError>(),
            Some(RasterError::DegenerateTiming(_))
        ));
    }

    #[test]
    fn durations_format_like_the_preview() {
        assert_eq!(format_duration(3.9), "3s");
        assert_eq!(format_duration(123.0), "2m 3s");
        assert_eq!(format_duration(3723.0), "1h 2m 3s");
        assert_eq!(format_duration(-4.0), "0s");
    }
}
