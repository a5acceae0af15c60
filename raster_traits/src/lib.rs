//! Collaborator seams for the acquisition run controller.
//!
//! Everything that touches the outside world (stage, instrument method file,
//! mass-spec acquisition queue) sits behind one of these traits so the core
//! stays hardware-agnostic and testable.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::path::Path;

/// Error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Motorized XY stage. Positions are in the driver's native pulse units.
pub trait MotionDriver {
    /// Power up and initialise the controller.
    fn initiate(&mut self) -> Result<(), BoxError>;
    fn go_home(&mut self) -> Result<(), BoxError>;
    fn go_to_position(&mut self, x_units: i64, y_units: i64) -> Result<(), BoxError>;
    /// Drive the contact arm; used to step the acquisition's Y index between wells.
    fn contact_arm(&mut self, value: i32) -> Result<(), BoxError>;
}

/// Scan-timing values written into an instrument method file.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodUpdate {
    pub scans_per_well: u32,
    pub x_step_mm: f64,
    pub scan_time_s: f64,
    /// Per-channel dwell, only reported by multi-channel instruments.
    pub channel_dwell_s: Option<f64>,
}

/// Rewrites an instrument method file for a given per-well dwell time.
pub trait MethodFileUpdater {
    fn update(&mut self, method_file: &Path, per_well_dwell_s: f64)
    -> Result<MethodUpdate, BoxError>;
}

/// Mass-spectrometer acquisition queue.
pub trait AcquisitionSink {
    fn enqueue(
        &mut self,
        filename: &str,
        method_file: &Path,
        data_directory: &Path,
    ) -> Result<(), BoxError>;
    fn stop(&mut self) -> Result<(), BoxError>;
}

impl<T: MotionDriver + ?Sized> MotionDriver for Box<T> {
    fn initiate(&mut self) -> Result<(), BoxError> {
        (**self).initiate()
    }
    fn go_home(&mut self) -> Result<(), BoxError> {
        (**self).go_home()
    }
    fn go_to_position(&mut self, x_units: i64, y_units: i64) -> Result<(), BoxError> {
        (**self).go_to_position(x_units, y_units)
    }
    fn contact_arm(&mut self, value: i32) -> Result<(), BoxError> {
        (**self).contact_arm(value)
    }
}
