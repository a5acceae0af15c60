#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Acquisition run controller (hardware-agnostic).
//!
//! All hardware interactions go through the `raster_traits` seams:
//! `MotionDriver`, `MethodFileUpdater` and `AcquisitionSink`.
//!
//! ## Architecture
//!
//! - **Geometry**: plate layouts, well centres, labels (`plate` module)
//! - **Patterns**: canvas points to millimeters to stage units (`pattern` module)
//! - **Timing**: previews and instrument scan parameters (`timing` module)
//! - **Control**: the cooperative run state machine (`controller` module)
//! - **Records**: run exports for the offline viewer (`record` module)
//!
//! ## Scheduling
//!
//! The controller never blocks inside the per-point loop. The host calls
//! `RunController::step` and sleeps for the returned `next_in`; `runner`
//! does exactly that on the controller's clock.

pub mod builder;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod method;
pub mod mocks;
pub mod observer;
pub mod pattern;
pub mod plate;
pub mod record;
pub mod runner;
pub mod status;
pub mod timing;

pub use builder::RunControllerBuilder;
pub use controller::{ControllerCfg, Run, RunController};
pub use error::{BuildError, RasterError, Result};
pub use method::ExpMethodUpdater;
pub use observer::{RunEvent, RunObserver};
pub use pattern::{CanvasPoint, Pattern, StageUnits, map_pattern_to_well};
pub use plate::{CustomPlate, Offsets, PlateConfig, PlateType, PointMm, SubPlate, WellAddress};
pub use record::{JsonRecordSink, RunRecord, RunRecordSink, WellTiming};
pub use runner::{run_to_completion, self_check};
pub use status::{RunOutcome, RunState, RunStatus};
pub use timing::{TimingModel, derive_method_parameters, format_duration, pattern_time, total_run_time};
