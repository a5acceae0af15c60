//! The acquisition run state machine.
//!
//! Single-threaded and cooperative: `start()` arms the run, then the host
//! calls `step()` repeatedly. Each step fires at most one due callback
//! (`advance_well` or `advance_point`) and schedules at most one follow-up,
//! so there is never more than one motion command in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use raster_traits::{AcquisitionSink, Clock, MethodFileUpdater, MotionDriver};

use crate::error::{RasterError, Result};
use crate::hw_error::{Source, map_hw_error};
use crate::observer::{RunEvent, RunObserver};
use crate::pattern::{Pattern, StageUnits, map_pattern_to_well};
use crate::plate::{Offsets, PlateConfig, PlateType, PointMm, WellAddress};
use crate::record::{MethodSummary, RunRecord, RunRecordSink, WellMapping, WellTiming};
use crate::status::{RunOutcome, RunState, RunStatus};
use crate::timing::TimingModel;

/// Everything the operator chose for one run.
#[derive(Debug, Clone)]
pub struct Run {
    /// Acquisition file name, without `.raw`.
    pub name: String,
    pub plate: PlateConfig,
    pub offsets: Offsets,
    pub pattern: Pattern,
    /// Visit order.
    pub selected_wells: Vec<WellAddress>,
}

/// Instrument-side parameters that do not change between runs.
#[derive(Debug, Clone)]
pub struct ControllerCfg {
    pub timing: TimingModel,
    pub stage: StageUnits,
    pub contact_arm_value: i32,
    /// Driver arguments of the parking move after the startup delay.
    pub park_position: (i64, i64),
    pub point_settle: Duration,
    pub between_wells: Duration,
    pub approach_settle: Duration,
    pub method_file: PathBuf,
    pub data_directory: PathBuf,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            timing: TimingModel::default(),
            stage: StageUnits::default(),
            contact_arm_value: 200,
            park_position: (20, 20),
            point_settle: Duration::from_millis(100),
            between_wells: Duration::from_millis(1000),
            approach_settle: Duration::from_millis(100),
            method_file: PathBuf::from("method.exp"),
            data_directory: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    AdvanceWell,
    AdvancePoint,
}

/// The single scheduled callback.
#[derive(Debug, Clone, Copy)]
struct Pending {
    at: Instant,
    action: Action,
}

pub struct RunController {
    pub(crate) driver: Box<dyn MotionDriver>,
    pub(crate) method: Box<dyn MethodFileUpdater>,
    pub(crate) acquisition: Box<dyn AcquisitionSink>,
    pub(crate) record_sink: Option<Box<dyn RunRecordSink>>,
    pub(crate) observers: Vec<Box<dyn RunObserver>>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) stop_check: Option<Box<dyn Fn() -> bool>>,
    pub(crate) cfg: ControllerCfg,
    pub(crate) run: Run,
    pub(crate) state: RunState,
    pending: Option<Pending>,
    centers: Vec<PointMm>,
    well_coords: Vec<PointMm>,
    well_index: usize,
    point_index: usize,
    timings: Vec<WellTiming>,
    run_epoch: Option<Instant>,
    run_started_at: Option<DateTime<Utc>>,
    method_summary: Option<MethodSummary>,
    /// Set once homing or acquisition has been touched; gates cleanup.
    engaged: bool,
    record: Option<RunRecord>,
}

impl core::fmt::Debug for RunController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunController")
            .field("name", &self.run.name)
            .field("state", &self.state)
            .field("wells", &self.run.selected_wells.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

fn typed(e: RasterError) -> eyre::Report {
    eyre::Report::new(e)
}

impl RunController {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        driver: Box<dyn MotionDriver>,
        method: Box<dyn MethodFileUpdater>,
        acquisition: Box<dyn AcquisitionSink>,
        record_sink: Option<Box<dyn RunRecordSink>>,
        observers: Vec<Box<dyn RunObserver>>,
        clock: Arc<dyn Clock + Send + Sync>,
        stop_check: Option<Box<dyn Fn() -> bool>>,
        cfg: ControllerCfg,
        run: Run,
    ) -> Self {
        let timings = run
            .selected_wells
            .iter()
            .map(|w| WellTiming {
                label: w.label().to_string(),
                start_s: None,
                end_s: None,
            })
            .collect();
        Self {
            driver,
            method,
            acquisition,
            record_sink,
            observers,
            clock,
            stop_check,
            cfg,
            run,
            state: RunState::Idle,
            pending: None,
            centers: Vec::new(),
            well_coords: Vec::new(),
            well_index: 0,
            point_index: 0,
            timings,
            run_epoch: None,
            run_started_at: None,
            method_summary: None,
            engaged: false,
            record: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn current_well_index(&self) -> usize {
        self.well_index
    }

    pub fn current_point_index(&self) -> usize {
        self.point_index
    }

    /// Per-well timings so far, in selection order.
    pub fn timings(&self) -> &[WellTiming] {
        &self.timings
    }

    /// The record emitted when the run reached a terminal state.
    pub fn record(&self) -> Option<&RunRecord> {
        self.record.as_ref()
    }

    /// Add an observer; it sees every event from now on.
    pub fn subscribe(&mut self, observer: impl RunObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: &RunEvent) {
        for o in &mut self.observers {
            o.on_event(event);
        }
    }

    fn set_state(&mut self, to: RunState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(%from, %to, "run state");
        self.emit(&RunEvent::StateChanged { from, to });
    }

    fn schedule(&mut self, action: Action, after: Duration) {
        debug_assert!(self.pending.is_none(), "second callback scheduled");
        self.pending = Some(Pending {
            at: self.clock.now() + after,
            action,
        });
    }

    fn elapsed_s(&self) -> f64 {
        self.run_epoch
            .map_or(0.0, |epoch| self.clock.secs_since(epoch))
    }

    fn motion<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn MotionDriver) -> std::result::Result<(), raster_traits::BoxError>,
    {
        f(self.driver.as_mut()).map_err(|e| typed(map_hw_error(e.as_ref(), Source::Motion)))
    }

    /// Validate the run, rewrite the method file, home the stage, queue the
    /// acquisition, wait out the startup delay and park. On success the first
    /// `advance_well` is due immediately.
    ///
    /// Empty selections and invalid addresses fail before any collaborator is
    /// called and leave the controller `Idle`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(typed(RasterError::State(format!(
                "cannot start a run that is {}",
                self.state
            ))));
        }
        if self.run.selected_wells.is_empty() {
            return Err(typed(RasterError::NoWellsSelected));
        }
        // Labels are the record's well identity; they must match this plate's derivation.
        for w in &self.run.selected_wells {
            let derived = self.run.plate.address(w.row(), w.col(), w.sub_plate())?;
            if derived.label() != w.label() {
                return Err(typed(RasterError::InvalidAddress(format!(
                    "{} is {} on a {} plate",
                    w.label(),
                    derived.label(),
                    self.run.plate.plate_type()
                ))));
            }
        }
        self.centers = self
            .run
            .selected_wells
            .iter()
            .map(|w| self.run.plate.well_center_mm(&self.run.offsets, w))
            .collect::<Result<Vec<_>>>()?;

        self.set_state(RunState::Arming);
        if let Err(e) = self.arm() {
            return Err(self.abort(e));
        }
        self.set_state(RunState::RunningWell(0));
        self.schedule(Action::AdvanceWell, Duration::ZERO);
        Ok(())
    }

    fn arm(&mut self) -> Result<()> {
        let dwell = self.cfg.timing.per_well_dwell(&self.run.pattern);
        let update = self
            .method
            .update(&self.cfg.method_file, dwell)
            .map_err(|e| typed(map_hw_error(e.as_ref(), Source::MethodFile)))?;
        self.method_summary = Some(MethodSummary {
            per_well_dwell_s: dwell,
            scans_per_well: update.scans_per_well,
            x_step_mm: update.x_step_mm,
        });
        tracing::info!(
            name = %self.run.name,
            wells = self.run.selected_wells.len(),
            per_well_dwell_s = dwell,
            scans_per_well = update.scans_per_well,
            "arming run"
        );

        self.engaged = true;
        self.motion(|d| d.go_home())?;
        self.acquisition
            .enqueue(
                &self.run.name,
                &self.cfg.method_file,
                &self.cfg.data_directory,
            )
            .map_err(|e| typed(map_hw_error(e.as_ref(), Source::Acquisition)))?;

        let delay = Duration::try_from_secs_f64(self.run.offsets.startup_delay_s.max(0.0))
            .unwrap_or(Duration::ZERO);
        tracing::debug!(delay_s = delay.as_secs_f64(), "startup delay");
        self.clock.sleep(delay);

        let (px, py) = self.cfg.park_position;
        self.motion(|d| d.go_to_position(px, py))?;

        self.run_epoch = Some(self.clock.now());
        self.run_started_at = Some(Utc::now());
        Ok(())
    }

    /// Fire the pending callback if it is due.
    ///
    /// The stop check runs first, so a stop requested between two callbacks
    /// prevents the next motion command.
    pub fn step(&mut self) -> Result<RunStatus> {
        match self.state {
            RunState::Idle => {
                return Err(typed(RasterError::State("run not started".into())));
            }
            RunState::Completed => return Ok(RunStatus::Completed),
            RunState::Cancelled => return Ok(RunStatus::Cancelled),
            _ => {}
        }
        if self.stop_check.as_ref().is_some_and(|f| f()) {
            tracing::warn!("stop requested");
            self.stop()?;
            return Ok(RunStatus::Cancelled);
        }

        let Some(pending) = self.pending else {
            return Err(typed(RasterError::State(format!(
                "{} with nothing scheduled",
                self.state
            ))));
        };
        let now = self.clock.now();
        if now < pending.at {
            return Ok(RunStatus::Running {
                next_in: pending.at - now,
            });
        }
        self.pending = None;

        let fired = match pending.action {
            Action::AdvanceWell => self.advance_well(),
            Action::AdvancePoint => self.advance_point(),
        };
        if let Err(e) = fired {
            // A terminal state here means only the record sink failed.
            if self.state.is_terminal() {
                return Err(e);
            }
            return Err(self.abort(e));
        }
        Ok(self.status())
    }

    /// Current status without firing anything.
    pub fn status(&self) -> RunStatus {
        match self.state {
            RunState::Completed => RunStatus::Completed,
            RunState::Cancelled => RunStatus::Cancelled,
            _ => RunStatus::Running {
                next_in: self.pending.map_or(Duration::ZERO, |p| {
                    p.at.saturating_duration_since(self.clock.now())
                }),
            },
        }
    }

    fn advance_well(&mut self) -> Result<()> {
        if self.well_index >= self.run.selected_wells.len() {
            tracing::info!(wells = self.well_index, "all selected wells processed");
            self.motion(|d| d.go_home())?;
            self.acquisition
                .stop()
                .map_err(|e| typed(map_hw_error(e.as_ref(), Source::Acquisition)))?;
            self.set_state(RunState::Completed);
            self.finish(RunOutcome::Completed)?;
            return Ok(());
        }

        let i = self.well_index;
        let label = self.run.selected_wells[i].label().to_string();
        self.well_coords = map_pattern_to_well(
            &self.run.pattern,
            self.centers[i],
            self.run.plate.well_diameter_mm(),
        );
        self.point_index = 0;

        let arm = self.cfg.contact_arm_value;
        self.motion(|d| d.contact_arm(arm))?;

        let start_s = self.elapsed_s();
        self.timings[i].start_s = Some(start_s);
        self.emit(&RunEvent::WellStarted {
            index: i,
            label: label.clone(),
            start_s,
        });

        let (ax, ay) = self.cfg.stage.approach(self.well_coords[0]);
        tracing::info!(well = i, %label, x_units = ax, y_units = ay, "approach");
        self.motion(|d| d.go_to_position(ax, ay))?;

        self.set_state(RunState::RunningPoint(i, 0));
        self.schedule(Action::AdvancePoint, self.cfg.approach_settle);
        Ok(())
    }

    fn advance_point(&mut self) -> Result<()> {
        let i = self.well_index;
        if self.point_index >= self.well_coords.len() {
            let end_s = self.elapsed_s();
            self.timings[i].end_s = Some(end_s);
            let label = self.timings[i].label.clone();
            tracing::info!(well = i, %label, end_s, "well completed");
            self.emit(&RunEvent::WellCompleted {
                index: i,
                label,
                end_s,
            });
            self.well_index += 1;
            self.set_state(RunState::RunningWell(self.well_index));
            self.schedule(Action::AdvanceWell, self.cfg.between_wells);
            return Ok(());
        }

        let p = self.point_index;
        let (x, y) = self.cfg.stage.to_driver(self.well_coords[p]);
        tracing::debug!(well = i, point = p, x_units = x, y_units = y, "move");
        self.motion(|d| d.go_to_position(x, y))?;
        self.emit(&RunEvent::PointVisited {
            well: i,
            point: p,
            x_units: x,
            y_units: y,
        });
        self.point_index += 1;
        self.set_state(RunState::RunningPoint(i, self.point_index));
        self.schedule(Action::AdvancePoint, self.cfg.point_settle);
        Ok(())
    }

    /// Cancel the run: drop the pending callback, home the stage and stop
    /// acquisition exactly once. A no-op when idle or already finished.
    pub fn stop(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Ok(());
        }
        self.pending = None;
        self.set_state(RunState::Cancelled);
        tracing::info!(name = %self.run.name, well = self.well_index, "run stopped");

        let homed = self.motion(|d| d.go_home());
        let stopped = self
            .acquisition
            .stop()
            .map_err(|e| typed(map_hw_error(e.as_ref(), Source::Acquisition)));
        let recorded = self.finish(RunOutcome::Cancelled);
        homed.and(stopped).and(recorded)
    }

    /// Move to `Cancelled` after a failure, with best-effort cleanup.
    fn abort(&mut self, err: eyre::Report) -> eyre::Report {
        tracing::error!(error = %err, state = %self.state, "run aborted");
        self.pending = None;
        self.set_state(RunState::Cancelled);
        if self.engaged {
            if let Err(e) = self.driver.go_home() {
                tracing::warn!(error = %e, "home after failure");
            }
            if let Err(e) = self.acquisition.stop() {
                tracing::warn!(error = %e, "acquisition stop after failure");
            }
        }
        if let Err(e) = self.finish(RunOutcome::Cancelled) {
            tracing::warn!(error = %e, "run record after failure");
        }
        err
    }

    fn finish(&mut self, outcome: RunOutcome) -> Result<()> {
        let record = self.build_record(outcome);
        self.emit(&RunEvent::Finished(outcome));
        let res = match self.record_sink.as_mut() {
            Some(sink) => sink.accept(&record),
            None => Ok(()),
        };
        self.record = Some(record);
        res
    }

    fn build_record(&self, outcome: RunOutcome) -> RunRecord {
        let (custom_plate_config, well_mapping) = match &self.run.plate {
            PlateConfig::Custom(c) => {
                let mapping = self
                    .run
                    .selected_wells
                    .iter()
                    .map(|w| WellMapping {
                        spot_id: w.label().to_string(),
                        row: w.row(),
                        col: w.col(),
                        x_position_mm: f64::from(w.col()) * c.spot_distance_x + c.offset_x,
                        y_position_mm: f64::from(w.row()) * c.spot_distance_y + c.offset_y,
                        spot_diameter_mm: c.spot_diameter,
                    })
                    .collect();
                (Some(c.clone()), mapping)
            }
            _ => (None, Vec::new()),
        };
        RunRecord {
            name: self.run.name.clone(),
            plate_type: self.run.plate.plate_type(),
            total_wells: self.run.plate.total_wells(),
            selected_wells: self
                .run
                .selected_wells
                .iter()
                .map(|w| w.label().to_string())
                .collect(),
            outcome,
            run_start_time: self.run_started_at.unwrap_or_else(Utc::now),
            well_timing: self.timings.clone(),
            method: self.method_summary.clone(),
            custom_plate_config,
            well_mapping,
        }
    }

    pub fn plate_type(&self) -> PlateType {
        self.run.plate.plate_type()
    }
}
