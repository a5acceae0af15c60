//! Type-state builder for `RunController`.
//!
//! The builder enforces at compile time that the motion driver, the method
//! file updater and the run are provided before `build()` is available.
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use raster_traits::clock::{Clock, MonotonicClock};
use raster_traits::{AcquisitionSink, MethodFileUpdater, MotionDriver};

use crate::controller::{ControllerCfg, Run, RunController};
use crate::error::{BuildError, Result};
use crate::mocks::NoopAcquisition;
use crate::observer::RunObserver;
use crate::record::RunRecordSink;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct RunControllerBuilder<D, U, R> {
    driver: Option<Box<dyn MotionDriver>>,
    method: Option<Box<dyn MethodFileUpdater>>,
    run: Option<Run>,
    acquisition: Option<Box<dyn AcquisitionSink>>,
    record_sink: Option<Box<dyn RunRecordSink>>,
    observers: Vec<Box<dyn RunObserver>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    stop_check: Option<Box<dyn Fn() -> bool>>,
    cfg: Option<ControllerCfg>,
    _d: PhantomData<D>,
    _u: PhantomData<U>,
    _r: PhantomData<R>,
}

impl Default for RunControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            driver: None,
            method: None,
            run: None,
            acquisition: None,
            record_sink: None,
            observers: Vec::new(),
            clock: None,
            stop_check: None,
            cfg: None,
            _d: PhantomData,
            _u: PhantomData,
            _r: PhantomData,
        }
    }
}

impl RunController {
    /// Start building a controller.
    pub fn builder() -> RunControllerBuilder<Missing, Missing, Missing> {
        RunControllerBuilder::default()
    }
}

fn validate(cfg: &ControllerCfg, run: &Run) -> Result<()> {
    if run.name.trim().is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "run name must not be empty",
        )));
    }
    if !(cfg.stage.units_per_mm.is_finite() && cfg.stage.units_per_mm > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "units_per_mm must be > 0",
        )));
    }
    if cfg.stage.approach_offset_units < 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "approach_offset_units must be >= 0",
        )));
    }
    if !(cfg.timing.min_well_dwell_s.is_finite() && cfg.timing.min_well_dwell_s > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_well_dwell_s must be > 0",
        )));
    }
    if !(run.offsets.startup_delay_s.is_finite() && run.offsets.startup_delay_s >= 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "startup_delay_s must be >= 0",
        )));
    }
    Ok(())
}

impl<D, U, R> RunControllerBuilder<D, U, R> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<RunController> {
        let driver = self
            .driver
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDriver))?;
        let method = self
            .method
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMethodUpdater))?;
        let run = self
            .run
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRun))?;
        let cfg = self.cfg.unwrap_or_default();
        validate(&cfg, &run)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        Ok(RunController::from_parts(
            driver,
            method,
            self.acquisition
                .unwrap_or_else(|| Box::new(NoopAcquisition)),
            self.record_sink,
            self.observers,
            clock,
            self.stop_check,
            cfg,
            run,
        ))
    }
}

/// Chainable setters that do not affect type-state.
impl<D, U, R> RunControllerBuilder<D, U, R> {
    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }
    pub fn with_acquisition(mut self, sink: impl AcquisitionSink + 'static) -> Self {
        self.acquisition = Some(Box::new(sink));
        self
    }
    pub fn with_record_sink(mut self, sink: impl RunRecordSink + 'static) -> Self {
        self.record_sink = Some(Box::new(sink));
        self
    }
    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
    /// Polled at the top of every step; `true` cancels the run.
    pub fn with_stop_check<F>(mut self, f: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.stop_check = Some(Box::new(f));
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    fn retype<D2, U2, R2>(self) -> RunControllerBuilder<D2, U2, R2> {
        RunControllerBuilder {
            driver: self.driver,
            method: self.method,
            run: self.run,
            acquisition: self.acquisition,
            record_sink: self.record_sink,
            observers: self.observers,
            clock: self.clock,
            stop_check: self.stop_check,
            cfg: self.cfg,
            _d: PhantomData,
            _u: PhantomData,
            _r: PhantomData,
        }
    }
}

// Setters that advance type-state
impl<U, R> RunControllerBuilder<Missing, U, R> {
    pub fn with_driver(
        mut self,
        driver: impl MotionDriver + 'static,
    ) -> RunControllerBuilder<Set, U, R> {
        self.driver = Some(Box::new(driver));
        self.retype()
    }
}

impl<D, R> RunControllerBuilder<D, Missing, R> {
    pub fn with_method_updater(
        mut self,
        updater: impl MethodFileUpdater + 'static,
    ) -> RunControllerBuilder<D, Set, R> {
        self.method = Some(Box::new(updater));
        self.retype()
    }
}

impl<D, U> RunControllerBuilder<D, U, Missing> {
    pub fn with_run(mut self, run: Run) -> RunControllerBuilder<D, U, Set> {
        self.run = Some(run);
        self.retype()
    }
}

impl RunControllerBuilder<Set, Set, Set> {
    /// Build once every required collaborator is present.
    pub fn build(self) -> Result<RunController> {
        self.try_build()
    }
}
