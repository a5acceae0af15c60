//! Test and helper mocks for raster_core.
//!
//! The recording mocks share one `CallLog`, so tests can assert the order of
//! commands across the stage, method file and acquisition collaborators.

use std::path::Path;
use std::sync::{Arc, Mutex};

use raster_traits::{AcquisitionSink, BoxError, MethodFileUpdater, MethodUpdate, MotionDriver};

use crate::record::{RunRecord, RunRecordSink};

/// Acquisition sink that does nothing; the builder default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAcquisition;

impl AcquisitionSink for NoopAcquisition {
    fn enqueue(&mut self, _: &str, _: &Path, _: &Path) -> Result<(), BoxError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initiate,
    Home,
    GoTo(i64, i64),
    ContactArm(i32),
    MethodUpdate(f64),
    Enqueue(String),
    AcquisitionStop,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, c: Call) {
        if let Ok(mut v) = self.0.lock() {
            v.push(c);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn moves(&self) -> Vec<(i64, i64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GoTo(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.0.lock() {
            v.clear();
        }
    }
}

/// Stage that records every command; optionally fails the n-th `go_to_position`.
#[derive(Debug, Clone)]
pub struct RecordingDriver {
    log: CallLog,
    fail_on_move: Option<usize>,
    moves: usize,
}

impl RecordingDriver {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_on_move: None,
            moves: 0,
        }
    }

    /// Fail the `n`-th (1-based) `go_to_position` call.
    pub fn failing_on_move(mut self, n: usize) -> Self {
        self.fail_on_move = Some(n);
        self
    }
}

impl MotionDriver for RecordingDriver {
    fn initiate(&mut self) -> Result<(), BoxError> {
        self.log.push(Call::Initiate);
        Ok(())
    }
    fn go_home(&mut self) -> Result<(), BoxError> {
        self.log.push(Call::Home);
        Ok(())
    }
    fn go_to_position(&mut self, x_units: i64, y_units: i64) -> Result<(), BoxError> {
        self.moves += 1;
        if self.fail_on_move == Some(self.moves) {
            return Err(Box::new(std::io::Error::other("stage did not acknowledge move")));
        }
        self.log.push(Call::GoTo(x_units, y_units));
        Ok(())
    }
    fn contact_arm(&mut self, value: i32) -> Result<(), BoxError> {
        self.log.push(Call::ContactArm(value));
        Ok(())
    }
}

/// Method updater returning a fixed result, or an error message.
#[derive(Debug, Clone)]
pub struct StubMethodUpdater {
    log: CallLog,
    result: Result<MethodUpdate, String>,
}

impl StubMethodUpdater {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            result: Ok(MethodUpdate {
                scans_per_well: 10,
                x_step_mm: 0.5,
                scan_time_s: 0.1,
                channel_dwell_s: None,
            }),
        }
    }

    pub fn failing(log: CallLog, msg: &str) -> Self {
        Self {
            log,
            result: Err(msg.to_string()),
        }
    }
}

impl MethodFileUpdater for StubMethodUpdater {
    fn update(&mut self, _: &Path, per_well_dwell_s: f64) -> Result<MethodUpdate, BoxError> {
        self.log.push(Call::MethodUpdate(per_well_dwell_s));
        self.result.clone().map_err(|m| m.into())
    }
}

#[derive(Debug, Clone)]
pub struct RecordingAcquisition {
    log: CallLog,
}

impl RecordingAcquisition {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl AcquisitionSink for RecordingAcquisition {
    fn enqueue(&mut self, filename: &str, _: &Path, _: &Path) -> Result<(), BoxError> {
        self.log.push(Call::Enqueue(filename.to_string()));
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        self.log.push(Call::AcquisitionStop);
        Ok(())
    }
}

/// Keeps every accepted record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSink(Arc<Mutex<Vec<RunRecord>>>);

impl MemoryRecordSink {
    pub fn records(&self) -> Vec<RunRecord> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl RunRecordSink for MemoryRecordSink {
    fn accept(&mut self, record: &RunRecord) -> crate::error::Result<()> {
        if let Ok(mut v) = self.0.lock() {
            v.push(record.clone());
        }
        Ok(())
    }
}
