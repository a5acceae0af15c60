//! Stage and acquisition collaborators.
//!
//! `SimulatedStage` stands in for the motion controller; `QueueFileSink`
//! drives the instrument's file-based acquisition queue.

pub mod error;
pub mod queue;

pub use error::HwError;
pub use queue::QueueFileSink;

use raster_traits::{BoxError, MotionDriver};

/// Simulated XY stage: logs every command and tracks its position.
#[derive(Debug, Default)]
pub struct SimulatedStage {
    position: (i64, i64),
    initiated: bool,
    moves: usize,
    fail_after_moves: Option<usize>,
    travel: Option<(i64, i64)>,
}

impl SimulatedStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject moves outside `0..=max` on either axis.
    pub fn with_travel(mut self, max_first: i64, max_second: i64) -> Self {
        self.travel = Some((max_first, max_second));
        self
    }

    /// Fault every move after the first `n`.
    pub fn fail_after_moves(mut self, n: usize) -> Self {
        self.fail_after_moves = Some(n);
        self
    }

    pub fn position(&self) -> (i64, i64) {
        self.position
    }

    pub fn is_initiated(&self) -> bool {
        self.initiated
    }

    pub fn moves(&self) -> usize {
        self.moves
    }
}

impl MotionDriver for SimulatedStage {
    fn initiate(&mut self) -> Result<(), BoxError> {
        self.initiated = true;
        tracing::info!("stage initiated (simulated)");
        Ok(())
    }

    fn go_home(&mut self) -> Result<(), BoxError> {
        self.position = (0, 0);
        tracing::info!("stage home (simulated)");
        Ok(())
    }

    fn go_to_position(&mut self, x_units: i64, y_units: i64) -> Result<(), BoxError> {
        if self.fail_after_moves.is_some_and(|n| self.moves >= n) {
            return Err(Box::new(HwError::Fault(format!(
                "no acknowledgement for move to ({x_units}, {y_units})"
            ))));
        }
        if let Some((mx, my)) = self.travel
            && !((0..=mx).contains(&x_units) && (0..=my).contains(&y_units))
        {
            return Err(Box::new(HwError::OutOfTravel(x_units, y_units)));
        }
        self.moves += 1;
        self.position = (x_units, y_units);
        tracing::debug!(x_units, y_units, "stage move (simulated)");
        Ok(())
    }

    fn contact_arm(&mut self, value: i32) -> Result<(), BoxError> {
        tracing::debug!(value, "contact arm (simulated)");
        Ok(())
    }
}
