//! State-change notifications for whoever hosts the controller.

use crate::status::{RunOutcome, RunState};

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    StateChanged {
        from: RunState,
        to: RunState,
    },
    WellStarted {
        index: usize,
        label: String,
        start_s: f64,
    },
    PointVisited {
        well: usize,
        point: usize,
        x_units: i64,
        y_units: i64,
    },
    WellCompleted {
        index: usize,
        label: String,
        end_s: f64,
    },
    Finished(RunOutcome),
}

pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);
}

impl<F: FnMut(&RunEvent)> RunObserver for F {
    fn on_event(&mut self, event: &RunEvent) {
        self(event);
    }
}
