//! Controller state and the status returned from each scheduler step.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Method file, homing, acquisition and startup delay in progress.
    Arming,
    RunningWell(usize),
    RunningPoint(usize, usize),
    Completed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal() && self != Self::Idle
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Arming => f.write_str("arming"),
            Self::RunningWell(w) => write!(f, "running well {w}"),
            Self::RunningPoint(w, p) => write!(f, "running well {w} point {p}"),
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Public status of a single scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// A callback is pending; call `step` again after `next_in`.
    Running { next_in: Duration },
    Completed,
    Cancelled,
}
