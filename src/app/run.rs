//! Orchestration run state.
//!
//! Earlier firmware tracked the in-flight order through a single global
//! `log_id` integer, with nothing stopping a second order from starting
//! mid-run.  Here the run is an explicit two-state machine owned by the
//! service: a new order is rejected while one is `Running`.

/// Mutable state of one in-flight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRun {
    pub log_id: i64,
    pub total: u32,
    pub completed: u32,
}

/// {Idle, Running} state machine for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(ActiveRun),
}

impl RunState {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Begin a run.  Returns `false` (and stays put) if already running.
    pub fn begin(&mut self, log_id: i64, total: u32) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Running(ActiveRun {
                    log_id,
                    total,
                    completed: 0,
                });
                true
            }
            Self::Running(_) => false,
        }
    }

    /// Record one handled item.  No-op when idle.
    pub fn advance(&mut self) {
        if let Self::Running(run) = self {
            run.completed = (run.completed + 1).min(run.total);
        }
    }

    /// Clear the active-run marker.
    pub fn finish(&mut self) {
        *self = Self::Idle;
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        match self {
            Self::Running(run) => Some(run),
            Self::Idle => None,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
