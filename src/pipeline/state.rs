//! Run outcome types
//!
//! A [`RunReport`] records how each of the three stages of one pipeline run
//! ended. It is only available once every stage task has finished.

use std::fmt;

/// Stages of a pipeline run, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Signals that roster data is ready
    Load,
    /// Writes the roster snapshot as XML
    Serialize,
    /// Builds the report from the written XML
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load => write!(f, "Load"),
            Stage::Serialize => write!(f, "Serialize"),
            Stage::Render => write!(f, "Render"),
        }
    }
}

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// The stage ran and its work failed
    Failed(String),
    /// The stage's gate never opened before cancellation or timeout
    Starved,
}

impl StageOutcome {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Completed => write!(f, "completed"),
            StageOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            StageOutcome::Starved => write!(f, "starved (gate never opened)"),
        }
    }
}

/// Final state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    pub load: StageOutcome,
    pub serialize: StageOutcome,
    pub render: StageOutcome,
}

impl RunReport {
    /// True when all three stages completed.
    pub const fn is_complete(&self) -> bool {
        self.load.is_completed() && self.serialize.is_completed() && self.render.is_completed()
    }

    pub const fn outcome(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Load => &self.load,
            Stage::Serialize => &self.serialize,
            Stage::Render => &self.render,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run #{}: load {}, serialize {}, render {}",
            self.run_id, self.load, self.serialize, self.render
        )
    }
}
