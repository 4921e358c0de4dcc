//! Roster Export Pipeline
//!
//! ## 3-Stage Architecture
//!
//! ```text
//! STAGE L: Load       (opens data_ready)
//! STAGE S: Serialize  (after data_ready, writes roster XML, opens xml_ready)
//! STAGE R: Render     (after xml_ready, builds the report)
//! ```
//!
//! GUARANTEE: Render never reads the XML before Serialize has finished writing it.

mod coordinator;
mod latch;
mod state;

pub use coordinator::{
    PipelineCoordinator, PipelineError, PipelineOptions, PipelineRun, PipelineStats,
};
pub use latch::Latch;
pub use state::*;
