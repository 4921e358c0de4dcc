//! Clinic Roster: patient appointment bookkeeping
//!
//! ## Architecture
//!
//! - **Record Store**: ordered, validated appointment records with search and sort
//! - **XML Codec**: fixed-schema `<patients><patient>` persistence
//! - **Pipeline**: load → serialize → render, gated by one-shot latches
//! - **Report**: HTML or PDF report from the saved roster

pub mod auth;
pub mod codec;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::ClinicConfig;

// Re-export commonly used types
pub use types::{
    AppointmentDate, AppointmentRecord, AppointmentStatus, RecordDraft, RecordField,
    SearchField, SortField, SortOrder, ValidationError,
};

// Re-export storage and persistence
pub use codec::{CodecError, LoadPolicy, ParseError};
pub use session::{Session, SessionError};
pub use storage::{NotFoundError, RecordStore, SharedRecordStore};

// Re-export pipeline components
pub use pipeline::{PipelineCoordinator, PipelineError, PipelineOptions, RunReport, StageOutcome};
pub use report::{
    HtmlReportRenderer, PdfReportRenderer, RenderError, RenderRequest, ReportFormat,
    ReportRenderer,
};
