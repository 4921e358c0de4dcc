//! Report rendering
//!
//! The pipeline treats rendering as an opaque service behind
//! [`ReportRenderer`]. Two implementations ship with the crate:
//! [`HtmlReportRenderer`] fills an HTML template, [`PdfReportRenderer`] lays
//! the roster out as a paged PDF table. Both read the roster XML file.

mod html;
mod pdf;

pub use html::{render_html, HtmlReportRenderer};
pub use pdf::{heading_lines, PdfReportRenderer};

use crate::codec::CodecError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Html,
    Pdf,
}

impl ReportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    /// Renderer for this format. `pdf_font` only affects PDF output.
    pub fn renderer(self, pdf_font: Option<PathBuf>) -> Arc<dyn ReportRenderer> {
        match self {
            Self::Html => Arc::new(HtmlReportRenderer),
            Self::Pdf => Arc::new(
                pdf_font.map_or_else(PdfReportRenderer::new, PdfReportRenderer::with_font),
            ),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs and destination of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Report template file
    pub template: PathBuf,
    /// Serialized roster XML the report is built from
    pub data: PathBuf,
    /// Where the finished report is written
    pub output: PathBuf,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("report template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("report data file not found: {}", .0.display())]
    DataMissing(PathBuf),

    #[error("report data could not be read: {0}")]
    Data(#[from] CodecError),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("report I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a report file from a template and a roster XML file.
///
/// Implementations are synchronous and must be thread-safe; the pipeline
/// calls them from a blocking worker.
pub trait ReportRenderer: Send + Sync {
    /// Render the report and return the path that was written.
    fn render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError>;

    /// Renderer name for logging
    fn renderer_name(&self) -> &'static str;
}
