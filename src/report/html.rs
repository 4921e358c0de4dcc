//! HTML report built from a template with `{{placeholder}}` slots.
//!
//! Supported placeholders:
//! - `{{rows}}`: one `<tr>` per record, cells HTML-escaped
//! - `{{count}}`: number of records
//! - `{{generated_at}}`: local timestamp of the render

use super::{RenderError, RenderRequest, ReportRenderer};
use crate::codec::{self, LoadPolicy};
use crate::types::{AppointmentRecord, AppointmentStatus, RecordField};
use chrono::{DateTime, Local};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

const GENERATED_AT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Renders the roster into an HTML table.
///
/// The data file is decoded without field validation so a report can always
/// be produced for whatever the roster holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReportRenderer;

impl ReportRenderer for HtmlReportRenderer {
    fn render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError> {
        if !request.template.exists() {
            return Err(RenderError::TemplateMissing(request.template.clone()));
        }
        if !request.data.exists() {
            return Err(RenderError::DataMissing(request.data.clone()));
        }

        let template =
            std::fs::read_to_string(&request.template).map_err(|source| RenderError::Io {
                path: request.template.clone(),
                source,
            })?;
        let records = codec::load_from_file(&request.data, LoadPolicy::Raw)?;
        let html = render_html(&template, &records, Local::now());

        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(&request.output, html).map_err(|source| RenderError::Io {
            path: request.output.clone(),
            source,
        })?;

        info!(
            output = %request.output.display(),
            records = records.len(),
            "HTML report created"
        );
        Ok(request.output.clone())
    }

    fn renderer_name(&self) -> &'static str {
        "HTML"
    }
}

/// Fill the template placeholders for `records`.
pub fn render_html(
    template: &str,
    records: &[AppointmentRecord],
    generated_at: DateTime<Local>,
) -> String {
    let mut rows = String::new();
    for record in records {
        rows.push_str("<tr>");
        for field in RecordField::ALL {
            let text = escape(record.field(field));
            if field == RecordField::Status {
                let _ = write!(rows, "<td class=\"{}\">{text}</td>", status_class(record.status()));
            } else {
                let _ = write!(rows, "<td>{text}</td>");
            }
        }
        rows.push_str("</tr>\n");
    }

    // Rows last so record text is never scanned for placeholders.
    template
        .replace("{{count}}", &records.len().to_string())
        .replace(
            "{{generated_at}}",
            &generated_at.format(GENERATED_AT_FORMAT).to_string(),
        )
        .replace("{{rows}}", &rows)
}

/// CSS class matching the table colouring (green / yellow / red).
const fn status_class(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Accepted => "status-accepted",
        AppointmentStatus::Waiting => "status-waiting",
        AppointmentStatus::Canceled => "status-canceled",
    }
}
