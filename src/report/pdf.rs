//! PDF report: a heading from a plain-text template above the roster table.
//!
//! The template is plain text. Each line becomes one heading line (the first
//! one larger, as the title); `{{count}}` and `{{generated_at}}` are filled
//! as in the HTML report. The table is laid out on A4 landscape pages with a
//! header row repeated on every page.

use super::{RenderError, RenderRequest, ReportRenderer};
use crate::codec::{self, LoadPolicy};
use crate::types::{AppointmentRecord, AppointmentStatus, RecordField};
use chrono::{DateTime, Local};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

const GENERATED_AT_FORMAT: &str = "%d.%m.%Y %H:%M";

// ============================================================================
// Page Geometry (millimetres, A4 landscape)
// ============================================================================

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const TITLE_HEIGHT: f32 = 10.0;
const LINE_HEIGHT: f32 = 6.0;

/// Left edge of each column, in `RecordField::ALL` order.
const COLUMN_X: [f32; 6] = [15.0, 62.0, 109.0, 156.0, 210.0, 245.0];

/// Cell text beyond this many characters is cut with an ellipsis.
const MAX_CELL_CHARS: usize = 26;

const TITLE_SIZE: f32 = 16.0;
const TEXT_SIZE: f32 = 10.0;

/// Renders the roster into a paged PDF table.
///
/// Without a font file the built-in Helvetica is used, which only covers
/// Latin-1 text. Point [`PdfReportRenderer::with_font`] at a TrueType font
/// to print Cyrillic names.
#[derive(Debug, Clone, Default)]
pub struct PdfReportRenderer {
    font: Option<PathBuf>,
}

impl PdfReportRenderer {
    pub const fn new() -> Self {
        Self { font: None }
    }

    /// Embed the TrueType font at `path` instead of Helvetica.
    pub fn with_font(path: impl Into<PathBuf>) -> Self {
        Self {
            font: Some(path.into()),
        }
    }

    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }
}

impl ReportRenderer for PdfReportRenderer {
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
        let heading = heading_lines(&template, records.len(), Local::now());
        let bytes = self.render_pdf(&heading, &records)?;

        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(&request.output, bytes).map_err(|source| RenderError::Io {
            path: request.output.clone(),
            source,
        })?;

        info!(
            output = %request.output.display(),
            records = records.len(),
            "PDF report created"
        );
        Ok(request.output.clone())
    }

    fn renderer_name(&self) -> &'static str {
        "PDF"
    }
}

impl PdfReportRenderer {
    /// Lay out `heading` and `records` and return the encoded document.
    pub fn render_pdf(
        &self,
        heading: &[String],
        records: &[AppointmentRecord],
    ) -> Result<Vec<u8>, RenderError> {
        let title = heading.first().map_or("Clinic roster", String::as_str);
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Roster");
        let font = self.load_font(&doc)?;

        let first_capacity = rows_that_fit(heading_height(heading.len()));
        let capacity = rows_that_fit(0.0);
        let pages = split_pages(records.len(), first_capacity, capacity);

        for (number, rows) in pages.into_iter().enumerate() {
            let layer = if number == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(
                    Mm(PAGE_WIDTH),
                    Mm(PAGE_HEIGHT),
                    format!("Roster {}", number + 1),
                );
                doc.get_page(page).get_layer(layer)
            };

            let mut y = PAGE_HEIGHT - MARGIN;
            if number == 0 {
                for (i, line) in heading.iter().enumerate() {
                    let (size, step) = if i == 0 {
                        (TITLE_SIZE, TITLE_HEIGHT)
                    } else {
                        (TEXT_SIZE, LINE_HEIGHT)
                    };
                    layer.use_text(line.as_str(), size, Mm(MARGIN), Mm(y), &font);
                    y -= step;
                }
                if !heading.is_empty() {
                    y -= LINE_HEIGHT;
                }
            }

            for (field, x) in RecordField::ALL.iter().zip(COLUMN_X) {
                layer.use_text(column_title(*field), TEXT_SIZE, Mm(x), Mm(y), &font);
            }
            y -= LINE_HEIGHT;

            for record in &records[rows] {
                draw_row(&layer, &font, record, y);
                y -= LINE_HEIGHT;
            }
        }

        doc.save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }

    fn load_font(&self, doc: &PdfDocumentReference) -> Result<IndirectFontRef, RenderError> {
        match &self.font {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| RenderError::Io {
                    path: path.clone(),
                    source,
                })?;
                doc.add_external_font(file)
                    .map_err(|e| RenderError::Pdf(format!("{}: {e}", path.display())))
            }
            None => doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| RenderError::Pdf(e.to_string())),
        }
    }
}

fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, record: &AppointmentRecord, y: f32) {
    for (field, x) in RecordField::ALL.iter().zip(COLUMN_X) {
        let text = truncate_cell(record.field(*field));
        if *field == RecordField::Status {
            layer.set_fill_color(status_color(record.status()));
            layer.use_text(text, TEXT_SIZE, Mm(x), Mm(y), font);
            layer.set_fill_color(black());
        } else {
            layer.use_text(text, TEXT_SIZE, Mm(x), Mm(y), font);
        }
    }
}

/// Template lines with placeholders filled; blank lines are dropped.
pub fn heading_lines(template: &str, count: usize, generated_at: DateTime<Local>) -> Vec<String> {
    let count = count.to_string();
    let generated_at = generated_at.format(GENERATED_AT_FORMAT).to_string();
    template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.replace("{{count}}", &count)
                .replace("{{generated_at}}", &generated_at)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn heading_height(lines: usize) -> f32 {
    match lines {
        0 => 0.0,
        n => TITLE_HEIGHT + (n - 1) as f32 * LINE_HEIGHT + LINE_HEIGHT,
    }
}

/// Table rows that fit below `reserved` millimetres of heading.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rows_that_fit(reserved: f32) -> usize {
    // One line goes to the column header.
    let usable = PAGE_HEIGHT - 2.0 * MARGIN - reserved - LINE_HEIGHT;
    ((usable / LINE_HEIGHT).floor() as usize).max(1)
}

/// Record ranges per page. An empty roster still gets one (header-only) page.
fn split_pages(total: usize, first_capacity: usize, capacity: usize) -> Vec<Range<usize>> {
    let first_end = total.min(first_capacity.max(1));
    let mut pages = vec![0..first_end];
    let mut start = first_end;
    while start < total {
        let end = total.min(start + capacity.max(1));
        pages.push(start..end);
        start = end;
    }
    pages
}

fn truncate_cell(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
    cut.push('…');
    cut
}

const fn column_title(field: RecordField) -> &'static str {
    match field {
        RecordField::PatientName => "Patient",
        RecordField::Disease => "Disease",
        RecordField::DoctorName => "Doctor",
        RecordField::DoctorSpecialization => "Specialization",
        RecordField::AppointmentDate => "Date",
        RecordField::Status => "Status",
    }
}

/// Same green / yellow / red as the HTML status classes.
fn status_color(status: AppointmentStatus) -> Color {
    let (r, g, b) = match status {
        AppointmentStatus::Accepted => (0.0, 0.5, 0.0),
        AppointmentStatus::Waiting => (0.8, 0.6, 0.0),
        AppointmentStatus::Canceled => (0.8, 0.0, 0.0),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}
