//! clinic-roster - patient appointment roster
//!
//! # Usage
//!
//! ```bash
//! # Show the roster
//! clinic-roster list
//!
//! # Book an appointment
//! clinic-roster add --name "Ivan Petrov" --disease Flu --doctor "Anna Sidorova" \
//!     --specialization Therapist --date 05.01.2024 --status Waiting
//!
//! # Save, then build the HTML report through the pipeline
//! clinic-roster run-pipeline
//!
//! # PDF report from the saved roster
//! clinic-roster export --format pdf
//!
//! # Write the roster to another file
//! clinic-roster save-as backup/roster.xml
//! ```
//!
//! # Environment Variables
//!
//! - `CLINIC_CONFIG`: Path to the TOML config (default: ./clinic_config.toml)
//! - `CLINIC_USER` / `CLINIC_PASSWORD`: Login pair
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use clinic_roster::auth::{self, Credentials};
use clinic_roster::config::{self, ClinicConfig};
use clinic_roster::report::{RenderRequest, ReportFormat};
use clinic_roster::{
    LoadPolicy, PipelineCoordinator, PipelineOptions, RecordDraft, RecordField, SearchField,
    Session, SortField, SortOrder,
};
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "clinic-roster")]
#[command(about = "Patient appointment roster with XML storage and HTML/PDF reports")]
#[command(version)]
struct CliArgs {
    /// Login name
    #[arg(long, env = "CLINIC_USER", global = true, default_value = "")]
    user: String,

    /// Login password
    #[arg(long, env = "CLINIC_PASSWORD", global = true, default_value = "", hide_env_values = true)]
    password: String,

    /// Roster XML file (overrides storage.data_file)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print every record with its index
    List,

    /// Add a record and save
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        disease: String,
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        specialization: String,
        /// Appointment date, dd.mm.yyyy
        #[arg(long)]
        date: String,
        /// Accepted, Waiting or Canceled
        #[arg(long)]
        status: String,
    },

    /// Remove the record at INDEX and save
    Delete { index: usize },

    /// Find the first record whose column contains QUERY (case-insensitive)
    Search {
        #[arg(long, value_enum, default_value = "name")]
        by: SearchBy,
        query: String,
    },

    /// Sort the roster and save
    Sort {
        #[arg(long, value_enum, default_value = "name")]
        by: SortBy,
        /// Descending order
        #[arg(long)]
        desc: bool,
    },

    /// Write the roster to PATH and keep editing that file
    SaveAs { path: PathBuf },

    /// Render a report from the saved roster file
    Export {
        #[arg(long, value_enum, default_value = "html")]
        format: ExportFormat,
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Save the roster and build the report through the staged pipeline
    RunPipeline {
        #[arg(long, value_enum, default_value = "html")]
        format: ExportFormat,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Html,
    Pdf,
}

impl From<ExportFormat> for ReportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Html => Self::Html,
            ExportFormat::Pdf => Self::Pdf,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum SearchBy {
    Name,
    Doctor,
    Disease,
}

impl From<SearchBy> for SearchField {
    fn from(by: SearchBy) -> Self {
        match by {
            SearchBy::Name => Self::PatientName,
            SearchBy::Doctor => Self::DoctorName,
            SearchBy::Disease => Self::Disease,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum SortBy {
    Name,
    Date,
}

impl From<SortBy> for SortField {
    fn from(by: SortBy) -> Self {
        match by {
            SortBy::Name => Self::PatientName,
            SortBy::Date => Self::AppointmentDate,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    config::init(ClinicConfig::load());
    let cfg = config::get();

    auth::authenticate(&Credentials::from_config(&cfg.auth), &args.user, &args.password)
        .context("Login failed")?;

    let data_file = args.file.unwrap_or_else(|| cfg.storage.data_file.clone());
    let policy = LoadPolicy::from_validate_flag(cfg.storage.validate_on_load);

    match args.command {
        SubCommand::List => {
            let session = open_session(&data_file, policy)?;
            print_roster(&session);
        }

        SubCommand::Add {
            name,
            disease,
            doctor,
            specialization,
            date,
            status,
        } => {
            let session = open_session(&data_file, policy)?;
            let draft = RecordDraft::new(name, disease, doctor, specialization, date, status);
            session
                .store()
                .write()
                .add(draft)
                .context("Record rejected")?;
            save(&session)?;
        }

        SubCommand::Delete { index } => {
            let session = open_session(&data_file, policy)?;
            let removed = session.store().write().remove_at(index)?;
            info!(patient = %removed.patient_name(), "Record removed");
            save(&session)?;
        }

        SubCommand::Search { by, query } => {
            let session = open_session(&data_file, policy)?;
            let store = session.store().read();
            match store.search(by.into(), &query) {
                Some(index) => {
                    if let Some(record) = store.get(index) {
                        println!("{index}: {}", format_record(record));
                    }
                }
                None => println!("No match for '{query}'"),
            }
        }

        SubCommand::Sort { by, desc } => {
            let session = open_session(&data_file, policy)?;
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            session.store().write().sort_by(by.into(), order);
            save(&session)?;
            print_roster(&session);
        }

        SubCommand::SaveAs { path } => {
            let mut session = open_session(&data_file, policy)?;
            session
                .save_as(&path)
                .with_context(|| format!("Failed to save roster as {}", path.display()))?;
            println!("Roster saved to {}", path.display());
        }

        SubCommand::Export {
            format,
            template,
            output,
        } => {
            let format = ReportFormat::from(format);
            let request = RenderRequest {
                template: template.unwrap_or_else(|| cfg.report.template(format).to_path_buf()),
                data: data_file,
                output: output.unwrap_or_else(|| cfg.report.output(format).to_path_buf()),
            };
            let written = format
                .renderer(cfg.report.pdf_font.clone())
                .render(&request)
                .with_context(|| {
                    format!("{} report export failed", format.as_str().to_uppercase())
                })?;
            println!("Report written to {}", written.display());
        }

        SubCommand::RunPipeline { format } => {
            let format = ReportFormat::from(format);
            let session = open_session(&data_file, policy)?;
            if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut options = PipelineOptions::from_config(cfg, format);
            options.xml_path = data_file;

            let coordinator = PipelineCoordinator::new(
                session.store().clone(),
                format.renderer(cfg.report.pdf_font.clone()),
                options,
            );
            let report = coordinator.trigger()?.wait().await;
            if report.serialize.is_completed() {
                session.store().write().mark_saved();
            }

            println!("{report}");
            if !report.is_complete() {
                anyhow::bail!("Pipeline run #{} did not complete", report.run_id);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn open_session(path: &std::path::Path, policy: LoadPolicy) -> Result<Session> {
    Session::open_or_empty(path, policy)
        .with_context(|| format!("Failed to open roster {}", path.display()))
}

fn save(session: &Session) -> Result<()> {
    let path = session.save().context("Failed to save roster")?;
    info!(path = %path.display(), "Roster saved");
    Ok(())
}

fn print_roster(session: &Session) {
    let store = session.store().read();
    if store.is_empty() {
        println!("Roster is empty");
        return;
    }
    let header: Vec<&str> = RecordField::ALL.iter().map(|f| f.label()).collect();
    println!("#  | {}", header.join(" | "));
    for (index, record) in store.iter().enumerate() {
        println!("{index:<2} | {}", format_record(record));
    }
}

fn format_record(record: &clinic_roster::AppointmentRecord) -> String {
    RecordField::ALL
        .iter()
        .map(|&f| record.field(f))
        .collect::<Vec<_>>()
        .join(" | ")
}
