//! XML roster persistence
//!
//! Document layout (no attributes, no namespaces):
//!
//! ```text
//! <patients>
//!   <patient>
//!     <name/> <disease/> <doctor/> <specialization/> <date/> <status/>
//!   </patient>
//!   ...
//! </patients>
//! ```
//!
//! File helpers fail fast: nothing is returned unless the whole document was
//! read and parsed.

mod xml;

pub use xml::{deserialize, serialize, RECORD_TAG, ROOT_TAG};

use crate::types::{AppointmentRecord, RecordField, ValidationError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Whether records decoded from a document go through field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Apply the same rules as `RecordStore::add`.
    #[default]
    Strict,
    /// Take text fields verbatim; only the status must be a known literal.
    Raw,
}

impl LoadPolicy {
    pub const fn from_validate_flag(validate: bool) -> Self {
        if validate {
            Self::Strict
        } else {
            Self::Raw
        }
    }
}

/// Malformed or schema-violating roster document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed XML at byte {position}{}: {message}", record_suffix(.record))]
    Malformed {
        position: usize,
        record: Option<usize>,
        message: String,
    },

    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected root element <{found}>, expected <patients>")]
    UnexpectedRoot { found: String },

    #[error("record {record}: missing <{}> element", .field.xml_tag())]
    MissingField { record: usize, field: RecordField },

    #[error("record {record}: unknown status '{value}'")]
    InvalidStatus { record: usize, value: String },

    #[error("record {record}: {source}")]
    InvalidRecord {
        record: usize,
        #[source]
        source: ValidationError,
    },
}

fn record_suffix(record: &Option<usize>) -> String {
    record.map_or_else(String::new, |index| format!(" (record {index})"))
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("roster I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to encode roster XML: {0}")]
    Encode(String),
}

/// Serialize `records` and overwrite `path` with the result.
pub fn save_to_file(path: &Path, records: &[AppointmentRecord]) -> Result<(), CodecError> {
    let bytes = serialize(records)?;
    std::fs::write(path, bytes).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), records = records.len(), "Roster written");
    Ok(())
}

/// Read and decode a whole roster file.
pub fn load_from_file(
    path: &Path,
    policy: LoadPolicy,
) -> Result<Vec<AppointmentRecord>, CodecError> {
    let bytes = std::fs::read(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = deserialize(&bytes, policy)?;
    debug!(path = %path.display(), records = records.len(), ?policy, "Roster read");
    Ok(records)
}
