//! Shared data structures for the appointment roster
//!
//! - `AppointmentRecord`: one validated patient visit entry
//! - `RecordDraft`: raw six-column input awaiting validation
//! - `AppointmentStatus` / `AppointmentDate`: typed status and strict date
//! - `SearchField`, `SortField`, `SortOrder`: query selectors for the store

mod record;

pub use record::*;

use std::fmt;

/// Column a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    PatientName,
    DoctorName,
    Disease,
}

impl SearchField {
    pub const fn column(self) -> RecordField {
        match self {
            Self::PatientName => RecordField::PatientName,
            Self::DoctorName => RecordField::DoctorName,
            Self::Disease => RecordField::Disease,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Column the roster can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    PatientName,
    AppointmentDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}
