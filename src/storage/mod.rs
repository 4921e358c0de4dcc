//! In-memory appointment roster
//!
//! [`RecordStore`] holds the ordered records shown to the user. Insertion
//! order is the display order; duplicates are allowed. Every successful
//! mutation marks the store dirty until the next save.

mod shared;

pub use shared::SharedRecordStore;

use crate::types::{
    AppointmentDate, AppointmentRecord, RecordDraft, SearchField, SortField, SortOrder,
    ValidationError,
};
use chrono::NaiveDate;
use std::cmp::Ordering;
use thiserror::Error;

/// Requested index is not in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no record at index {index} (store holds {len})")]
pub struct NotFoundError {
    pub index: usize,
    pub len: usize,
}

/// Ordered collection of appointment records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<AppointmentRecord>,
    dirty: bool,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean (not dirty) store from already-loaded records.
    pub fn from_records(records: Vec<AppointmentRecord>) -> Self {
        Self {
            records,
            dirty: false,
        }
    }

    /// Validate a draft and append it. The store is untouched on failure.
    pub fn add(&mut self, draft: RecordDraft) -> Result<(), ValidationError> {
        let record = AppointmentRecord::new(draft)?;
        tracing::debug!(
            patient = record.patient_name(),
            date = %record.appointment_date(),
            "Record added"
        );
        self.records.push(record);
        self.dirty = true;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<AppointmentRecord, NotFoundError> {
        if index >= self.records.len() {
            return Err(NotFoundError {
                index,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(index);
        self.dirty = true;
        Ok(removed)
    }

    /// Swap in a whole new sequence (used by load).
    pub fn replace_all(&mut self, records: Vec<AppointmentRecord>) {
        self.records = records;
        self.dirty = true;
    }

    /// First index whose selected column contains `query`, ignoring case.
    ///
    /// A blank query matches nothing.
    pub fn search(&self, field: SearchField, query: &str) -> Option<usize> {
        if query.trim().is_empty() {
            return None;
        }
        let needle = query.to_lowercase();
        let column = field.column();
        self.records
            .iter()
            .position(|record| record.field(column).to_lowercase().contains(&needle))
    }

    /// Stable sort by the selected column.
    ///
    /// Dates compare chronologically. Text that is not a strict `dd.mm.yyyy`
    /// sorts after every valid date, ordered by its raw text.
    ///
    /// A valid date against unparsable text is therefore not a raw-text
    /// comparison: `"05.01.2024"` sorts before `"01/01/2020"` even though the
    /// raw strings order the other way. Comparing raw text only for mixed
    /// pairs is not transitive, and `slice::sort_by` needs a total order.
    pub fn sort_by(&mut self, field: SortField, order: SortOrder) {
        self.records.sort_by(|a, b| {
            let ordering = compare_records(field, a, b);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AppointmentRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppointmentRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[AppointmentRecord] {
        &self.records
    }

    /// Owned copy of the current sequence.
    pub fn snapshot(&self) -> Vec<AppointmentRecord> {
        self.records.clone()
    }

    /// True when the store changed since it was loaded or last saved.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a AppointmentRecord;
    type IntoIter = std::slice::Iter<'a, AppointmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Sort key for dates: parsed dates first, then unparsable text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DateKey<'a> {
    Parsed(NaiveDate),
    Raw(&'a str),
}

impl<'a> DateKey<'a> {
    fn of(date: &'a AppointmentDate) -> Self {
        date.parsed()
            .map_or_else(|| Self::Raw(date.as_str()), Self::Parsed)
    }
}

fn compare_records(field: SortField, a: &AppointmentRecord, b: &AppointmentRecord) -> Ordering {
    match field {
        SortField::PatientName => a.patient_name().cmp(b.patient_name()),
        SortField::AppointmentDate => {
            DateKey::of(a.appointment_date()).cmp(&DateKey::of(b.appointment_date()))
        }
    }
}
