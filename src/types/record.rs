//! Appointment record types
//!
//! An [`AppointmentRecord`] is one patient visit entry. Records entering the
//! roster through [`AppointmentRecord::new`] are fully validated; records
//! decoded with validation disabled keep their text verbatim, which is why the
//! date is stored as [`AppointmentDate`] (raw text plus an on-demand parse)
//! rather than as a bare `NaiveDate`.

use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Wire and display date format (`dd.mm.yyyy`).
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Latin and Cyrillic letters plus whitespace.
const PATIENT_NAME_PATTERN: &str = r"^[a-zA-Zа-яА-Я\s]+$";

// The pattern is a compile-time constant, so building it cannot fail at runtime.
#[allow(clippy::expect_used)]
fn patient_name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(PATIENT_NAME_PATTERN).expect("patient name pattern is a valid regex")
    })
}

// ============================================================================
// Record Fields
// ============================================================================

/// The six columns of the roster, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    PatientName,
    Disease,
    DoctorName,
    DoctorSpecialization,
    AppointmentDate,
    Status,
}

impl RecordField {
    /// All fields in the fixed order used by the XML document and reports.
    pub const ALL: [Self; 6] = [
        Self::PatientName,
        Self::Disease,
        Self::DoctorName,
        Self::DoctorSpecialization,
        Self::AppointmentDate,
        Self::Status,
    ];

    /// Position of the field in [`RecordField::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::PatientName => 0,
            Self::Disease => 1,
            Self::DoctorName => 2,
            Self::DoctorSpecialization => 3,
            Self::AppointmentDate => 4,
            Self::Status => 5,
        }
    }

    /// Element name used in the persisted XML document.
    pub const fn xml_tag(self) -> &'static str {
        match self {
            Self::PatientName => "name",
            Self::Disease => "disease",
            Self::DoctorName => "doctor",
            Self::DoctorSpecialization => "specialization",
            Self::AppointmentDate => "date",
            Self::Status => "status",
        }
    }

    pub fn from_xml_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.xml_tag() == tag)
    }

    /// Human-readable column heading.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PatientName => "patient name",
            Self::Disease => "disease",
            Self::DoctorName => "doctor name",
            Self::DoctorSpecialization => "doctor specialization",
            Self::AppointmentDate => "appointment date",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Appointment status. The wire form is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Accepted,
    Waiting,
    Canceled,
}

impl AppointmentStatus {
    pub const ALL: [Self; 3] = [Self::Accepted, Self::Waiting, Self::Canceled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Waiting => "Waiting",
            Self::Canceled => "Canceled",
        }
    }

    /// Parse the exact wire literal (`Accepted`, `Waiting`, `Canceled`).
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Date
// ============================================================================

/// Appointment date as entered, with strict parsing on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppointmentDate(String);

impl AppointmentDate {
    /// Wrap text without checking it. Used by the unvalidated load path.
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar date, or `None` when the text is not a strict `dd.mm.yyyy`.
    pub fn parsed(&self) -> Option<NaiveDate> {
        parse_strict_date(&self.0)
    }
}

impl fmt::Display for AppointmentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strict `dd.mm.yyyy`: zero-padded, no overflow days or months.
pub fn parse_strict_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'.' || bytes[5] != b'.' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

// ============================================================================
// Validation
// ============================================================================

/// Why a draft was refused. Rules are checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("all fields must be filled in ({field} is empty)")]
    EmptyField { field: RecordField },

    #[error("patient name may contain only letters and spaces: '{value}'")]
    InvalidName { value: String },

    #[error("invalid appointment date '{value}', expected dd.mm.yyyy")]
    InvalidDate { value: String },

    #[error("invalid status '{value}', allowed: Accepted, Waiting, Canceled")]
    InvalidStatus { value: String },
}

/// Raw user input for a new record, one string per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub patient_name: String,
    pub disease: String,
    pub doctor_name: String,
    pub doctor_specialization: String,
    pub appointment_date: String,
    pub status: String,
}

impl RecordDraft {
    pub fn new(
        patient_name: impl Into<String>,
        disease: impl Into<String>,
        doctor_name: impl Into<String>,
        doctor_specialization: impl Into<String>,
        appointment_date: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            patient_name: patient_name.into(),
            disease: disease.into(),
            doctor_name: doctor_name.into(),
            doctor_specialization: doctor_specialization.into(),
            appointment_date: appointment_date.into(),
            status: status.into(),
        }
    }

    fn value(&self, field: RecordField) -> &str {
        match field {
            RecordField::PatientName => &self.patient_name,
            RecordField::Disease => &self.disease,
            RecordField::DoctorName => &self.doctor_name,
            RecordField::DoctorSpecialization => &self.doctor_specialization,
            RecordField::AppointmentDate => &self.appointment_date,
            RecordField::Status => &self.status,
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// One patient visit entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRecord {
    patient_name: String,
    disease: String,
    doctor_name: String,
    doctor_specialization: String,
    appointment_date: AppointmentDate,
    status: AppointmentStatus,
}

impl AppointmentRecord {
    /// Validate a draft and build a record from its trimmed values.
    ///
    /// Checks, first failure wins:
    /// 1. every field is non-blank (in column order)
    /// 2. the patient name holds only letters and whitespace
    /// 3. the date is a strict `dd.mm.yyyy`
    /// 4. the status is one of the three wire literals
    pub fn new(draft: RecordDraft) -> Result<Self, ValidationError> {
        for field in RecordField::ALL {
            if draft.value(field).trim().is_empty() {
                return Err(ValidationError::EmptyField { field });
            }
        }

        let patient_name = draft.patient_name.trim();
        if !patient_name_regex().is_match(patient_name) {
            return Err(ValidationError::InvalidName {
                value: patient_name.to_string(),
            });
        }

        let date_text = draft.appointment_date.trim();
        if parse_strict_date(date_text).is_none() {
            return Err(ValidationError::InvalidDate {
                value: date_text.to_string(),
            });
        }

        let status_text = draft.status.trim();
        let status = AppointmentStatus::from_wire(status_text).ok_or_else(|| {
            ValidationError::InvalidStatus {
                value: status_text.to_string(),
            }
        })?;

        Ok(Self {
            patient_name: patient_name.to_string(),
            disease: draft.disease.trim().to_string(),
            doctor_name: draft.doctor_name.trim().to_string(),
            doctor_specialization: draft.doctor_specialization.trim().to_string(),
            appointment_date: AppointmentDate::from_raw(date_text),
            status,
        })
    }

    /// Build a record without field validation; only the status is typed.
    pub(crate) fn from_unvalidated(draft: RecordDraft, status: AppointmentStatus) -> Self {
        Self {
            patient_name: draft.patient_name,
            disease: draft.disease,
            doctor_name: draft.doctor_name,
            doctor_specialization: draft.doctor_specialization,
            appointment_date: AppointmentDate::from_raw(draft.appointment_date),
            status,
        }
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn disease(&self) -> &str {
        &self.disease
    }

    pub fn doctor_name(&self) -> &str {
        &self.doctor_name
    }

    pub fn doctor_specialization(&self) -> &str {
        &self.doctor_specialization
    }

    pub const fn appointment_date(&self) -> &AppointmentDate {
        &self.appointment_date
    }

    pub const fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// Text of a column, as persisted.
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::PatientName => &self.patient_name,
            RecordField::Disease => &self.disease,
            RecordField::DoctorName => &self.doctor_name,
            RecordField::DoctorSpecialization => &self.doctor_specialization,
            RecordField::AppointmentDate => self.appointment_date.as_str(),
            RecordField::Status => self.status.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RecordDraft {
        RecordDraft::new(
            "Ivanov Ivan",
            "Flu",
            "Petrov",
            "Therapist",
            "05.01.2024",
            "Waiting",
        )
    }

    #[test]
    fn test_valid_draft_builds_trimmed_record() {
        let mut d = draft();
        d.disease = "  Flu ".to_string();
        let record = AppointmentRecord::new(d).unwrap();
        assert_eq!(record.disease(), "Flu");
        assert_eq!(record.status(), AppointmentStatus::Waiting);
        assert_eq!(
            record.appointment_date().parsed(),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_cyrillic_name_accepted() {
        let mut d = draft();
        d.patient_name = "Иванов Иван".to_string();
        assert!(AppointmentRecord::new(d).is_ok());
    }

    #[test]
    fn test_empty_field_reported_before_other_rules() {
        let mut d = draft();
        d.patient_name = "R2D2".to_string();
        d.doctor_specialization = "   ".to_string();
        assert_eq!(
            AppointmentRecord::new(d),
            Err(ValidationError::EmptyField {
                field: RecordField::DoctorSpecialization
            })
        );
    }

    #[test]
    fn test_name_rule_checked_before_date() {
        let mut d = draft();
        d.patient_name = "Ivanov 2".to_string();
        d.appointment_date = "nonsense".to_string();
        assert!(matches!(
            AppointmentRecord::new(d),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_strict_date_parsing() {
        assert!(parse_strict_date("29.02.2024").is_some());
        assert!(parse_strict_date("29.02.2023").is_none());
        assert!(parse_strict_date("32.01.2024").is_none());
        assert!(parse_strict_date("01.13.2024").is_none());
        assert!(parse_strict_date("1.1.2024").is_none());
        assert!(parse_strict_date("01-01-2024").is_none());
        assert!(parse_strict_date("01.01.+024").is_none());
    }

    #[test]
    fn test_status_is_case_sensitive() {
        assert_eq!(
            AppointmentStatus::from_wire("Canceled"),
            Some(AppointmentStatus::Canceled)
        );
        assert_eq!(AppointmentStatus::from_wire("canceled"), None);
        assert_eq!(AppointmentStatus::from_wire("Cancelled"), None);
    }

    #[test]
    fn test_field_tags_round_trip() {
        for field in RecordField::ALL {
            assert_eq!(RecordField::from_xml_tag(field.xml_tag()), Some(field));
            assert_eq!(RecordField::ALL[field.index()], field);
        }
        assert_eq!(RecordField::from_xml_tag("patient"), None);
    }
}
