//! Record Store Property Tests
//!
//! Exercises add validation, search, sort and removal through the public
//! API, plus persistence of a roster through the XML codec.

use clinic_roster::codec::{self, LoadPolicy};
use clinic_roster::types::{
    AppointmentRecord, AppointmentStatus, RecordDraft, RecordField, SearchField, SortField, SortOrder,
    ValidationError,
};
use clinic_roster::{NotFoundError, RecordStore};

fn draft(name: &str, date: &str) -> RecordDraft {
    RecordDraft::new(name, "Flu", "Sidorova", "Therapist", date, "Waiting")
}

fn store_of(entries: &[(&str, &str)]) -> RecordStore {
    let mut store = RecordStore::new();
    for (name, date) in entries {
        store.add(draft(name, date)).expect("valid draft");
    }
    store
}

fn dates(store: &RecordStore) -> Vec<&str> {
    store.iter().map(|r| r.appointment_date().as_str()).collect()
}

// ============================================================================
// Add
// ============================================================================

#[test]
fn add_rejects_each_rule_with_its_own_error() {
    let mut store = RecordStore::new();

    let mut empty = draft("Ivanov", "01.01.2024");
    empty.disease = "   ".to_string();
    assert_eq!(
        store.add(empty),
        Err(ValidationError::EmptyField {
            field: RecordField::Disease
        })
    );

    assert!(matches!(
        store.add(draft("Ivanov2", "01.01.2024")),
        Err(ValidationError::InvalidName { .. })
    ));

    assert!(matches!(
        store.add(draft("Ivanov", "32.01.2024")),
        Err(ValidationError::InvalidDate { .. })
    ));

    let mut pending = draft("Ivanov", "01.01.2024");
    pending.status = "Pending".to_string();
    assert!(matches!(
        store.add(pending),
        Err(ValidationError::InvalidStatus { value }) if value == "Pending"
    ));

    assert!(store.is_empty(), "rejected drafts must not be stored");
    assert!(!store.is_dirty());
}

#[test]
fn add_rejects_non_padded_and_impossible_dates() {
    let mut store = RecordStore::new();
    for bad in ["1.01.2024", "01.1.2024", "29.02.2023", "2024-01-05", "01.01.24"] {
        assert!(
            matches!(
                store.add(draft("Ivanov", bad)),
                Err(ValidationError::InvalidDate { .. })
            ),
            "{bad} should be rejected"
        );
    }
    assert!(store.add(draft("Ivanov", "29.02.2024")).is_ok());
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn search_finds_first_case_insensitive_match() {
    let store = store_of(&[
        ("Petrov", "01.01.2024"),
        ("IVANOVA Anna", "02.01.2024"),
        ("Ivanov", "03.01.2024"),
    ]);
    assert_eq!(store.search(SearchField::PatientName, "ivan"), Some(1));
    assert_eq!(store.search(SearchField::DoctorName, "SIDOR"), Some(0));
    assert_eq!(store.search(SearchField::Disease, "cold"), None);
    assert_eq!(store.search(SearchField::PatientName, "   "), None);
}

// ============================================================================
// Sort
// ============================================================================

#[test]
fn sort_by_date_is_chronological() {
    let mut store = store_of(&[
        ("Alpha", "05.01.2024"),
        ("Beta", "01.01.2024"),
        ("Gamma", "10.01.2023"),
    ]);

    store.sort_by(SortField::AppointmentDate, SortOrder::Ascending);
    assert_eq!(dates(&store), ["10.01.2023", "01.01.2024", "05.01.2024"]);

    store.sort_by(SortField::AppointmentDate, SortOrder::Descending);
    assert_eq!(dates(&store), ["05.01.2024", "01.01.2024", "10.01.2023"]);
}

#[test]
fn sort_tolerates_unparsable_dates_from_raw_files() {
    let xml = br#"<patients>
  <patient><name>A</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>soon</date><status>Waiting</status></patient>
  <patient><name>B</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>05.01.2024</date><status>Waiting</status></patient>
  <patient><name>C</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>01.01.2024</date><status>Waiting</status></patient>
</patients>"#;
    let records = codec::deserialize(xml, LoadPolicy::Raw).expect("raw load");
    let mut store = RecordStore::from_records(records);

    store.sort_by(SortField::AppointmentDate, SortOrder::Ascending);
    assert_eq!(dates(&store), ["01.01.2024", "05.01.2024", "soon"]);
    assert!(store.is_dirty());
}

#[test]
fn valid_dates_sort_before_unparsable_text_in_both_orders() {
    let xml = br#"<patients>
  <patient><name>A</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>01/01/2020</date><status>Waiting</status></patient>
  <patient><name>B</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>05.01.2024</date><status>Waiting</status></patient>
  <patient><name>C</name><disease>x</disease><doctor>d</doctor><specialization>s</specialization><date>00/00/0000</date><status>Waiting</status></patient>
</patients>"#;
    let mut store = RecordStore::from_records(codec::deserialize(xml, LoadPolicy::Raw).unwrap());

    store.sort_by(SortField::AppointmentDate, SortOrder::Ascending);
    assert_eq!(dates(&store), ["05.01.2024", "00/00/0000", "01/01/2020"]);

    store.sort_by(SortField::AppointmentDate, SortOrder::Descending);
    assert_eq!(dates(&store), ["01/01/2020", "00/00/0000", "05.01.2024"]);
}

#[test]
fn sort_by_name_keeps_equal_names_in_insertion_order() {
    let mut store = store_of(&[
        ("Borisov", "03.01.2024"),
        ("Antonov", "02.01.2024"),
        ("Borisov", "01.01.2024"),
    ]);
    store.sort_by(SortField::PatientName, SortOrder::Ascending);
    let names: Vec<&str> = store.iter().map(AppointmentRecord::patient_name).collect();
    assert_eq!(names, ["Antonov", "Borisov", "Borisov"]);
    assert_eq!(dates(&store), ["02.01.2024", "03.01.2024", "01.01.2024"]);
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn remove_at_out_of_range_leaves_store_unchanged() {
    let mut empty = RecordStore::new();
    assert_eq!(empty.remove_at(0), Err(NotFoundError { index: 0, len: 0 }));

    let mut store = store_of(&[("Ivanov", "01.01.2024"), ("Petrov", "02.01.2024")]);
    store.mark_saved();
    assert_eq!(store.remove_at(2), Err(NotFoundError { index: 2, len: 2 }));
    assert_eq!(store.len(), 2);
    assert!(!store.is_dirty());

    let removed = store.remove_at(0).expect("in range");
    assert_eq!(removed.patient_name(), "Ivanov");
    assert_eq!(store.get(0).map(AppointmentRecord::patient_name), Some("Petrov"));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn roster_survives_save_and_reload() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let path = dir.path().join("roster.xml");

    let mut store = RecordStore::new();
    store
        .add(RecordDraft::new(
            "Анна Петрова",
            "Cough & <fever>",
            "O'Neil \"Doc\"",
            "Therapist",
            "05.01.2024",
            "Accepted",
        ))
        .unwrap();
    store.add(draft("Ivanov", "01.02.2024")).unwrap();

    codec::save_to_file(&path, store.records()).unwrap();
    let reloaded = codec::load_from_file(&path, LoadPolicy::Strict).unwrap();

    assert_eq!(reloaded, store.snapshot());
}

/// Every combination of names, free-text cells and statuses over a spread of
/// dates; all of them are valid drafts.
fn generated_drafts() -> Vec<RecordDraft> {
    const NAMES: [&str; 4] = ["Ivanov", "Анна Петрова", "John Smith", "Зоя"];
    const TEXTS: [&str; 5] = [
        "Flu",
        "Cough & <fever>",
        "\"quoted\" and 'apos'",
        "Ангина ]]> <![CDATA[x]]>",
        "tab\tand  double  space",
    ];

    let mut drafts = Vec::new();
    for (n, name) in NAMES.iter().enumerate() {
        for (t, text) in TEXTS.iter().enumerate() {
            for (s, status) in AppointmentStatus::ALL.iter().enumerate() {
                let i = n * 100 + t * 10 + s;
                let date = format!("{:02}.{:02}.{}", i % 28 + 1, i % 12 + 1, 2020 + i % 5);
                drafts.push(RecordDraft::new(
                    *name,
                    *text,
                    TEXTS[(t + 1) % TEXTS.len()],
                    TEXTS[(t + 2) % TEXTS.len()],
                    date,
                    status.as_str(),
                ));
            }
        }
    }
    drafts
}

#[test]
fn every_valid_record_round_trips_through_xml() {
    let drafts = generated_drafts();
    assert_eq!(drafts.len(), 4 * 5 * 3);

    let mut store = RecordStore::new();
    for draft in drafts {
        let record = AppointmentRecord::new(draft.clone()).expect("generated draft is valid");

        let single = codec::serialize(std::slice::from_ref(&record)).unwrap();
        assert_eq!(
            codec::deserialize(&single, LoadPolicy::Strict).unwrap(),
            [record.clone()],
            "{}",
            String::from_utf8_lossy(&single)
        );
        assert_eq!(codec::deserialize(&single, LoadPolicy::Raw).unwrap(), [record]);

        store.add(draft).unwrap();
    }

    let bytes = codec::serialize(store.records()).unwrap();
    assert_eq!(bytes, codec::serialize(&store.snapshot()).unwrap());
    assert_eq!(codec::deserialize(&bytes, LoadPolicy::Strict).unwrap(), store.snapshot());
}
