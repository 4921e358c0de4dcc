//! quick-xml encoder and decoder for the roster document.

use super::{CodecError, LoadPolicy, ParseError};
use crate::types::{AppointmentRecord, AppointmentStatus, RecordDraft, RecordField};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Root element wrapping all records.
pub const ROOT_TAG: &str = "patients";

/// Element holding one record.
pub const RECORD_TAG: &str = "patient";

const INDENT_WIDTH: usize = 2;

// ============================================================================
// Encoding
// ============================================================================

/// Encode records as a UTF-8 XML document.
///
/// Output is deterministic: equal input sequences give identical bytes.
pub fn serialize(records: &[AppointmentRecord]) -> Result<Vec<u8>, CodecError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(encode_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_TAG)))
        .map_err(encode_error)?;

    for record in records {
        writer
            .write_event(Event::Start(BytesStart::new(RECORD_TAG)))
            .map_err(encode_error)?;
        for field in RecordField::ALL {
            let tag = field.xml_tag();
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(encode_error)?;
            writer
                .write_event(Event::Text(BytesText::new(record.field(field))))
                .map_err(encode_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(encode_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(RECORD_TAG)))
            .map_err(encode_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_TAG)))
        .map_err(encode_error)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn encode_error(e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode(e.to_string())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a roster document.
///
/// Children of `<patient>` may come in any order; the first occurrence of
/// each wins and unknown elements are skipped. With [`LoadPolicy::Strict`]
/// every record is re-validated as if it had been added by hand.
pub fn deserialize(
    bytes: &[u8],
    policy: LoadPolicy,
) -> Result<Vec<AppointmentRecord>, ParseError> {
    DocumentParser::new(bytes).parse(policy)
}

/// Owned view of the events the parser cares about.
enum Token {
    Open(String),
    Empty(String),
    Close,
    Text(String),
    Eof,
}

struct DocumentParser<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
}

impl<'a> DocumentParser<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(bytes),
            buf: Vec::new(),
        }
    }

    fn parse(mut self, policy: LoadPolicy) -> Result<Vec<AppointmentRecord>, ParseError> {
        let root = loop {
            match self.next_token(None)? {
                Token::Open(name) => break name,
                Token::Empty(name) if name == ROOT_TAG => return Ok(Vec::new()),
                Token::Empty(name) => return Err(ParseError::UnexpectedRoot { found: name }),
                Token::Text(text) if text.trim().is_empty() => {}
                Token::Text(_) | Token::Close => {
                    return Err(self.malformed(None, "content outside the root element"));
                }
                Token::Eof => return Err(ParseError::MissingRoot),
            }
        };
        if root != ROOT_TAG {
            return Err(ParseError::UnexpectedRoot { found: root });
        }

        let mut records = Vec::new();
        loop {
            match self.next_token(None)? {
                Token::Open(name) if name == RECORD_TAG => {
                    let index = records.len();
                    let fields = self.parse_record(index)?;
                    records.push(fields.into_record(index, policy)?);
                }
                Token::Empty(name) if name == RECORD_TAG => {
                    let index = records.len();
                    records.push(RawFields::default().into_record(index, policy)?);
                }
                Token::Open(name) => self.skip_element(&name, None)?,
                Token::Empty(_) | Token::Text(_) => {}
                Token::Close => break,
                Token::Eof => {
                    return Err(self.malformed(None, "document ends inside <patients>"));
                }
            }
        }

        loop {
            match self.next_token(None)? {
                Token::Eof => return Ok(records),
                Token::Text(text) if text.trim().is_empty() => {}
                _ => return Err(self.malformed(None, "content after the root element")),
            }
        }
    }

    fn parse_record(&mut self, index: usize) -> Result<RawFields, ParseError> {
        let mut fields = RawFields::default();
        loop {
            match self.next_token(Some(index))? {
                Token::Open(name) => match RecordField::from_xml_tag(&name) {
                    Some(field) => {
                        let text = self.read_field_text(&name, index)?;
                        fields.set(field, text);
                    }
                    None => self.skip_element(&name, Some(index))?,
                },
                Token::Empty(name) => {
                    if let Some(field) = RecordField::from_xml_tag(&name) {
                        fields.set(field, String::new());
                    }
                }
                Token::Text(_) => {}
                Token::Close => return Ok(fields),
                Token::Eof => {
                    return Err(self.malformed(Some(index), "document ends inside <patient>"));
                }
            }
        }
    }

    /// Collect the text of a leaf element up to its closing tag.
    fn read_field_text(&mut self, name: &str, index: usize) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.next_token(Some(index))? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Close => return Ok(text),
                Token::Open(child) | Token::Empty(child) => {
                    return Err(self.malformed(
                        Some(index),
                        format!("unexpected element <{child}> inside <{name}>"),
                    ));
                }
                Token::Eof => {
                    return Err(self.malformed(Some(index), format!("document ends inside <{name}>")));
                }
            }
        }
    }

    fn skip_element(&mut self, name: &str, record: Option<usize>) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token(record)? {
                Token::Open(_) => depth += 1,
                Token::Close => depth -= 1,
                Token::Empty(_) | Token::Text(_) => {}
                Token::Eof => {
                    return Err(self.malformed(record, format!("document ends inside <{name}>")));
                }
            }
        }
        Ok(())
    }

    fn next_token(&mut self, record: Option<usize>) -> Result<Token, ParseError> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(ParseError::Malformed {
                        position: self.reader.buffer_position(),
                        record,
                        message: e.to_string(),
                    });
                }
            };
            let token = match event {
                Event::Start(e) => Token::Open(tag_name(e.name().as_ref())),
                Event::Empty(e) => Token::Empty(tag_name(e.name().as_ref())),
                Event::End(_) => Token::Close,
                Event::Text(e) => match e.unescape() {
                    Ok(text) => Token::Text(text.into_owned()),
                    Err(err) => {
                        return Err(ParseError::Malformed {
                            position: self.reader.buffer_position(),
                            record,
                            message: err.to_string(),
                        });
                    }
                },
                Event::CData(e) => Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => Token::Eof,
                _ => continue,
            };
            return Ok(token);
        }
    }

    fn malformed(&self, record: Option<usize>, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            position: self.reader.buffer_position(),
            record,
            message: message.into(),
        }
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Child texts of one `<patient>`, indexed by [`RecordField::index`].
#[derive(Default)]
struct RawFields {
    values: [Option<String>; 6],
}

impl RawFields {
    fn set(&mut self, field: RecordField, text: String) {
        let slot = &mut self.values[field.index()];
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn take(&mut self, field: RecordField, record: usize) -> Result<String, ParseError> {
        self.values[field.index()]
            .take()
            .ok_or(ParseError::MissingField { record, field })
    }

    fn into_record(
        mut self,
        record: usize,
        policy: LoadPolicy,
    ) -> Result<AppointmentRecord, ParseError> {
        let draft = RecordDraft {
            patient_name: self.take(RecordField::PatientName, record)?,
            disease: self.take(RecordField::Disease, record)?,
            doctor_name: self.take(RecordField::DoctorName, record)?,
            doctor_specialization: self.take(RecordField::DoctorSpecialization, record)?,
            appointment_date: self.take(RecordField::AppointmentDate, record)?,
            status: self.take(RecordField::Status, record)?,
        };

        match policy {
            LoadPolicy::Strict => AppointmentRecord::new(draft)
                .map_err(|source| ParseError::InvalidRecord { record, source }),
            LoadPolicy::Raw => {
                let status = AppointmentStatus::from_wire(&draft.status).ok_or_else(|| {
                    ParseError::InvalidStatus {
                        record,
                        value: draft.status.clone(),
                    }
                })?;
                Ok(AppointmentRecord::from_unvalidated(draft, status))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationError;

    fn record(name: &str, disease: &str, date: &str, status: &str) -> AppointmentRecord {
        AppointmentRecord::new(RecordDraft::new(
            name,
            disease,
            "Petrov",
            "Cardiology",
            date,
            status,
        ))
        .unwrap()
    }

    fn wrap(body: &str) -> Vec<u8> {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><patients>{body}</patients>").into_bytes()
    }

    const FULL_PATIENT: &str = "<patient><name>Ivanov</name><disease>Flu</disease>\
        <doctor>Petrov</doctor><specialization>Therapist</specialization>\
        <date>05.01.2024</date><status>Waiting</status></patient>";

    #[test]
    fn test_serialize_layout() {
        let xml = serialize(&[record("Ivanov", "Flu", "05.01.2024", "Waiting")]).unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<name>Ivanov</name>"));
        let order: Vec<usize> = RecordField::ALL
            .iter()
            .map(|f| text.find(&format!("<{}>", f.xml_tag())).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "children in fixed order");
    }

    #[test]
    fn test_serialize_is_deterministic_and_escaped() {
        let records = vec![record("Ivanov", "Flu <acute> & \"fever\"", "05.01.2024", "Accepted")];
        let a = serialize(&records).unwrap();
        let b = serialize(&records).unwrap();
        assert_eq!(a, b);
        let text = String::from_utf8(a).unwrap();
        assert!(text.contains("&lt;acute&gt; &amp;"));
        assert_eq!(deserialize(&b, LoadPolicy::Strict).unwrap(), records);
    }

    #[test]
    fn test_empty_roster() {
        let xml = serialize(&[]).unwrap();
        assert!(deserialize(&xml, LoadPolicy::Strict).unwrap().is_empty());
        assert!(deserialize(b"<patients/>", LoadPolicy::Strict).unwrap().is_empty());
    }

    #[test]
    fn test_children_in_any_order_and_unknown_skipped() {
        let body = "<patient><status>Accepted</status><note><b>x</b></note>\
            <date>01.02.2024</date><specialization>ENT</specialization>\
            <doctor>Sidorov</doctor><disease>Otitis</disease><name>Petrova</name></patient>";
        let records = deserialize(&wrap(body), LoadPolicy::Strict).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patient_name(), "Petrova");
        assert_eq!(records[0].doctor_specialization(), "ENT");
    }

    #[test]
    fn test_missing_child_names_record_index() {
        let broken = "<patient><name>Petrova</name><disease>Flu</disease>\
            <doctor>Petrov</doctor><specialization>ENT</specialization>\
            <status>Accepted</status></patient>";
        let doc = wrap(&format!("{FULL_PATIENT}{broken}"));
        assert_eq!(
            deserialize(&doc, LoadPolicy::Raw),
            Err(ParseError::MissingField {
                record: 1,
                field: RecordField::AppointmentDate
            })
        );
    }

    #[test]
    fn test_unclosed_record_is_malformed() {
        let doc = b"<patients><patient><name>Ivanov</name>";
        match deserialize(doc, LoadPolicy::Raw) {
            Err(ParseError::Malformed { record, .. }) => assert_eq!(record, Some(0)),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let doc = b"<patients><patient><name>Ivanov</disease></patient></patients>";
        assert!(matches!(
            deserialize(doc, LoadPolicy::Raw),
            Err(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_wrong_root_rejected() {
        assert_eq!(
            deserialize(b"<doctors></doctors>", LoadPolicy::Raw),
            Err(ParseError::UnexpectedRoot {
                found: "doctors".to_string()
            })
        );
        assert_eq!(deserialize(b"", LoadPolicy::Raw), Err(ParseError::MissingRoot));
    }

    #[test]
    fn test_raw_policy_keeps_invalid_text() {
        let body = "<patient><name>R2D2</name><disease>Flu</disease><doctor>Petrov</doctor>\
            <specialization>ENT</specialization><date>someday</date><status>Waiting</status></patient>";
        let records = deserialize(&wrap(body), LoadPolicy::Raw).unwrap();
        assert_eq!(records[0].patient_name(), "R2D2");
        assert_eq!(records[0].appointment_date().parsed(), None);

        assert!(matches!(
            deserialize(&wrap(body), LoadPolicy::Strict),
            Err(ParseError::InvalidRecord {
                record: 0,
                source: ValidationError::InvalidName { .. }
            })
        ));
    }

    #[test]
    fn test_raw_policy_still_requires_known_status() {
        let body = FULL_PATIENT.replace("Waiting", "Pending");
        assert_eq!(
            deserialize(&wrap(&body), LoadPolicy::Raw),
            Err(ParseError::InvalidStatus {
                record: 0,
                value: "Pending".to_string()
            })
        );
    }

    #[test]
    fn test_cdata_text_is_accepted() {
        let body = FULL_PATIENT.replace("<disease>Flu</disease>", "<disease><![CDATA[Flu & cold]]></disease>");
        let records = deserialize(&wrap(&body), LoadPolicy::Strict).unwrap();
        assert_eq!(records[0].disease(), "Flu & cold");
    }
}
