//! Structured extraction records.
//!
//! An external extractor turns a legal text chunk into typed records. The
//! record set is closed: every record is one of [`ExtractionRecord`]'s
//! variants, tagged by a `"type"` field in JSON.
//!
//! Extractor output is untrusted. [`Extraction::from_json`] never fails: a
//! record that does not deserialize is skipped with a warning, and a document
//! that is not an extraction at all yields an empty extraction so that long
//! ingestion runs keep going.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A party or other entity mentioned in the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub entity_type: String,
    /// Procedural role, e.g. `plaintiff`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A role held by a named party, stated separately from the actor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub holder: String,
    pub role: String,
}

/// An attribute/value state of a subject, e.g. "the lease was terminated".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub subject: String,
    pub attribute: String,
    pub value: String,
    #[serde(default)]
    pub negated: bool,
}

/// An event: agent, verb and optional patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbPhrase {
    pub agent: String,
    pub verb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(default)]
    pub negated: bool,
}

/// Ordering between two events or states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalLink {
    pub earlier: String,
    pub later: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// One extraction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionRecord {
    #[serde(alias = "Actor")]
    Actor(Actor),
    #[serde(alias = "Role")]
    Role(RoleAssignment),
    #[serde(alias = "State")]
    State(StateRecord),
    #[serde(alias = "VerbPhrase")]
    VerbPhrase(VerbPhrase),
    #[serde(alias = "TemporalLink")]
    TemporalLink(TemporalLink),
}

/// Tag of an [`ExtractionRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTag {
    Actor,
    Role,
    State,
    VerbPhrase,
    TemporalLink,
}

impl std::fmt::Display for RecordTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordTag::Actor => "actor",
            RecordTag::Role => "role",
            RecordTag::State => "state",
            RecordTag::VerbPhrase => "verb_phrase",
            RecordTag::TemporalLink => "temporal_link",
        };
        f.write_str(s)
    }
}

impl ExtractionRecord {
    pub fn tag(&self) -> RecordTag {
        match self {
            ExtractionRecord::Actor(_) => RecordTag::Actor,
            ExtractionRecord::Role(_) => RecordTag::Role,
            ExtractionRecord::State(_) => RecordTag::State,
            ExtractionRecord::VerbPhrase(_) => RecordTag::VerbPhrase,
            ExtractionRecord::TemporalLink(_) => RecordTag::TemporalLink,
        }
    }
}

/// A skippable problem met while parsing or encoding an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingWarning {
    /// Index of the record in the extraction, if the warning concerns one.
    pub record: Option<usize>,
    pub tag: Option<RecordTag>,
    pub field: Option<String>,
    pub message: String,
}

impl EncodingWarning {
    pub fn document(message: impl Into<String>) -> Self {
        Self {
            record: None,
            tag: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn record(index: usize, tag: Option<RecordTag>, message: impl Into<String>) -> Self {
        Self {
            record: Some(index),
            tag,
            field: None,
            message: message.into(),
        }
    }

    pub fn field(index: usize, tag: RecordTag, field: &str, message: impl Into<String>) -> Self {
        Self {
            record: Some(index),
            tag: Some(tag),
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EncodingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(index) = self.record {
            write!(f, "record {index}")?;
            if let Some(tag) = self.tag {
                write!(f, " ({tag})")?;
            }
            if let Some(field) = &self.field {
                write!(f, " field `{field}`")?;
            }
            write!(f, ": ")?;
        }
        f.write_str(&self.message)
    }
}

/// The structured extraction of one text chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Source chunk, for provenance only.
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub records: Vec<ExtractionRecord>,
    /// Problems found while parsing; carried into the encoding.
    #[serde(skip)]
    pub warnings: Vec<EncodingWarning>,
}

impl Extraction {
    pub fn new(chunk_id: impl Into<String>, records: Vec<ExtractionRecord>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            records,
            warnings: Vec::new(),
        }
    }

    /// Parse extractor output.
    ///
    /// Accepts either `{"chunk_id": ..., "records": [...]}` or a bare array of
    /// records. Never fails; see the module docs.
    pub fn from_json(json: &str) -> Self {
        let value: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => return Self::parse_failure(String::new(), format!("invalid JSON: {e}")),
        };

        let (chunk_id, records) = match value {
            Value::Array(records) => (String::new(), records),
            Value::Object(mut map) => {
                let chunk_id = match map.remove("chunk_id") {
                    Some(Value::String(s)) => s,
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                match map.remove("records") {
                    Some(Value::Array(records)) => (chunk_id, records),
                    _ => {
                        return Self::parse_failure(chunk_id, "missing `records` array");
                    }
                }
            }
            other => {
                return Self::parse_failure(
                    String::new(),
                    format!("expected object or array, found {}", json_kind(&other)),
                );
            }
        };

        let mut extraction = Self::new(chunk_id, Vec::with_capacity(records.len()));
        for (index, raw) in records.into_iter().enumerate() {
            let tag = raw
                .get("type")
                .cloned()
                .and_then(|t| serde_json::from_value::<RecordTag>(t).ok());
            match serde_json::from_value::<ExtractionRecord>(raw) {
                Ok(record) => extraction.records.push(record),
                Err(e) => {
                    let warning = EncodingWarning::record(index, tag, format!("skipped: {e}"));
                    tracing::warn!(chunk = %extraction.chunk_id, %warning, "malformed extraction record");
                    extraction.warnings.push(warning);
                }
            }
        }
        extraction
    }

    fn parse_failure(chunk_id: String, message: impl Into<String>) -> Self {
        let warning = EncodingWarning::document(format!("parse failure: {}", message.into()));
        tracing::warn!(chunk = %chunk_id, %warning, "extractor output rejected, using empty extraction");
        Self {
            chunk_id,
            records: Vec::new(),
            warnings: vec![warning],
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_records() {
        let json = r#"{
            "chunk_id": "nswsc-2019-112#4",
            "records": [
                {"type": "actor", "name": "Smith", "entity_type": "person", "role": "plaintiff"},
                {"type": "verb_phrase", "agent": "Acme Pty Ltd", "verb": "breached", "patient": "contract"},
                {"type": "State", "subject": "lease", "attribute": "status", "value": "terminated", "negated": true},
                {"type": "role", "holder": "Jones", "role": "executor"},
                {"type": "temporal_link", "earlier": "notice", "later": "termination"}
            ]
        }"#;
        let extraction = Extraction::from_json(json);
        assert_eq!(extraction.chunk_id, "nswsc-2019-112#4");
        assert_eq!(extraction.records.len(), 5);
        assert!(extraction.warnings.is_empty());
        let tags: Vec<RecordTag> = extraction.records.iter().map(|r| r.tag()).collect();
        assert_eq!(
            tags,
            vec![
                RecordTag::Actor,
                RecordTag::VerbPhrase,
                RecordTag::State,
                RecordTag::Role,
                RecordTag::TemporalLink
            ]
        );
        match &extraction.records[2] {
            ExtractionRecord::State(state) => assert!(state.negated),
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn malformed_records_are_skipped_with_warning() {
        let json = r#"[
            {"type": "actor", "name": "Smith"},
            {"type": "hearing", "date": "2020-01-01"},
            {"type": "verb_phrase", "verb": "appealed"}
        ]"#;
        let extraction = Extraction::from_json(json);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.warnings.len(), 2);
        assert_eq!(extraction.warnings[0].record, Some(1));
        assert_eq!(extraction.warnings[0].tag, None);
        assert_eq!(extraction.warnings[1].tag, Some(RecordTag::VerbPhrase));
    }

    #[test]
    fn invalid_document_yields_empty_extraction() {
        let extraction = Extraction::from_json("the model said: {not json");
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].message.starts_with("parse failure"));

        let extraction = Extraction::from_json(r#"{"chunk_id": "c1", "records": "none"}"#);
        assert_eq!(extraction.chunk_id, "c1");
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.warnings.len(), 1);

        let extraction = Extraction::from_json("42");
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn warning_display_names_location() {
        let warning = EncodingWarning::field(3, RecordTag::Actor, "name", "empty value");
        assert_eq!(warning.to_string(), "record 3 (actor) field `name`: empty value");
    }
}
