//! JSON Lines codec for entries.
//!
//! # Responsibility
//! - Map one `Entry` to one export line and back.
//! - Fold category-specific fields into a single `body` string.
//!
//! # Invariants
//! - Encoding is deterministic: field order `id, ts, cat, body`, UTC
//!   timestamps at second precision.
//! - Satisfaction never travels on the wire; decoded entries get
//!   `DEFAULT_SATISFACTION`.
//! - A `ResearchAndProgram` body splits into topic/title only when the
//!   separator occurs exactly once; otherwise the whole body is the topic.

use crate::model::entry::{Category, Entry, DEFAULT_SATISFACTION};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Joins research topic and program title in a combined body.
pub const BODY_SEPARATOR: &str = " - ";

/// One export line before JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireRecord {
    pub id: String,
    pub ts: String,
    pub cat: String,
    pub body: String,
}

impl WireRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            ts: entry.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            cat: entry.category.as_tag().to_string(),
            body: encode_body(entry),
        }
    }
}

/// Decode-time failures for one export line.
#[derive(Debug)]
pub enum DecodeError {
    MalformedJson(String),
    /// Field absent or not a JSON string.
    MissingField(&'static str),
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
    UnknownCategory(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson(message) => write!(f, "malformed JSON: {message}"),
            Self::MissingField(field) => {
                write!(f, "missing or non-string field `{field}`")
            }
            Self::InvalidTimestamp { value, source } => {
                write!(f, "invalid RFC3339 timestamp `{value}`: {source}")
            }
            Self::UnknownCategory(value) => write!(f, "unknown category `{value}`"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimestamp { source, .. } => Some(source),
            Self::MalformedJson(_) | Self::MissingField(_) | Self::UnknownCategory(_) => None,
        }
    }
}

/// Encodes one entry as a single JSON line without the trailing newline.
///
/// # Errors
/// Only if `serde_json` fails to serialize plain strings, which it does not
/// for well-formed entries.
pub fn encode_entry(entry: &Entry) -> serde_json::Result<String> {
    serde_json::to_string(&WireRecord::from_entry(entry))
}

/// Decodes one export line into an entry.
///
/// # Errors
/// - `MalformedJson` when the line is not a JSON object.
/// - `MissingField` when `id`, `ts`, `cat` or `body` is absent or not a string.
/// - `InvalidTimestamp` when `ts` is not RFC3339.
/// - `UnknownCategory` when `cat` matches no known spelling.
pub fn decode_entry(line: &str) -> Result<Entry, DecodeError> {
    let value: Value =
        serde_json::from_str(line).map_err(|err| DecodeError::MalformedJson(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::MalformedJson(
            "expected a JSON object".to_string(),
        ));
    };

    let id = required_str(&fields, "id")?;
    let ts = required_str(&fields, "ts")?;
    let cat = required_str(&fields, "cat")?;
    let body = required_str(&fields, "body")?;

    let created_at = DateTime::parse_from_rfc3339(ts)
        .map_err(|source| DecodeError::InvalidTimestamp {
            value: ts.to_string(),
            source,
        })?
        .with_timezone(&Utc);
    let category =
        Category::from_tag(cat).ok_or_else(|| DecodeError::UnknownCategory(cat.to_string()))?;

    let mut entry = Entry::with_id(id, category, DEFAULT_SATISFACTION, created_at);
    let (research_topic, program_title) = decode_body(category, body);
    entry.research_topic = research_topic;
    entry.program_title = program_title;
    Ok(entry)
}

fn required_str<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingField(name))
}

fn encode_body(entry: &Entry) -> String {
    match entry.category {
        Category::Research => entry.research_topic.clone(),
        Category::Programming => entry.program_title.clone(),
        Category::ResearchAndProgram => format!(
            "{}{BODY_SEPARATOR}{}",
            entry.research_topic, entry.program_title
        ),
    }
}

/// Returns `(research_topic, program_title)` for a decoded body.
fn decode_body(category: Category, body: &str) -> (String, String) {
    match category {
        Category::Research => (body.to_string(), String::new()),
        Category::Programming => (String::new(), body.to_string()),
        Category::ResearchAndProgram => match body.split_once(BODY_SEPARATOR) {
            Some((topic, title)) if !title.contains(BODY_SEPARATOR) => {
                (topic.to_string(), title.to_string())
            }
            _ => (body.to_string(), String::new()),
        },
    }
}
