//! Subtask checklists embedded in an event's description.
//!
//! A stored description is either plain text or a JSON object of the form
//! `{"text": "...", "subtasks": [{"id": "...", "text": "...", "done": false}]}`.
//! Readers go through [`decode`] and writers through [`encode`]; the raw
//! column is never interpreted anywhere else.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One checklist item. Owned by its description, no lifecycle of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub done: bool,
}

impl Subtask {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Subtask {
            id: id.into(),
            text: text.into(),
            done: false,
        }
    }
}

/// Logical content of a description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DescriptionPayload {
    pub text: String,
    pub subtasks: Vec<Subtask>,
}

/// Result of reading a stored description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedDescription {
    Structured(DescriptionPayload),
    Plain(String),
}

impl DecodedDescription {
    pub fn into_payload(self) -> DescriptionPayload {
        match self {
            DecodedDescription::Structured(payload) => payload,
            DecodedDescription::Plain(text) => DescriptionPayload {
                text,
                subtasks: Vec::new(),
            },
        }
    }
}

#[derive(Serialize)]
struct StoredDescription<'a> {
    text: &'a str,
    subtasks: &'a [Subtask],
}

/// Classify a stored description. Never fails: anything that isn't a
/// well-formed structured payload is plain text.
pub fn decode_raw(raw: &str) -> DecodedDescription {
    match parse_structured(raw) {
        Some(payload) => DecodedDescription::Structured(payload),
        None => DecodedDescription::Plain(raw.to_string()),
    }
}

/// Decode a stored description into text and subtasks.
pub fn decode(raw: &str) -> DescriptionPayload {
    decode_raw(raw).into_payload()
}

/// Decode an optional description column; `None` is empty text.
pub fn decode_opt(raw: Option<&str>) -> DescriptionPayload {
    raw.map(decode).unwrap_or_default()
}

/// Encode text and subtasks for storage. Returns `None` when there is nothing to persist.
pub fn encode(text: &str, subtasks: &[Subtask]) -> Option<String> {
    if !subtasks.is_empty() {
        let stored = StoredDescription { text, subtasks };
        match serde_json::to_string(&stored) {
            Ok(json) => return Some(json),
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize subtasks, storing text only");
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Plain text that reads back as a checklist must be wrapped to stay plain.
    if parse_structured(trimmed).is_some() {
        let stored = StoredDescription {
            text: trimmed,
            subtasks: &[],
        };
        match serde_json::to_string(&stored) {
            Ok(json) => return Some(json),
            Err(e) => {
                tracing::warn!(error = %e, "Could not wrap structured-looking text");
            }
        }
    }

    Some(trimmed.to_string())
}

fn parse_structured(raw: &str) -> Option<DescriptionPayload> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let entries = object.get("subtasks")?.as_array()?;

    let text = object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let explicit_ids: HashSet<&str> = entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_str))
        .collect();

    let mut subtasks = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let entry = entry.as_object()?;

        let id = match entry.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => positional_id(position, &explicit_ids),
        };
        let text = entry
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let done = entry.get("done").and_then(Value::as_bool).unwrap_or(false);

        subtasks.push(Subtask { id, text, done });
    }

    Some(DescriptionPayload { text, subtasks })
}

/// Deterministic id for a subtask stored without one.
fn positional_id(position: usize, taken: &HashSet<&str>) -> String {
    let base = format!("subtask-{}", position);
    if !taken.contains(base.as_str()) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
