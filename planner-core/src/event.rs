//! Calendar event types.
//!
//! An `Event` is either standalone or one occurrence of a recurrence group.
//! Storage assigns `id`, `created_at` and `updated_at`; everything else is
//! written by the engine.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a stored event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

/// Identity shared by every occurrence produced by one materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurrenceGroupId(Uuid);

impl RecurrenceGroupId {
    /// Mint a fresh group id for a new materialization batch.
    pub fn generate() -> Self {
        RecurrenceGroupId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        RecurrenceGroupId(uuid)
    }
}

impl fmt::Display for RecurrenceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: Option<String>,
    pub user_id: Option<String>,

    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub start_instant: Option<DateTime<Utc>>,
    pub end_instant: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,

    /// Plain text or an encoded subtask payload, see `description`.
    pub description: Option<String>,

    // Recurrence fields, both set or both unset
    pub recurrence_group_id: Option<RecurrenceGroupId>,
    pub occurrence_index: Option<u32>,

    #[serde(default)]
    pub archived: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_group_id.is_some()
    }
}

/// An event as handed to storage for creation (no identity yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub start_instant: Option<DateTime<Utc>>,
    pub end_instant: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub description: Option<String>,
    pub recurrence_group_id: Option<RecurrenceGroupId>,
    pub occurrence_index: Option<u32>,
    pub archived: bool,
}

/// Full set of mutable fields written by a storage update.
///
/// Storage keeps `id`, the recurrence fields and `created_at` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub start_instant: Option<DateTime<Utc>>,
    pub end_instant: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub description: Option<String>,
    pub archived: bool,
}

impl From<&Event> for EventUpdate {
    fn from(event: &Event) -> Self {
        EventUpdate {
            title: event.title.clone(),
            kind: event.kind.clone(),
            course_id: event.course_id.clone(),
            date: event.date,
            time: event.time,
            start_instant: event.start_instant,
            end_instant: event.end_instant,
            duration_minutes: event.duration_minutes,
            description: event.description.clone(),
            archived: event.archived,
        }
    }
}

/// Fields shared by every occurrence of a recurrence group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub description: Option<String>,
}

impl EventTemplate {
    /// Build the storage record for this template placed on `date`.
    pub fn on_date(&self, date: NaiveDate) -> NewEvent {
        let (start_instant, end_instant) = instants_for(date, self.time, self.duration_minutes);
        NewEvent {
            title: self.title.clone(),
            kind: self.kind.clone(),
            course_id: self.course_id.clone(),
            user_id: self.user_id.clone(),
            date,
            time: self.time,
            start_instant,
            end_instant,
            duration_minutes: self.duration_minutes,
            description: self.description.clone(),
            recurrence_group_id: None,
            occurrence_index: None,
            archived: false,
        }
    }
}

/// Derive start/end instants from a calendar date, wall-clock time and duration.
///
/// The wall-clock time is read as UTC. All-day events (no time) have no instants,
/// and a timed event without a duration has no end.
pub fn instants_for(
    date: NaiveDate,
    time: Option<NaiveTime>,
    duration_minutes: Option<u32>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let Some(time) = time else {
        return (None, None);
    };

    let start = date.and_time(time).and_utc();
    let end = duration_minutes.map(|minutes| start + Duration::minutes(i64::from(minutes)));
    (Some(start), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instants_for_timed_event() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 28).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

        let (start, end) = instants_for(date, Some(time), Some(90));

        assert_eq!(start.unwrap().to_rfc3339(), "2025-09-28T09:30:00+00:00");
        assert_eq!(end.unwrap().to_rfc3339(), "2025-09-28T11:00:00+00:00");
    }

    #[test]
    fn test_instants_for_all_day_event() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 28).unwrap();
        assert_eq!(instants_for(date, None, Some(60)), (None, None));
    }

    #[test]
    fn test_instants_for_timed_event_without_duration() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 28).unwrap();
        let time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();

        let (start, end) = instants_for(date, Some(time), None);

        assert!(start.is_some());
        assert!(end.is_none());
    }

    #[test]
    fn test_event_serializes_type_and_camel_case() {
        let event = Event {
            id: EventId::new("evt-1"),
            title: "Lecture".to_string(),
            kind: "class".to_string(),
            course_id: Some("cs101".to_string()),
            user_id: None,
            date: NaiveDate::from_ymd_opt(2025, 9, 28).unwrap(),
            time: None,
            start_instant: None,
            end_instant: None,
            duration_minutes: None,
            description: None,
            recurrence_group_id: None,
            occurrence_index: None,
            archived: false,
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "class");
        assert_eq!(json["courseId"], "cs101");
        assert_eq!(json["date"], "2025-09-28");
        assert!(json["recurrenceGroupId"].is_null());
    }
}
