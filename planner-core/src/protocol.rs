//! Request and response types for the planner's external interface.
//!
//! These are the JSON shapes exchanged with clients. Field names are camelCase
//! on the wire.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::description::{self, Subtask};
use crate::event::{Event, EventId, EventTemplate};

/// Create an event, optionally expanding it into a recurrence group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Raw repeat option. Missing is read as weekly.
    pub repeat_option: Option<String>,
    #[serde(default)]
    pub materialize: bool,
    pub materialize_count: Option<u32>,
}

impl CreateEventRequest {
    /// Fields every occurrence shares, with the description already encoded.
    pub fn template(&self) -> EventTemplate {
        let text = self.description.as_deref().unwrap_or_default();
        EventTemplate {
            title: self.title.clone(),
            kind: self.kind.clone(),
            course_id: self.course_id.clone(),
            user_id: self.user_id.clone(),
            time: self.time,
            duration_minutes: self.duration_minutes,
            description: description::encode(text, &self.subtasks),
        }
    }
}

/// Finish materializing an existing group. The start date and shared fields
/// come from the group's first occurrence, so only the rule's step and length
/// are supplied here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeMaterializationRequest {
    /// Raw repeat option. Missing is read as weekly.
    pub repeat_option: Option<String>,
    pub materialize_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub event: Event,
    /// Empty unless the request asked for materialization.
    pub occurrences: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedPatchResponse {
    pub affected: Vec<EventId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedDeleteResponse {
    pub removed: Vec<EventId>,
}
