//! Client-side view reconciliation.
//!
//! A client shows placeholder events before the server confirms them, then
//! swaps in the confirmed records. These functions merge both kinds into one
//! ordered, de-duplicated list. They never mutate their inputs.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Event, EventId};

/// Locally minted identity of an unconfirmed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(Uuid);

impl TempId {
    pub fn generate() -> Self {
        TempId(Uuid::new_v4())
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a view: a placeholder or a server record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "camelCase")]
pub enum ViewId {
    Pending(TempId),
    Confirmed(EventId),
}

impl ViewId {
    /// Stringified identity used for de-duplication.
    pub fn key(&self) -> String {
        match self {
            ViewId::Pending(temp) => temp.to_string(),
            ViewId::Confirmed(id) => id.to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ViewId::Pending(_))
    }
}

/// An event as shown by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEventView {
    pub id: ViewId,
    pub event: Event,
}

impl ClientEventView {
    /// Placeholder for an event the server hasn't confirmed yet.
    pub fn pending(temp_id: TempId, event: Event) -> Self {
        ClientEventView {
            id: ViewId::Pending(temp_id),
            event,
        }
    }

    /// Canonical view of a server-confirmed event.
    pub fn confirmed(event: Event) -> Self {
        ClientEventView {
            id: ViewId::Confirmed(event.id.clone()),
            event,
        }
    }

    pub fn key(&self) -> String {
        self.id.key()
    }
}

/// Swap the placeholder `temp_id` for the confirmed event, keeping its position.
/// A confirmed event with no placeholder is appended rather than dropped.
pub fn replace(views: &[ClientEventView], temp_id: TempId, confirmed: &Event) -> Vec<ClientEventView> {
    let mut result = views.to_vec();
    let canonical = ClientEventView::confirmed(confirmed.clone());

    match result
        .iter()
        .position(|v| v.id == ViewId::Pending(temp_id))
    {
        Some(pos) => result[pos] = canonical,
        None => result.push(canonical),
    }

    result
}

/// Append every materialized event not already present, in its given order.
pub fn merge_materialized(existing: &[ClientEventView], materialized: &[Event]) -> Vec<ClientEventView> {
    let mut seen: HashSet<String> = existing.iter().map(ClientEventView::key).collect();
    let mut result = existing.to_vec();

    for event in materialized {
        if seen.insert(event.id.to_string()) {
            result.push(ClientEventView::confirmed(event.clone()));
        }
    }

    result
}

/// Keep the first view per identity, preserving order.
pub fn dedupe_by_id(views: &[ClientEventView]) -> Vec<ClientEventView> {
    let mut seen = HashSet::new();
    views
        .iter()
        .filter(|v| seen.insert(v.key()))
        .cloned()
        .collect()
}

/// Remove a placeholder whose request was abandoned.
pub fn discard_pending(views: &[ClientEventView], temp_id: TempId) -> Vec<ClientEventView> {
    views
        .iter()
        .filter(|v| v.id != ViewId::Pending(temp_id))
        .cloned()
        .collect()
}
