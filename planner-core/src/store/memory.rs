//! In-memory event store.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use super::{EventStore, StoreResult};
use crate::error::StoreError;
use crate::event::{Event, EventId, EventUpdate, NewEvent, RecurrenceGroupId};

/// Event store backed by an ordered map. Used by the server and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    events: BTreeMap<EventId, Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }
}

impl EventStore for MemoryStore {
    fn create(&mut self, event: NewEvent) -> StoreResult<Event> {
        let now = Utc::now();
        let stored = Event {
            id: EventId::new(Uuid::new_v4().to_string()),
            title: event.title,
            kind: event.kind,
            course_id: event.course_id,
            user_id: event.user_id,
            date: event.date,
            time: event.time,
            start_instant: event.start_instant,
            end_instant: event.end_instant,
            duration_minutes: event.duration_minutes,
            description: event.description,
            recurrence_group_id: event.recurrence_group_id,
            occurrence_index: event.occurrence_index,
            archived: event.archived,
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.events.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&mut self, id: &EventId, update: EventUpdate) -> StoreResult<Event> {
        let event = self
            .events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        event.title = update.title;
        event.kind = update.kind;
        event.course_id = update.course_id;
        event.date = update.date;
        event.time = update.time;
        event.start_instant = update.start_instant;
        event.end_instant = update.end_instant;
        event.duration_minutes = update.duration_minutes;
        event.description = update.description;
        event.archived = update.archived;
        event.updated_at = Some(Utc::now());

        Ok(event.clone())
    }

    fn delete(&mut self, id: &EventId) -> StoreResult<()> {
        self.events
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn find_by_group(&self, group_id: &RecurrenceGroupId) -> StoreResult<Vec<Event>> {
        Ok(self
            .events
            .values()
            .filter(|e| e.recurrence_group_id.as_ref() == Some(group_id))
            .cloned()
            .collect())
    }

    fn get(&self, id: &EventId) -> StoreResult<Option<Event>> {
        Ok(self.events.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTemplate;
    use chrono::NaiveDate;

    fn new_event(title: &str) -> NewEvent {
        EventTemplate {
            title: title.to_string(),
            kind: "class".to_string(),
            ..Default::default()
        }
        .on_date(NaiveDate::from_ymd_opt(2025, 9, 28).unwrap())
    }

    #[test]
    fn test_create_assigns_identity_and_timestamps() {
        let mut store = MemoryStore::new();
        let a = store.create(new_event("A")).unwrap();
        let b = store.create(new_event("B")).unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.created_at.is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_keeps_recurrence_fields() {
        let mut store = MemoryStore::new();
        let group = RecurrenceGroupId::generate();
        let mut event = new_event("A");
        event.recurrence_group_id = Some(group);
        event.occurrence_index = Some(3);
        let created = store.create(event).unwrap();

        let mut update = EventUpdate::from(&created);
        update.title = "Renamed".to_string();
        let updated = store.update(&created.id, update).unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.recurrence_group_id, Some(group));
        assert_eq!(updated.occurrence_index, Some(3));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let mut store = MemoryStore::new();
        let id = EventId::new("missing");

        assert_eq!(store.delete(&id), Err(StoreError::NotFound(id.clone())));
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_find_by_group_filters() {
        let mut store = MemoryStore::new();
        let group = RecurrenceGroupId::generate();
        let mut grouped = new_event("grouped");
        grouped.recurrence_group_id = Some(group);
        grouped.occurrence_index = Some(0);
        store.create(grouped).unwrap();
        store.create(new_event("standalone")).unwrap();

        let found = store.find_by_group(&group).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "grouped");
    }
}
