//! Storage collaborator port.
//!
//! The engine only talks to storage through [`EventStore`]. Callers that run
//! several requests against the same recurrence group must serialize them
//! (a transaction or a group-level lock); the engine performs read-then-write
//! sequences and relies on that isolation.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::event::{Event, EventId, EventUpdate, NewEvent, RecurrenceGroupId};

pub type StoreResult<T> = Result<T, StoreError>;

pub trait EventStore {
    /// Persist a new event, assigning its id and timestamps.
    fn create(&mut self, event: NewEvent) -> StoreResult<Event>;

    /// Overwrite the mutable fields of an existing event.
    fn update(&mut self, id: &EventId, update: EventUpdate) -> StoreResult<Event>;

    fn delete(&mut self, id: &EventId) -> StoreResult<()>;

    /// Every event of a group, in any order.
    fn find_by_group(&self, group_id: &RecurrenceGroupId) -> StoreResult<Vec<Event>>;

    fn get(&self, id: &EventId) -> StoreResult<Option<Event>>;
}
