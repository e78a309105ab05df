//! Error types for the planner engine.

use thiserror::Error;

use crate::event::{EventId, RecurrenceGroupId};

/// Errors raised by a storage collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Event not found in store: {0}")]
    NotFound(EventId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in planner operations.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Recurrence group not found: {0}")]
    GroupNotFound(RecurrenceGroupId),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(
        "Materialization of group {group_id} stopped at occurrence {failed_index} \
         after {completed} occurrences: {source}"
    )]
    PartialMaterialization {
        group_id: RecurrenceGroupId,
        completed: usize,
        failed_index: u32,
        #[source]
        source: StoreError,
    },
}

impl PlannerError {
    /// Storage failures can be retried; everything else is terminal for the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlannerError::Store(StoreError::Unavailable(_))
                | PlannerError::PartialMaterialization { .. }
        )
    }
}

/// Result type alias for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;
