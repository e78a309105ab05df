//! Recurring-event engine for the academic planner.
//!
//! - `recurrence` evaluates a repeat rule into bounded occurrence dates
//! - `materialize` persists those dates as one recurrence group
//! - `scope` resolves and applies `this` / `following` / `all` edits and deletes
//! - `description` encodes the subtask checklist carried in descriptions
//! - `reconcile` merges optimistic client placeholders with confirmed events
//!
//! Storage is injected through the `store::EventStore` trait.

pub mod description;
pub mod error;
pub mod event;
pub mod materialize;
pub mod planner;
pub mod planner_config;
pub mod protocol;
pub mod recurrence;
pub mod reconcile;
pub mod scope;
pub mod store;

// Re-export the common types at crate root for convenience
pub use error::{PlannerError, PlannerResult, StoreError};
pub use event::*;
pub use planner::Planner;
pub use planner_config::PlannerConfig;
pub use scope::{EventPatch, Scope};
