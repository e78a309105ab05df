//! Occurrence materialization.
//!
//! Expands a recurrence rule and a template into persisted occurrences that
//! share one recurrence group. Occurrences are keyed by
//! `(recurrence_group_id, occurrence_index)`: re-running with the same group
//! only inserts the indices that are still missing.

use std::collections::BTreeMap;

use crate::error::{PlannerError, PlannerResult};
use crate::event::{Event, EventTemplate, RecurrenceGroupId};
use crate::recurrence::{RecurrenceRule, TermBoundary};
use crate::store::EventStore;

/// Outcome of a (possibly resumed) materialization.
#[derive(Debug, Clone)]
pub struct Materialization {
    pub group_id: RecurrenceGroupId,
    /// Every occurrence of the group, ordered by occurrence index.
    pub occurrences: Vec<Event>,
    /// How many occurrences this run inserted.
    pub created: usize,
}

/// Materialize `rule` into a fresh recurrence group.
pub fn materialize<S: EventStore>(
    store: &mut S,
    rule: &RecurrenceRule,
    template: &EventTemplate,
    boundary: TermBoundary,
) -> PlannerResult<Materialization> {
    materialize_into(store, RecurrenceGroupId::generate(), rule, template, boundary)
}

/// Materialize `rule` into `group_id`, skipping occurrences that already exist.
///
/// A storage failure stops the batch. Occurrences written before it stay in
/// place, and calling this again with the same group completes the batch.
pub fn materialize_into<S: EventStore>(
    store: &mut S,
    group_id: RecurrenceGroupId,
    rule: &RecurrenceRule,
    template: &EventTemplate,
    boundary: TermBoundary,
) -> PlannerResult<Materialization> {
    let dates = rule.occurrences(boundary)?;

    let mut by_index: BTreeMap<u32, Event> = store
        .find_by_group(&group_id)?
        .into_iter()
        .filter_map(|e| e.occurrence_index.map(|i| (i, e)))
        .collect();

    let mut created = 0;
    for (index, date) in (0u32..).zip(dates) {
        if by_index.contains_key(&index) {
            continue;
        }

        let mut occurrence = template.on_date(date);
        occurrence.recurrence_group_id = Some(group_id);
        occurrence.occurrence_index = Some(index);

        match store.create(occurrence) {
            Ok(event) => {
                by_index.insert(index, event);
                created += 1;
            }
            Err(source) => {
                tracing::warn!(
                    group = %group_id,
                    index,
                    error = %source,
                    "Materialization stopped, batch can be resumed"
                );
                return Err(PlannerError::PartialMaterialization {
                    group_id,
                    completed: by_index.len(),
                    failed_index: index,
                    source,
                });
            }
        }
    }

    tracing::info!(
        group = %group_id,
        created,
        total = by_index.len(),
        "Materialized recurrence group"
    );

    Ok(Materialization {
        group_id,
        occurrences: by_index.into_values().collect(),
        created,
    })
}
