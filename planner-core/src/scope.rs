//! Scoped edits and deletes over a recurrence group.
//!
//! A request names one event and a [`Scope`]. Resolution turns that into the
//! exact set of events to touch and the writes to apply; execution performs
//! the writes. Everything that can be rejected is rejected while planning, so
//! an invalid request never reaches storage.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::description::{self, Subtask};
use crate::error::{PlannerError, PlannerResult};
use crate::event::{Event, EventId, EventUpdate, instants_for};
use crate::store::EventStore;

/// Which occurrences of a group a mutation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Only the addressed event
    #[default]
    This,
    /// The addressed occurrence and every later one in its group
    Following,
    /// Every occurrence in the group
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::This => write!(f, "this"),
            Scope::Following => write!(f, "following"),
            Scope::All => write!(f, "all"),
        }
    }
}

/// Partial field set for a scoped edit.
///
/// `title`, `kind`, `course_id`, `duration_minutes`, `description` (base text)
/// and `archived` are shared across a group. `date`, `time` and `subtasks`
/// belong to a single occurrence and are only accepted with [`Scope::This`].
///
/// `course_id`, `duration_minutes` and `time` are clearable: an absent field
/// leaves the value alone, an explicit `null` clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Option<u32>>,
    pub description: Option<String>,
    pub archived: Option<bool>,

    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub time: Option<Option<NaiveTime>>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl EventPatch {
    fn per_occurrence_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.date.is_some() {
            fields.push("date");
        }
        if self.time.is_some() {
            fields.push("time");
        }
        if self.subtasks.is_some() {
            fields.push("subtasks");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Compute the storage update for `event` with this patch applied.
    fn apply_to(&self, event: &Event) -> EventUpdate {
        let mut update = EventUpdate::from(event);

        if let Some(title) = &self.title {
            update.title = title.clone();
        }
        if let Some(kind) = &self.kind {
            update.kind = kind.clone();
        }
        if let Some(course_id) = &self.course_id {
            update.course_id = course_id.clone();
        }
        if let Some(archived) = self.archived {
            update.archived = archived;
        }

        if self.date.is_some() || self.time.is_some() || self.duration_minutes.is_some() {
            update.date = self.date.unwrap_or(event.date);
            update.time = self.time.unwrap_or(event.time);
            update.duration_minutes = self.duration_minutes.unwrap_or(event.duration_minutes);
            (update.start_instant, update.end_instant) =
                instants_for(update.date, update.time, update.duration_minutes);
        }

        if self.description.is_some() || self.subtasks.is_some() {
            let mut payload = description::decode_opt(event.description.as_deref());
            if let Some(text) = &self.description {
                payload.text = text.clone();
            }
            if let Some(subtasks) = &self.subtasks {
                payload.subtasks = subtasks.clone();
            }
            update.description = description::encode(&payload.text, &payload.subtasks);
        }

        update
    }
}

/// Present-but-null deserializes to `Some(None)` so it can be told apart from absent.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One storage write of an update plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub id: EventId,
    pub update: EventUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    /// Scope actually applied; standalone events always resolve to `This`.
    pub scope: Scope,
    pub writes: Vec<PlannedWrite>,
}

impl UpdatePlan {
    pub fn target_ids(&self) -> Vec<EventId> {
        self.writes.iter().map(|w| w.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub scope: Scope,
    pub targets: Vec<EventId>,
}

/// Resolve the events a scoped request applies to, ordered by occurrence index.
pub fn resolve_targets<S: EventStore>(
    store: &S,
    target_id: &EventId,
    scope: Scope,
) -> PlannerResult<(Scope, Vec<Event>)> {
    let target = store
        .get(target_id)?
        .ok_or_else(|| PlannerError::NotFound(target_id.clone()))?;

    let Some(group_id) = target.recurrence_group_id else {
        return Ok((Scope::This, vec![target]));
    };

    let mut targets = match scope {
        Scope::This => return Ok((Scope::This, vec![target])),
        Scope::Following => {
            let from = target.occurrence_index.unwrap_or(0);
            store
                .find_by_group(&group_id)?
                .into_iter()
                .filter(|e| e.occurrence_index.is_some_and(|i| i >= from))
                .collect::<Vec<_>>()
        }
        Scope::All => store.find_by_group(&group_id)?,
    };
    targets.sort_by_key(|e| e.occurrence_index);

    tracing::debug!(
        target = %target_id,
        group = %group_id,
        %scope,
        count = targets.len(),
        "Resolved scoped targets"
    );

    Ok((scope, targets))
}

/// Plan a scoped edit without writing anything.
pub fn plan_update<S: EventStore>(
    store: &S,
    target_id: &EventId,
    scope: Scope,
    patch: &EventPatch,
) -> PlannerResult<UpdatePlan> {
    if patch.is_empty() {
        return Err(PlannerError::Validation(format!(
            "Patch for event {} has no fields to apply",
            target_id
        )));
    }

    let (scope, targets) = resolve_targets(store, target_id, scope)?;

    let per_occurrence = patch.per_occurrence_fields();
    if scope != Scope::This && !per_occurrence.is_empty() {
        return Err(PlannerError::Validation(format!(
            "Fields [{}] can only be edited on a single occurrence, not with scope '{}' (event {})",
            per_occurrence.join(", "),
            scope,
            target_id
        )));
    }

    let writes = targets
        .iter()
        .map(|event| PlannedWrite {
            id: event.id.clone(),
            update: patch.apply_to(event),
        })
        .collect();

    Ok(UpdatePlan { scope, writes })
}

/// Plan a scoped delete without writing anything.
pub fn plan_delete<S: EventStore>(
    store: &S,
    target_id: &EventId,
    scope: Scope,
) -> PlannerResult<DeletePlan> {
    let (scope, targets) = resolve_targets(store, target_id, scope)?;
    Ok(DeletePlan {
        scope,
        targets: targets.into_iter().map(|e| e.id).collect(),
    })
}

/// Apply an update plan, returning the updated events.
pub fn execute_update<S: EventStore>(store: &mut S, plan: UpdatePlan) -> PlannerResult<Vec<Event>> {
    let mut updated = Vec::with_capacity(plan.writes.len());
    for write in plan.writes {
        updated.push(store.update(&write.id, write.update)?);
    }

    tracing::info!(scope = %plan.scope, count = updated.len(), "Applied scoped update");
    Ok(updated)
}

/// Apply a delete plan, returning the removed ids.
pub fn execute_delete<S: EventStore>(store: &mut S, plan: DeletePlan) -> PlannerResult<Vec<EventId>> {
    for id in &plan.targets {
        store.delete(id)?;
    }

    tracing::info!(scope = %plan.scope, count = plan.targets.len(), "Applied scoped delete");
    Ok(plan.targets)
}
