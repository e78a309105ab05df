//! The planner engine: create-with-recurrence, scoped patch and scoped delete
//! over an injected event store.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::description;
use crate::error::{PlannerError, PlannerResult};
use crate::event::{Event, EventId, EventTemplate, RecurrenceGroupId};
use crate::materialize::{self, Materialization};
use crate::planner_config::PlannerConfig;
use crate::protocol::{
    CreateEventRequest, CreateEventResponse, ResumeMaterializationRequest, ScopedDeleteResponse,
    ScopedPatchResponse,
};
use crate::recurrence::{RecurrenceRule, RepeatOption, TermBoundary};
use crate::scope::{self, EventPatch, Scope};
use crate::store::EventStore;

pub struct Planner<S> {
    store: S,
    boundary: TermBoundary,
    default_max_count: u32,
}

impl<S: EventStore> Planner<S> {
    pub fn new(store: S, config: &PlannerConfig) -> PlannerResult<Self> {
        Ok(Planner {
            store,
            boundary: config.term_boundary()?,
            default_max_count: config.default_max_count,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_event(&self, id: &EventId) -> PlannerResult<Event> {
        self.store
            .get(id)?
            .ok_or_else(|| PlannerError::NotFound(id.clone()))
    }

    /// Every occurrence of a group, ordered by occurrence index.
    pub fn group_events(&self, group_id: &RecurrenceGroupId) -> PlannerResult<Vec<Event>> {
        let mut events = self.store.find_by_group(group_id)?;
        events.sort_by_key(|e| e.occurrence_index);
        Ok(events)
    }

    /// Create a standalone event, or a whole recurrence group when the request
    /// asks for materialization of a repeating option.
    pub fn create_event(&mut self, req: &CreateEventRequest) -> PlannerResult<CreateEventResponse> {
        let rule = self.rule_for(req)?;

        if req.materialize && rule.repeat_option.repeats() {
            let materialization = materialize::materialize(
                &mut self.store,
                &rule,
                &req.template(),
                self.boundary,
            )?;
            return into_response(materialization);
        }

        let event = self.store.create(req.template().on_date(req.date))?;
        tracing::info!(id = %event.id, "Created standalone event");

        Ok(CreateEventResponse {
            event,
            occurrences: Vec::new(),
        })
    }

    /// Finish a materialization that stopped part way, reusing its group id.
    ///
    /// The rule starts at occurrence 0's date and new occurrences copy its
    /// shared fields, so the request only picks the step and the length.
    pub fn resume_materialization(
        &mut self,
        group_id: RecurrenceGroupId,
        req: &ResumeMaterializationRequest,
    ) -> PlannerResult<CreateEventResponse> {
        let stored = self.group_events(&group_id)?;
        let Some(first) = stored.first() else {
            return Err(PlannerError::GroupNotFound(group_id));
        };
        if first.occurrence_index != Some(0) {
            return Err(PlannerError::Validation(format!(
                "Group {} no longer has occurrence 0 and cannot be resumed",
                group_id
            )));
        }

        let repeat_option = RepeatOption::parse_optional(req.repeat_option.as_deref())?;
        if !repeat_option.repeats() {
            return Err(PlannerError::Validation(format!(
                "Cannot materialize group {} with repeat option '{}'",
                group_id, repeat_option
            )));
        }
        let rule = RecurrenceRule::new(first.date, repeat_option)
            .with_max_count(self.max_count(req.materialize_count)?);
        check_resume_order(group_id, &stored, &rule.occurrences(self.boundary)?)?;

        let materialization = materialize::materialize_into(
            &mut self.store,
            group_id,
            &rule,
            &template_from(first),
            self.boundary,
        )?;
        into_response(materialization)
    }

    pub fn patch_event(
        &mut self,
        id: &EventId,
        scope: Scope,
        patch: &EventPatch,
    ) -> PlannerResult<ScopedPatchResponse> {
        let plan = scope::plan_update(&self.store, id, scope, patch)?;
        let affected = plan.target_ids();
        scope::execute_update(&mut self.store, plan)?;

        Ok(ScopedPatchResponse { affected })
    }

    pub fn delete_event(&mut self, id: &EventId, scope: Scope) -> PlannerResult<ScopedDeleteResponse> {
        let plan = scope::plan_delete(&self.store, id, scope)?;
        let removed = scope::execute_delete(&mut self.store, plan)?;

        Ok(ScopedDeleteResponse { removed })
    }

    fn rule_for(&self, req: &CreateEventRequest) -> PlannerResult<RecurrenceRule> {
        if req.title.trim().is_empty() {
            return Err(PlannerError::Validation("Event title must not be empty".into()));
        }

        let repeat_option = RepeatOption::parse_optional(req.repeat_option.as_deref())?;
        let max_count = self.max_count(req.materialize_count)?;

        Ok(RecurrenceRule::new(req.date, repeat_option).with_max_count(max_count))
    }

    fn max_count(&self, requested: Option<u32>) -> PlannerResult<u32> {
        match requested.unwrap_or(self.default_max_count) {
            0 => Err(PlannerError::Validation(
                "materializeCount must be at least 1".into(),
            )),
            count => Ok(count),
        }
    }
}

/// Shared fields of a group, read back from one of its occurrences.
/// The checklist is carried over unticked.
fn template_from(occurrence: &Event) -> EventTemplate {
    let mut payload = description::decode_opt(occurrence.description.as_deref());
    for subtask in &mut payload.subtasks {
        subtask.done = false;
    }

    EventTemplate {
        title: occurrence.title.clone(),
        kind: occurrence.kind.clone(),
        course_id: occurrence.course_id.clone(),
        user_id: occurrence.user_id.clone(),
        time: occurrence.time,
        duration_minutes: occurrence.duration_minutes,
        description: description::encode(&payload.text, &payload.subtasks),
    }
}

/// Every date the resume would insert must sit strictly between the dates
/// of its stored neighbours.
fn check_resume_order(
    group_id: RecurrenceGroupId,
    stored: &[Event],
    dates: &[NaiveDate],
) -> PlannerResult<()> {
    let mut timeline: BTreeMap<u32, (NaiveDate, bool)> = stored
        .iter()
        .filter_map(|e| e.occurrence_index.map(|i| (i, (e.date, false))))
        .collect();
    for (index, date) in (0u32..).zip(dates) {
        timeline.entry(index).or_insert((*date, true));
    }

    let entries: Vec<(u32, (NaiveDate, bool))> = timeline.into_iter().collect();
    for pair in entries.windows(2) {
        let (_, (before, before_new)) = pair[0];
        let (index, (after, after_new)) = pair[1];
        if (before_new || after_new) && before >= after {
            return Err(PlannerError::Validation(format!(
                "Resuming group {} would place occurrence {} on {}, not after {}",
                group_id, index, after, before
            )));
        }
    }

    Ok(())
}

fn into_response(materialization: Materialization) -> PlannerResult<CreateEventResponse> {
    let Some(first) = materialization.occurrences.first().cloned() else {
        return Err(PlannerError::Recurrence(format!(
            "Recurrence group {} has no occurrences",
            materialization.group_id
        )));
    };

    Ok(CreateEventResponse {
        event: first,
        occurrences: materialization.occurrences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{self, Subtask};
    use crate::reconcile::{self, ClientEventView, TempId};
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn planner() -> Planner<MemoryStore> {
        Planner::new(MemoryStore::new(), &PlannerConfig::default()).unwrap()
    }

    fn request(repeat: Option<&str>, materialize: bool, count: Option<u32>) -> CreateEventRequest {
        CreateEventRequest {
            title: "Calculus".to_string(),
            kind: "class".to_string(),
            course_id: Some("math110".to_string()),
            user_id: Some("u1".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 9, 28).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0),
            duration_minutes: Some(75),
            description: Some("Bring calculator".to_string()),
            subtasks: vec![],
            repeat_option: repeat.map(str::to_string),
            materialize,
            materialize_count: count,
        }
    }

    #[test]
    fn test_create_materialized_group() {
        let mut planner = planner();

        let response = planner
            .create_event(&request(Some("weekly"), true, Some(6)))
            .unwrap();

        assert_eq!(response.occurrences.len(), 6);
        assert_eq!(response.event, response.occurrences[0]);
        assert_eq!(planner.store().len(), 6);
    }

    #[test]
    fn test_create_without_materialize_is_standalone() {
        let mut planner = planner();

        let response = planner
            .create_event(&request(Some("weekly"), false, None))
            .unwrap();

        assert!(response.occurrences.is_empty());
        assert!(response.event.recurrence_group_id.is_none());
        assert!(response.event.occurrence_index.is_none());
    }

    #[test]
    fn test_create_none_option_is_standalone_even_when_materializing() {
        let mut planner = planner();

        let response = planner.create_event(&request(Some("none"), true, None)).unwrap();

        assert!(response.occurrences.is_empty());
        assert_eq!(planner.store().len(), 1);
    }

    #[test]
    fn test_missing_option_defaults_to_weekly() {
        let mut planner = planner();

        let response = planner.create_event(&request(None, true, Some(3))).unwrap();

        let dates: Vec<NaiveDate> = response.occurrences.iter().map(|e| e.date).collect();
        assert_eq!(dates[1] - dates[0], chrono::Duration::days(7));
    }

    #[test]
    fn test_unknown_option_rejected_without_writes() {
        let mut planner = planner();

        let err = planner
            .create_event(&request(Some("fortnightly-ish"), true, None))
            .unwrap_err();

        assert!(matches!(err, PlannerError::Validation(msg) if msg.contains("fortnightly-ish")));
        assert!(planner.store().is_empty());
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut planner = planner();
        let err = planner
            .create_event(&request(Some("weekly"), true, Some(0)))
            .unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
    }

    #[test]
    fn test_default_count_bounds_group() {
        let mut planner = planner();
        let mut req = request(Some("weekly"), true, None);
        req.date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

        let response = planner.create_event(&req).unwrap();

        assert_eq!(response.occurrences.len(), 40);
    }

    #[test]
    fn test_subtasks_embedded_in_description() {
        let mut planner = planner();
        let mut req = request(Some("weekly"), true, Some(2));
        req.subtasks = vec![Subtask::new("s1", "Problem set")];

        let response = planner.create_event(&req).unwrap();

        let payload = description::decode_opt(response.occurrences[1].description.as_deref());
        assert_eq!(payload.text, "Bring calculator");
        assert_eq!(payload.subtasks, req.subtasks);
    }

    fn resume(count: u32) -> ResumeMaterializationRequest {
        ResumeMaterializationRequest {
            repeat_option: Some("weekly".to_string()),
            materialize_count: Some(count),
        }
    }

    fn weekly_group(planner: &mut Planner<MemoryStore>, count: u32) -> CreateEventResponse {
        planner
            .create_event(&request(Some("weekly"), true, Some(count)))
            .unwrap()
    }

    #[test]
    fn test_resume_materialization_completes_group() {
        let mut planner = planner();
        let created = weekly_group(&mut planner, 3);
        let group_id = created.event.recurrence_group_id.unwrap();

        let resumed = planner.resume_materialization(group_id, &resume(5)).unwrap();

        assert_eq!(resumed.occurrences.len(), 5);
        assert_eq!(resumed.occurrences[..3], created.occurrences[..]);
        assert_eq!(planner.group_events(&group_id).unwrap().len(), 5);
    }

    #[test]
    fn test_resume_continues_from_group_start() {
        let mut planner = planner();
        let created = weekly_group(&mut planner, 3);
        let group_id = created.event.recurrence_group_id.unwrap();
        planner
            .patch_event(
                &created.occurrences[1].id,
                Scope::All,
                &EventPatch {
                    title: Some("Calculus II".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let resumed = planner.resume_materialization(group_id, &resume(5)).unwrap();

        let dates: Vec<NaiveDate> = resumed.occurrences.iter().map(|e| e.date).collect();
        assert!(dates.windows(2).all(|p| p[0] < p[1]));
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 9, 28).unwrap());
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2025, 10, 19).unwrap());
        assert!(resumed.occurrences.iter().all(|e| e.title == "Calculus II"));
        assert_eq!(resumed.occurrences[4].time, created.event.time);
    }

    #[test]
    fn test_resume_rejects_out_of_order_dates_without_writes() {
        let mut planner = planner();
        let created = weekly_group(&mut planner, 3);
        let group_id = created.event.recurrence_group_id.unwrap();
        planner
            .patch_event(
                &created.occurrences[2].id,
                Scope::This,
                &EventPatch {
                    date: NaiveDate::from_ymd_opt(2025, 11, 30),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = planner
            .resume_materialization(group_id, &resume(5))
            .unwrap_err();

        assert!(matches!(err, PlannerError::Validation(msg) if msg.contains("occurrence 3")));
        assert_eq!(planner.group_events(&group_id).unwrap().len(), 3);
    }

    #[test]
    fn test_resume_requires_first_occurrence() {
        let mut planner = planner();
        let created = weekly_group(&mut planner, 3);
        let group_id = created.event.recurrence_group_id.unwrap();
        planner
            .delete_event(&created.occurrences[0].id, Scope::This)
            .unwrap();

        let err = planner
            .resume_materialization(group_id, &resume(5))
            .unwrap_err();

        assert!(matches!(err, PlannerError::Validation(_)));
        assert_eq!(planner.group_events(&group_id).unwrap().len(), 2);
    }

    #[test]
    fn test_resume_deleted_group_is_not_found() {
        let mut planner = planner();
        let created = weekly_group(&mut planner, 4);
        let group_id = created.event.recurrence_group_id.unwrap();
        planner.delete_event(&created.event.id, Scope::All).unwrap();

        let err = planner
            .resume_materialization(group_id, &resume(4))
            .unwrap_err();

        assert!(matches!(err, PlannerError::GroupNotFound(id) if id == group_id));
        assert!(planner.store().is_empty());
    }

    #[test]
    fn test_resume_unknown_group_is_not_found() {
        let mut planner = planner();

        let err = planner
            .resume_materialization(RecurrenceGroupId::generate(), &resume(4))
            .unwrap_err();

        assert!(matches!(err, PlannerError::GroupNotFound(_)));
        assert!(planner.store().is_empty());
    }

    #[test]
    fn test_patch_and_delete_report_ids() {
        let mut planner = planner();
        let created = planner
            .create_event(&request(Some("everyTwoWeeks"), true, Some(4)))
            .unwrap();
        let third = created.occurrences[2].id.clone();

        let patched = planner
            .patch_event(
                &third,
                Scope::Following,
                &EventPatch {
                    title: Some("Calculus II".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(patched.affected.len(), 2);

        let deleted = planner.delete_event(&third, Scope::All).unwrap();
        assert_eq!(deleted.removed.len(), 4);
        assert!(planner.store().is_empty());
    }

    #[test]
    fn test_client_view_converges_after_create() {
        let mut planner = planner();
        let temp = TempId::generate();
        let req = request(Some("weekly"), true, Some(3));

        let response = planner.create_event(&req).unwrap();
        let mut draft = response.event.clone();
        draft.title = "Calculus (saving)".to_string();
        let views = vec![ClientEventView::pending(temp, draft)];

        let views = reconcile::replace(&views, temp, &response.event);
        let views = reconcile::merge_materialized(&views, &response.occurrences);

        assert_eq!(views.len(), 3);
        assert!(views.iter().all(|v| !v.id.is_pending()));
        assert_eq!(reconcile::dedupe_by_id(&views), views);
    }
}
