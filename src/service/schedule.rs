//! Calendar queries: visibility filtering and recurrence expansion.
//!
//! All calendar arithmetic here is UTC: weekday derivation, midnight
//! day-splitting and time-of-day projection. Callers submitting epoch
//! timestamps get UTC calendar semantics regardless of deployment locale.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    db::{self, event::EventFilter},
    dto::{CalendarWindowDto, OccurrenceDto, PendingEventDto, UserBrief},
    errors::ApiError,
    models::{Event, EventStatus, Occurrence, Role, User},
    PGPool,
};

/// Whether `user` may see `event` in query results. Pure predicate,
/// applied to raw stored rows before any expansion so an invisible
/// repeating series never contributes instances.
pub fn is_visible(event: &Event, user: &User) -> bool {
    match event.status {
        EventStatus::Approved => true,
        EventStatus::Pending => event.creator == user.id || user.role == Role::Manager,
        EventStatus::Rejected => false,
    }
}

/// Length of one occurrence of a repeating template: the span between the
/// template's start and its end time-of-day projected onto the start's
/// calendar day. The raw start..end span is the recurrence window, not an
/// occurrence's length.
pub fn occurrence_duration(event: &Event) -> Duration {
    let projected_end = event
        .start_time
        .date_naive()
        .and_time(event.end_time.time())
        .and_utc();
    projected_end - event.start_time
}

fn matches_repeat_day(repeat_days: &[i16], day: NaiveDate) -> bool {
    // Values outside 0..=6 never match; creation rejects them, but rows
    // predating that check must still expand without error.
    repeat_days.contains(&(day.weekday().num_days_from_sunday() as i16))
}

/// Expand one stored event against the half-open window
/// [window_start, window_end).
///
/// Non-repeating events yield themselves iff their start lies in the
/// window. Repeating parents are walked one calendar day at a time across
/// the overlap of their recurrence window with the query window; each day
/// whose weekday is in repeat_days yields an occurrence at the template's
/// start time-of-day. Deterministic and side-effect-free; no ordering
/// guarantee.
pub fn expand_event(
    event: &Event,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<Occurrence> {
    if !event.is_repeating {
        if event.start_time >= window_start && event.start_time < window_end {
            return vec![Occurrence::single(event)];
        }
        return Vec::new();
    }

    let repeat_days = match &event.repeat_days {
        Some(days) => days,
        None => return Vec::new(),
    };

    let duration = occurrence_duration(event);
    let overlap_end = event.end_time.min(window_end);

    let mut occurrences = Vec::new();
    // The cursor steps by incrementing the calendar day, not by a fixed
    // millisecond stride.
    let mut cursor = event.start_time.max(window_start);
    while cursor < overlap_end {
        let day = cursor.date_naive();
        if matches_repeat_day(repeat_days, day) {
            let start = day.and_time(event.start_time.time()).and_utc();
            // A day inside the overlap can still put the occurrence's
            // actual start outside the requested window.
            if start >= window_start && start < window_end {
                occurrences.push(Occurrence::instance(event, start, start + duration));
            }
        }
        cursor = match cursor.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    occurrences
}

/// Per-request cache of user display projections; lookups hit the store
/// once per distinct user id.
#[derive(Default)]
struct BriefCache {
    briefs: HashMap<Uuid, Option<UserBrief>>,
}

impl BriefCache {
    async fn get(&mut self, id: Uuid, pool: &PGPool) -> Result<Option<UserBrief>, ApiError> {
        if let Some(hit) = self.briefs.get(&id) {
            return Ok(hit.clone());
        }
        let brief = db::user::get_by_id(id, pool)
            .await
            .map_err(|_| ApiError::InternalError)?
            .map(|user| UserBrief::of(&user));
        self.briefs.insert(id, brief.clone());
        Ok(brief)
    }
}

/// Everything `actor` may see in [window.start, window.end): stored rows
/// are visibility-filtered, survivors expanded, and each occurrence
/// annotated with creator/assignee projections.
pub async fn visible_events(
    actor: &User,
    window: &CalendarWindowDto,
    pool: &PGPool,
) -> Result<Vec<OccurrenceDto>, ApiError> {
    let candidates = db::event::list(EventFilter::TimeRange(window.start, window.end), pool)
        .await
        .map_err(|_| ApiError::InternalError)?;

    let mut briefs = BriefCache::default();
    let mut out = Vec::new();
    for event in candidates.into_iter().filter(|e| is_visible(e, actor)) {
        for occ in expand_event(&event, window.start, window.end) {
            let creator = briefs.get(occ.creator, pool).await?;
            let assigned_user = briefs.get(occ.assigned_user, pool).await?;
            out.push(OccurrenceDto::new(occ, creator, assigned_user));
        }
    }
    Ok(out)
}

/// All pending events, for the approvals view. Raw stored records, no
/// expansion: managers decide on the parent/single row itself.
pub async fn pending_events(actor: &User, pool: &PGPool) -> Result<Vec<PendingEventDto>, ApiError> {
    if actor.role != Role::Manager {
        return Err(ApiError::Forbidden(
            "only managers can view pending events".to_string(),
        ));
    }
    let events = db::event::list(EventFilter::Status(EventStatus::Pending), pool)
        .await
        .map_err(|_| ApiError::InternalError)?;
    annotate_pending(events, pool).await
}

/// The actor's own submissions still awaiting a decision.
pub async fn user_pending_events(
    actor: &User,
    pool: &PGPool,
) -> Result<Vec<PendingEventDto>, ApiError> {
    let events = db::event::list(
        EventFilter::CreatorStatus(actor.id, EventStatus::Pending),
        pool,
    )
    .await
    .map_err(|_| ApiError::InternalError)?;
    annotate_pending(events, pool).await
}

async fn annotate_pending(
    events: Vec<Event>,
    pool: &PGPool,
) -> Result<Vec<PendingEventDto>, ApiError> {
    let mut briefs = BriefCache::default();
    let mut out = Vec::new();
    for event in events {
        let creator = briefs.get(event.creator, pool).await?;
        let assigned_user = briefs.get(event.assigned_user, pool).await?;
        out.push(PendingEventDto::new(event, creator, assigned_user));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // January 2024: Mon the 1st through Sun the 7th.
    fn dt(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, min, 0).unwrap()
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            subject: "subj".to_string(),
            name: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    fn single(start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "one-off".to_string(),
            descr: String::new(),
            start_time: start,
            end_time: end,
            creator: Uuid::new_v4(),
            assigned_user: Uuid::new_v4(),
            status: EventStatus::Approved,
            is_repeating: false,
            repeat_days: None,
        }
    }

    fn weekly(start: DateTime<Utc>, end: DateTime<Utc>, days: Vec<i16>) -> Event {
        Event {
            repeat_days: Some(days),
            is_repeating: true,
            ..single(start, end)
        }
    }

    #[test]
    fn approved_events_are_visible_to_everyone() {
        let event = single(dt(1, 9, 0), dt(1, 10, 0));
        assert!(is_visible(&event, &user(Role::Default)));
        assert!(is_visible(&event, &user(Role::Manager)));
    }

    #[test]
    fn pending_events_are_visible_to_creator_and_managers_only() {
        let mut event = single(dt(1, 9, 0), dt(1, 10, 0));
        event.status = EventStatus::Pending;

        let mut creator = user(Role::Default);
        creator.id = event.creator;
        assert!(is_visible(&event, &creator));
        assert!(is_visible(&event, &user(Role::Manager)));
        assert!(!is_visible(&event, &user(Role::Default)));
    }

    #[test]
    fn rejected_events_are_visible_to_no_one() {
        let mut event = single(dt(1, 9, 0), dt(1, 10, 0));
        event.status = EventStatus::Rejected;

        let mut creator = user(Role::Default);
        creator.id = event.creator;
        assert!(!is_visible(&event, &creator));
        assert!(!is_visible(&event, &user(Role::Manager)));
    }

    #[test]
    fn single_event_round_trips_through_expansion() {
        let event = single(dt(2, 14, 0), dt(2, 15, 30));

        let hits = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], Occurrence::single(&event));
        assert_eq!(hits[0].id, event.id.to_string());
        assert_eq!(hits[0].parent_event_id, None);

        let misses = expand_event(&event, dt(8, 0, 0), dt(15, 0, 0));
        assert!(misses.is_empty());
    }

    #[test]
    fn window_is_half_open() {
        let at_start = single(dt(1, 0, 0), dt(1, 1, 0));
        assert_eq!(expand_event(&at_start, dt(1, 0, 0), dt(8, 0, 0)).len(), 1);

        let at_end = single(dt(8, 0, 0), dt(8, 1, 0));
        assert!(expand_event(&at_end, dt(1, 0, 0), dt(8, 0, 0)).is_empty());
    }

    #[test]
    fn weekly_template_expands_on_selected_days() {
        // Monday 09:00 through Sunday 10:00, repeating Mon and Wed.
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![1, 3]);

        let mut hits = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));
        hits.sort_by_key(|occ| occ.start_time);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start_time, dt(1, 9, 0));
        assert_eq!(hits[0].end_time, dt(1, 10, 0));
        assert_eq!(hits[1].start_time, dt(3, 9, 0));
        assert_eq!(hits[1].end_time, dt(3, 10, 0));
    }

    #[test]
    fn occurrence_duration_is_taken_from_the_time_of_day_span() {
        // The stored span is six days, one occurrence is 90 minutes.
        let event = weekly(dt(1, 9, 0), dt(7, 10, 30), vec![1]);
        assert_eq!(occurrence_duration(&event), Duration::minutes(90));

        let hits = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].end_time - hits[0].start_time, Duration::minutes(90));
    }

    #[test]
    fn instances_carry_synthetic_identity_and_provenance() {
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![1, 3]);
        let hits = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));

        for occ in &hits {
            assert_eq!(occ.parent_event_id, Some(event.id));
            assert_eq!(occ.event_id, event.id);
            assert_eq!(
                occ.id,
                format!("{}_{}", event.id, occ.start_time.timestamp_millis())
            );
        }
        assert_ne!(hits[0].id, hits[1].id);
    }

    #[test]
    fn expansion_is_deterministic() {
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![1, 3, 5]);
        let first = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));
        let second = expand_event(&event, dt(1, 0, 0), dt(8, 0, 0));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_overlap_produces_no_instances() {
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![1, 3]);
        // Window entirely after the recurrence window.
        assert!(expand_event(&event, dt(8, 0, 0), dt(15, 0, 0)).is_empty());
        // Zero-length window.
        assert!(expand_event(&event, dt(3, 0, 0), dt(3, 0, 0)).is_empty());
    }

    #[test]
    fn occurrence_before_window_start_is_clipped() {
        // Repeats Wed and Fri at 09:00; the query starts Wednesday noon,
        // so Wednesday's occurrence has already begun and is excluded.
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![3, 5]);
        let hits = expand_event(&event, dt(3, 12, 0), dt(8, 0, 0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start_time, dt(5, 9, 0));
    }

    #[test]
    fn out_of_range_repeat_days_never_match() {
        let event = weekly(dt(1, 9, 0), dt(7, 10, 0), vec![7, 9, -1]);
        assert!(expand_event(&event, dt(1, 0, 0), dt(8, 0, 0)).is_empty());
    }
}
