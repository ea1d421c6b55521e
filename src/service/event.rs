use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
   db,
   dto::{NewEventDto, UpdateEventDto},
   errors::ApiError,
   models::{Event, EventStatus, Role, User},
   PGPool,
};

/// Managers' events go live immediately; everyone else submits for
/// approval.
pub fn initial_status(creator: &User) -> EventStatus {
   if creator.role == Role::Manager {
      EventStatus::Approved
   } else {
      EventStatus::Pending
   }
}

fn ensure_manager(actor: &User, action: &str) -> Result<(), ApiError> {
   if actor.role == Role::Manager {
      Ok(())
   } else {
      Err(ApiError::Forbidden(format!("only managers can {action}")))
   }
}

fn can_modify(event: &Event, actor: &User) -> bool {
   event.creator == actor.id || actor.role == Role::Manager
}

/// Approval is not idempotent: a second approve reports a conflict
/// instead of silently succeeding, which also surfaces lost races
/// between two managers. A rejected event may still be approved.
fn approve_guard(status: EventStatus) -> Result<(), ApiError> {
   if status == EventStatus::Approved {
      Err(ApiError::Conflict("event is already approved".to_string()))
   } else {
      Ok(())
   }
}

fn reject_guard(status: EventStatus) -> Result<(), ApiError> {
   if status == EventStatus::Pending {
      Ok(())
   } else {
      Err(ApiError::Conflict("only pending events can be rejected".to_string()))
   }
}

/// An edit by a non-manager re-opens the event for approval; a manager's
/// edit leaves the status untouched.
fn edited_status(actor: &User) -> Option<EventStatus> {
   if actor.role == Role::Manager {
      None
   } else {
      Some(EventStatus::Pending)
   }
}

fn validate_schedule(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<(), ApiError> {
   if start_time >= end_time {
      return Err(ApiError::InvalidArgument(
         "start time must be before end time".to_string(),
      ));
   }
   Ok(())
}

fn validate_repeat_days(repeat_days: &[i16]) -> Result<(), ApiError> {
   if repeat_days.iter().any(|day| !(0..=6).contains(day)) {
      return Err(ApiError::InvalidArgument(
         "repeat days must be between 0 (Sunday) and 6 (Saturday)".to_string(),
      ));
   }
   Ok(())
}

/// A repeating template needs at least one weekday and a positive
/// same-day occurrence span, so every expanded instance keeps
/// start < end.
fn validate_repeating(
   start_time: DateTime<Utc>,
   end_time: DateTime<Utc>,
   repeat_days: Option<&[i16]>,
) -> Result<(), ApiError> {
   let days = match repeat_days {
      Some(days) if !days.is_empty() => days,
      _ => {
         return Err(ApiError::InvalidArgument(
            "repeating events must have at least one repeat day".to_string(),
         ))
      }
   };
   validate_repeat_days(days)?;
   if end_time.time() <= start_time.time() {
      return Err(ApiError::InvalidArgument(
         "a repeating event must end later in the day than it starts".to_string(),
      ));
   }
   Ok(())
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Event, ApiError> {
   let res = db::event::get_by_id(id, pool).await;
   match res {
      Ok(Some(event)) => Ok(event),
      Ok(None) => Err(ApiError::NotFound),
      Err(_) => Err(ApiError::InternalError),
   }
}

pub async fn create(actor: &User, dto: NewEventDto, pool: &PGPool) -> Result<Event, ApiError> {
   validate_schedule(dto.start_time, dto.end_time)?;
   if dto.is_repeating {
      validate_repeating(dto.start_time, dto.end_time, dto.repeat_days.as_deref())?;
   }
   let event = Event {
      id: Uuid::new_v4(),
      title: dto.title,
      descr: dto.descr,
      start_time: dto.start_time,
      end_time: dto.end_time,
      creator: actor.id,
      assigned_user: dto.assigned_user,
      status: initial_status(actor),
      is_repeating: dto.is_repeating,
      repeat_days: if dto.is_repeating { dto.repeat_days } else { None },
   };
   let res = db::event::insert(&event, pool).await;
   match res {
      Ok(_) => Ok(event),
      Err(_) => Err(ApiError::InternalError),
   }
}

pub async fn approve(id: Uuid, actor: &User, pool: &PGPool) -> Result<Event, ApiError> {
   ensure_manager(actor, "approve events")?;
   let event = get_by_id(id, pool).await?;
   approve_guard(event.status)?;
   let res = db::event::set_status(id, EventStatus::Approved, pool).await;
   match res {
      Ok(_) => Ok(Event { status: EventStatus::Approved, ..event }),
      Err(_) => Err(ApiError::InternalError),
   }
}

pub async fn reject(id: Uuid, actor: &User, pool: &PGPool) -> Result<Event, ApiError> {
   ensure_manager(actor, "reject events")?;
   let event = get_by_id(id, pool).await?;
   reject_guard(event.status)?;
   let res = db::event::set_status(id, EventStatus::Rejected, pool).await;
   match res {
      Ok(_) => Ok(Event { status: EventStatus::Rejected, ..event }),
      Err(_) => Err(ApiError::InternalError),
   }
}

pub async fn update(
   id: Uuid,
   fields: UpdateEventDto,
   actor: &User,
   pool: &PGPool,
) -> Result<Event, ApiError> {
   let event = get_by_id(id, pool).await?;
   if !can_modify(&event, actor) {
      return Err(ApiError::Forbidden(
         "you can only update events you created".to_string(),
      ));
   }
   if let (Some(start_time), Some(end_time)) = (fields.start_time, fields.end_time) {
      validate_schedule(start_time, end_time)?;
   }
   if let Some(days) = fields.repeat_days.as_deref() {
      validate_repeat_days(days)?;
   }

   let status = edited_status(actor);
   if !fields.has_changes() && status.is_none() {
      return Ok(event);
   }
   let res = db::event::set_fields(id, fields, status, pool).await;
   match res {
      Ok(_) => get_by_id(id, pool).await,
      Err(_) => Err(ApiError::InternalError),
   }
}

/// Deleting a repeating parent removes the whole series: occurrences are
/// derived at query time, so no instance rows exist to clean up.
pub async fn delete(id: Uuid, actor: &User, pool: &PGPool) -> Result<(), ApiError> {
   let event = get_by_id(id, pool).await?;
   if !can_modify(&event, actor) {
      return Err(ApiError::Forbidden(
         "you can only delete events you created".to_string(),
      ));
   }
   match db::event::delete(id, pool).await {
      Ok(_) => Ok(()),
      Err(_) => Err(ApiError::InternalError),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use chrono::TimeZone;

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

   fn event_with_status(status: EventStatus) -> Event {
      Event {
         id: Uuid::new_v4(),
         title: "review".to_string(),
         descr: String::new(),
         start_time: dt(1, 9, 0),
         end_time: dt(1, 10, 0),
         creator: Uuid::new_v4(),
         assigned_user: Uuid::new_v4(),
         status,
         is_repeating: false,
         repeat_days: None,
      }
   }

   #[test]
   fn managers_create_approved_events_others_create_pending() {
      assert_eq!(initial_status(&user(Role::Manager)), EventStatus::Approved);
      assert_eq!(initial_status(&user(Role::Default)), EventStatus::Pending);
   }

   #[test]
   fn only_managers_pass_the_approval_role_check() {
      assert!(ensure_manager(&user(Role::Manager), "approve events").is_ok());
      assert!(matches!(
         ensure_manager(&user(Role::Default), "approve events"),
         Err(ApiError::Forbidden(_))
      ));
   }

   #[test]
   fn approving_twice_is_a_conflict() {
      assert!(approve_guard(EventStatus::Pending).is_ok());
      assert!(matches!(
         approve_guard(EventStatus::Approved),
         Err(ApiError::Conflict(_))
      ));
   }

   #[test]
   fn a_rejected_event_can_still_be_approved() {
      assert!(approve_guard(EventStatus::Rejected).is_ok());
   }

   #[test]
   fn only_pending_events_can_be_rejected() {
      assert!(reject_guard(EventStatus::Pending).is_ok());
      assert!(matches!(
         reject_guard(EventStatus::Approved),
         Err(ApiError::Conflict(_))
      ));
      assert!(matches!(
         reject_guard(EventStatus::Rejected),
         Err(ApiError::Conflict(_))
      ));
   }

   #[test]
   fn edits_by_non_managers_reopen_approval() {
      assert_eq!(edited_status(&user(Role::Default)), Some(EventStatus::Pending));
      assert_eq!(edited_status(&user(Role::Manager)), None);
   }

   #[test]
   fn creator_and_managers_may_modify() {
      let event = event_with_status(EventStatus::Approved);
      let mut creator = user(Role::Default);
      creator.id = event.creator;
      assert!(can_modify(&event, &creator));
      assert!(can_modify(&event, &user(Role::Manager)));
      assert!(!can_modify(&event, &user(Role::Default)));
   }

   #[test]
   fn zero_length_schedule_is_rejected() {
      assert!(validate_schedule(dt(1, 9, 0), dt(1, 10, 0)).is_ok());
      assert!(matches!(
         validate_schedule(dt(1, 9, 0), dt(1, 9, 0)),
         Err(ApiError::InvalidArgument(_))
      ));
      assert!(matches!(
         validate_schedule(dt(1, 10, 0), dt(1, 9, 0)),
         Err(ApiError::InvalidArgument(_))
      ));
   }

   fn repeating(days: Option<Vec<i16>>) -> Result<(), ApiError> {
      validate_repeating(dt(1, 9, 0), dt(7, 10, 0), days.as_deref())
   }

   #[test]
   fn repeating_event_needs_at_least_one_day() {
      assert!(repeating(Some(vec![1, 3])).is_ok());
      assert!(matches!(
         repeating(Some(Vec::new())),
         Err(ApiError::InvalidArgument(_))
      ));
      assert!(matches!(repeating(None), Err(ApiError::InvalidArgument(_))));
   }

   #[test]
   fn repeat_days_outside_the_week_are_rejected() {
      assert!(matches!(
         repeating(Some(vec![1, 7])),
         Err(ApiError::InvalidArgument(_))
      ));
      assert!(matches!(
         repeating(Some(vec![-1])),
         Err(ApiError::InvalidArgument(_))
      ));
   }

   #[test]
   fn repeating_template_must_span_forward_within_the_day() {
      // End-of-day at or before start-of-day would give instances a
      // non-positive length.
      let days = vec![1];
      assert!(matches!(
         validate_repeating(dt(1, 9, 0), dt(7, 9, 0), Some(days.as_slice())),
         Err(ApiError::InvalidArgument(_))
      ));
      assert!(matches!(
         validate_repeating(dt(1, 22, 0), dt(7, 9, 0), Some(days.as_slice())),
         Err(ApiError::InvalidArgument(_))
      ));
   }
}
