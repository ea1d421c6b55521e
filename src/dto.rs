use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Event, EventStatus, Occurrence, Role, User};

#[derive(Debug, Deserialize, Clone)]
pub struct NewEventDto {
    pub title: String,
    pub descr: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub assigned_user: Uuid,
    #[serde(default)]
    pub is_repeating: bool,
    pub repeat_days: Option<Vec<i16>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateEventDto {
    pub title: Option<String>,
    pub descr: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    pub assigned_user: Option<Uuid>,
    pub is_repeating: Option<bool>,
    pub repeat_days: Option<Vec<i16>>,
}

impl UpdateEventDto {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.descr.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
            || self.assigned_user.is_some()
            || self.is_repeating.is_some()
            || self.repeat_days.is_some()
    }
}

/// Half-open calendar window, epoch milliseconds on the wire.
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarWindowDto {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateRoleDto {
    pub role: Role,
}

/// Bearer token claims minted by the identity provider.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    pub fn new(sub: &str, name: &str, email: &str, exp: usize) -> Self {
        Self {
            sub: sub.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            exp,
        }
    }
}

/// Display projection of a user attached to query results. Name and role
/// only; the full user record stays server-side.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserBrief {
    pub name: String,
    pub role: Role,
}

impl UserBrief {
    pub fn of(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// One calendar entry as returned by the visible-events query.
#[derive(Debug, Serialize)]
pub struct OccurrenceDto {
    pub id: String,
    pub event_id: Uuid,
    pub parent_event_id: Option<Uuid>,
    pub title: String,
    pub descr: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub creator_id: Uuid,
    pub assigned_user_id: Uuid,
    pub status: EventStatus,
    pub creator: Option<UserBrief>,
    pub assigned_user: Option<UserBrief>,
}

impl OccurrenceDto {
    pub fn new(occ: Occurrence, creator: Option<UserBrief>, assigned_user: Option<UserBrief>) -> Self {
        Self {
            id: occ.id,
            event_id: occ.event_id,
            parent_event_id: occ.parent_event_id,
            title: occ.title,
            descr: occ.descr,
            start_time: occ.start_time,
            end_time: occ.end_time,
            creator_id: occ.creator,
            assigned_user_id: occ.assigned_user,
            status: occ.status,
            creator,
            assigned_user,
        }
    }
}

/// A raw stored event awaiting decision, as surfaced by the pending
/// queries. Not expanded; managers see the parent/single record itself.
#[derive(Debug, Serialize)]
pub struct PendingEventDto {
    pub id: Uuid,
    pub title: String,
    pub descr: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub creator_id: Uuid,
    pub assigned_user_id: Uuid,
    pub status: EventStatus,
    pub is_repeating: bool,
    pub repeat_days: Option<Vec<i16>>,
    pub creator: Option<UserBrief>,
    pub assigned_user: Option<UserBrief>,
}

impl PendingEventDto {
    pub fn new(event: Event, creator: Option<UserBrief>, assigned_user: Option<UserBrief>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            descr: event.descr,
            start_time: event.start_time,
            end_time: event.end_time,
            creator_id: event.creator,
            assigned_user_id: event.assigned_user,
            status: event.status,
            is_repeating: event.is_repeating,
            repeat_days: event.repeat_days,
            creator,
            assigned_user,
        }
    }
}
