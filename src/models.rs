use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Default,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    /// External identity key (the `sub` claim of the bearer token).
    pub subject: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// A stored event row: either a single event or the parent template of a
/// repeating series. For a repeating parent, start_time..end_time is the
/// recurrence window and repeat_days the weekday pattern; the concrete
/// occurrences are never stored, only computed per query.
#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub descr: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub creator: Uuid,
    pub assigned_user: Uuid,
    pub status: EventStatus,
    pub is_repeating: bool,
    /// Weekdays the series repeats on, 0=Sunday .. 6=Saturday.
    pub repeat_days: Option<Vec<i16>>,
}

/// One computed calendar entry. Occurrences only exist inside query
/// results, never in the store, and the type carries no recurrence fields
/// so an occurrence cannot itself recurse.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Synthetic identity: the source uuid for single events, or
    /// `{parent_uuid}_{start_millis}` for expanded instances, unique per
    /// occurrence of a series.
    pub id: String,
    pub event_id: Uuid,
    /// Provenance tag, present only on instances expanded from a
    /// repeating parent.
    pub parent_event_id: Option<Uuid>,
    pub title: String,
    pub descr: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub creator: Uuid,
    pub assigned_user: Uuid,
    pub status: EventStatus,
}

impl Occurrence {
    /// A non-repeating event shown as-is.
    pub fn single(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            event_id: event.id,
            parent_event_id: None,
            title: event.title.clone(),
            descr: event.descr.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            creator: event.creator,
            assigned_user: event.assigned_user,
            status: event.status,
        }
    }

    /// One expanded instance of a repeating parent.
    pub fn instance(parent: &Event, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}_{}", parent.id, start_time.timestamp_millis()),
            event_id: parent.id,
            parent_event_id: Some(parent.id),
            title: parent.title.clone(),
            descr: parent.descr.clone(),
            start_time,
            end_time,
            creator: parent.creator,
            assigned_user: parent.assigned_user,
            status: parent.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_serialize_with_epoch_millisecond_times() {
        let event = Event {
            id: Uuid::new_v4(),
            title: "standup".to_string(),
            descr: String::new(),
            start_time: Utc.timestamp_millis_opt(1704099600000).unwrap(),
            end_time: Utc.timestamp_millis_opt(1704103200000).unwrap(),
            creator: Uuid::new_v4(),
            assigned_user: Uuid::new_v4(),
            status: EventStatus::Approved,
            is_repeating: true,
            repeat_days: Some(vec![1, 3]),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["start_time"], serde_json::json!(1704099600000i64));
        assert_eq!(value["end_time"], serde_json::json!(1704103200000i64));
        assert_eq!(value["status"], serde_json::json!("approved"));
        assert_eq!(value["repeat_days"], serde_json::json!([1, 3]));
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Role::Manager).unwrap(), "manager");
        assert_eq!(serde_json::to_value(Role::Default).unwrap(), "default");
    }
}
