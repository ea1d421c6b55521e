use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{postgres::PgQueryResult, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{dto::UpdateEventDto, models::{Event, EventStatus}, PGPool};

/// Store-side candidate filters for event listings.
pub enum EventFilter {
    Status(EventStatus),
    CreatorStatus(Uuid, EventStatus),
    /// Rows whose stored span overlaps [start, end): for repeating parents
    /// the span is the recurrence window, so this is a superset of what
    /// expansion can emit.
    TimeRange(DateTime<Utc>, DateTime<Utc>),
}

pub async fn insert(event: &Event, pool: &PGPool) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (id, title, descr, start_time, end_time, creator, assigned_user, status, is_repeating, repeat_days)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.descr)
    .bind(event.start_time)
    .bind(event.end_time)
    .bind(event.creator)
    .bind(event.assigned_user)
    .bind(event.status)
    .bind(event.is_repeating)
    .bind(&event.repeat_days)
    .execute(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(filter: EventFilter, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    match filter {
        EventFilter::Status(status) => {
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE status = $1")
                .bind(status)
                .fetch_all(pool)
                .await
        }
        EventFilter::CreatorStatus(creator, status) => {
            sqlx::query_as::<_, Event>(
                "SELECT * FROM events WHERE creator = $1 AND status = $2",
            )
            .bind(creator)
            .bind(status)
            .fetch_all(pool)
            .await
        }
        EventFilter::TimeRange(start, end) => {
            sqlx::query_as::<_, Event>(
                "SELECT * FROM events WHERE start_time < $2 AND end_time > $1",
            )
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn set_status(id: Uuid, status: EventStatus, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE events SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Partial update; only the supplied fields (plus an optional status
/// override) are written. Callers must not pass an all-empty change set.
pub async fn set_fields(
    id: Uuid,
    fields: UpdateEventDto,
    status: Option<EventStatus>,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET ");
    {
        let mut separated = query_builder.separated(", ");
        if let Some(v) = fields.title {
            separated.push("title = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.descr {
            separated.push("descr = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.start_time {
            separated.push("start_time = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.end_time {
            separated.push("end_time = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.assigned_user {
            separated.push("assigned_user = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.is_repeating {
            separated.push("is_repeating = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = fields.repeat_days {
            separated.push("repeat_days = ");
            separated.push_bind_unseparated(v);
        }
        if let Some(v) = status {
            separated.push("status = ");
            separated.push_bind_unseparated(v);
        }
    }
    query_builder.push(" WHERE id = ");
    query_builder.push_bind(id);

    debug!("event update sql: {}", query_builder.sql());
    let res = query_builder.build().execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn delete(id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
