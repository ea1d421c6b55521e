use sqlx::postgres::PgQueryResult;
use uuid::Uuid;

use crate::{models::{Role, User}, PGPool};

pub async fn insert(user: &User, pool: &PGPool) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, subject, name, email, role)
        VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user.id)
    .bind(&user.subject)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .execute(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_subject(subject: &str, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE subject = $1")
        .bind(subject)
        .fetch_optional(pool)
        .await
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Sync name/email with what the identity provider currently reports.
pub async fn set_profile(id: Uuid, name: &str, email: &str, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_role(id: Uuid, role: Role, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
