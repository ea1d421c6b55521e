use uuid::Uuid;

use crate::{
    db,
    errors::ApiError,
    models::{Role, User},
    service::auth::AuthenticatedSubject,
    PGPool,
};

/// Upsert keyed by the external subject id: the first authenticated
/// contact creates the user with the default role, later contacts sync
/// name/email with what the identity provider reports.
pub async fn ensure(subject: &AuthenticatedSubject, pool: &PGPool) -> Result<User, ApiError> {
    let existing = db::user::get_by_subject(&subject.subject, pool)
        .await
        .map_err(|_| ApiError::InternalError)?;

    match existing {
        Some(user) => {
            if user.name != subject.name || user.email != subject.email {
                db::user::set_profile(user.id, &subject.name, &subject.email, pool)
                    .await
                    .map_err(|_| ApiError::InternalError)?;
                return Ok(User {
                    name: subject.name.clone(),
                    email: subject.email.clone(),
                    ..user
                });
            }
            Ok(user)
        }
        None => {
            let user = User {
                id: Uuid::new_v4(),
                subject: subject.subject.clone(),
                name: subject.name.clone(),
                email: subject.email.clone(),
                role: Role::Default,
            };
            db::user::insert(&user, pool)
                .await
                .map_err(|_| ApiError::InternalError)?;
            Ok(user)
        }
    }
}

pub async fn get_by_subject(subject: &str, pool: &PGPool) -> Result<User, ApiError> {
    let res = db::user::get_by_subject(subject, pool).await;
    match res {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::NotFound),
        Err(_) => Err(ApiError::InternalError),
    }
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<User, ApiError> {
    let res = db::user::get_by_id(id, pool).await;
    match res {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::NotFound),
        Err(_) => Err(ApiError::InternalError),
    }
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<User>, ApiError> {
    db::user::get_all(pool).await.map_err(|_| ApiError::InternalError)
}

pub async fn set_role(
    target: Uuid,
    role: Role,
    actor: &User,
    pool: &PGPool,
) -> Result<User, ApiError> {
    if actor.role != Role::Manager {
        return Err(ApiError::Forbidden(
            "only managers can update user roles".to_string(),
        ));
    }
    let user = get_by_id(target, pool).await?;
    db::user::set_role(target, role, pool)
        .await
        .map_err(|_| ApiError::InternalError)?;
    Ok(User { role, ..user })
}
