pub mod auth;
pub mod event;
pub mod user;

use actix_web::{HttpMessage, HttpRequest};

use crate::{
    errors::ApiError,
    models::User,
    service::{self, auth::AuthenticatedSubject},
    PGPool,
};

/// The resolved acting user for this request. The auth middleware puts
/// the validated token subject into request extensions; the stored user
/// row is looked up here and passed explicitly into every service call,
/// so authorization never reads ambient state.
pub async fn acting_user(req: &HttpRequest, pool: &PGPool) -> Result<User, ApiError> {
    let subject = req
        .extensions()
        .get::<AuthenticatedSubject>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)?;
    service::user::get_by_subject(&subject.subject, pool).await
}
