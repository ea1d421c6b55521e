use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use log::info;

use crate::{errors::ApiError, service, service::auth::AuthenticatedSubject, PGPool};

/// First-contact endpoint: validates the bearer token (middleware) and
/// upserts the user record from its claims. Clients call this once after
/// sign-in, before any event operation.
pub async fn session(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let conn: &PGPool = pool_state.get_ref();
    let subject = req
        .extensions()
        .get::<AuthenticatedSubject>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)?;
    let user = service::user::ensure(&subject, conn).await?;
    info!("session established for {} ({})", user.id, user.subject);
    Ok(HttpResponse::Ok().json(user))
}
