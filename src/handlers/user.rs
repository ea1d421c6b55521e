use actix_web::{get, put, web, HttpRequest, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{dto::UpdateRoleDto, errors::ApiError, handlers::acting_user, service, PGPool};

#[get("/")]
pub async fn get_all(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let conn: &PGPool = pool_state.get_ref();
    acting_user(&req, conn).await?;
    let users = service::user::get_all(conn).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/current")]
pub async fn current(
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let conn: &PGPool = pool_state.get_ref();
    let actor = acting_user(&req, conn).await?;
    Ok(HttpResponse::Ok().json(actor))
}

#[put("/{id}/role")]
pub async fn set_role(
    id: web::Path<Uuid>,
    update_role_dto: web::Json<UpdateRoleDto>,
    req: HttpRequest,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
    let conn: &PGPool = pool_state.get_ref();
    let actor = acting_user(&req, conn).await?;
    let user = service::user::set_role(
        id.into_inner(),
        update_role_dto.into_inner().role,
        &actor,
        conn,
    )
    .await?;
    info!("user {} role set to {:?} by {}", user.id, user.role, actor.id);
    Ok(HttpResponse::Ok().json(user))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(current);
    cfg.service(get_all);
    cfg.service(set_role);
}
