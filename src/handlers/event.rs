use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{
   dto::{CalendarWindowDto, NewEventDto, UpdateEventDto},
   errors::ApiError,
   handlers::acting_user,
   service, PGPool,
};

#[post("/create")]
pub async fn create(
   req: HttpRequest,
   new_event_dto: web::Json<NewEventDto>,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn: &PGPool = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let event = service::event::create(&actor, new_event_dto.into_inner(), conn).await?;
   info!("event {} created with status {:?}", event.id, event.status);
   Ok(HttpResponse::Created().json(event))
}

#[put("/update/{id}")]
pub async fn update(
   id: web::Path<Uuid>,
   update_event_dto: web::Json<UpdateEventDto>,
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let event = service::event::update(
      id.into_inner(),
      update_event_dto.into_inner(),
      &actor,
      conn,
   )
   .await?;
   Ok(HttpResponse::Ok().json(event))
}

#[delete("/{id}")]
pub async fn remove(
   id: web::Path<Uuid>,
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   service::event::delete(id.into_inner(), &actor, conn).await?;
   Ok(HttpResponse::NoContent().finish())
}

#[post("/{id}/approve")]
pub async fn approve(
   id: web::Path<Uuid>,
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let event = service::event::approve(id.into_inner(), &actor, conn).await?;
   info!("event {} approved by {}", event.id, actor.id);
   Ok(HttpResponse::Ok().json(event))
}

#[post("/{id}/reject")]
pub async fn reject(
   id: web::Path<Uuid>,
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let event = service::event::reject(id.into_inner(), &actor, conn).await?;
   info!("event {} rejected by {}", event.id, actor.id);
   Ok(HttpResponse::Ok().json(event))
}

#[get("/calendar")]
pub async fn calendar(
   req: HttpRequest,
   window: web::Query<CalendarWindowDto>,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let occurrences =
      service::schedule::visible_events(&actor, &window.into_inner(), conn).await?;
   Ok(HttpResponse::Ok().json(occurrences))
}

#[get("/pending")]
pub async fn pending(
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let events = service::schedule::pending_events(&actor, conn).await?;
   Ok(HttpResponse::Ok().json(events))
}

#[get("/pending/mine")]
pub async fn user_pending(
   req: HttpRequest,
   pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, ApiError> {
   let conn = pool_state.get_ref();
   let actor = acting_user(&req, conn).await?;
   let events = service::schedule::user_pending_events(&actor, conn).await?;
   Ok(HttpResponse::Ok().json(events))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(create);
   cfg.service(update);
   cfg.service(approve);
   cfg.service(reject);
   cfg.service(calendar);
   cfg.service(pending);
   cfg.service(user_pending);
   cfg.service(remove);
}
