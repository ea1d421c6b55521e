pub mod db;
pub mod handlers;
pub mod service;
pub mod models;
pub mod dto;
pub mod errors;

use actix_web::{web, App, HttpServer};
use db::init_db_pool;
use dotenv::dotenv;
use sqlx::{postgres::Postgres, Pool};
use std::env;

type PGPool = Pool<Postgres>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    service::log::init_logger();
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'DATABASE_URL': {:?}", e);
    });
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let pool: PGPool = init_db_pool(&db_url).await;
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(service::log::LoggerMiddleware)
            .service(
                web::scope("/auth")
                    .wrap(service::auth::AuthMiddleware)
                    .route("/session", web::post().to(handlers::auth::session)),
            )
            .service(
                web::scope("/events")
                    .wrap(service::auth::AuthMiddleware)
                    .configure(handlers::event::init_routes),
            )
            .service(
                web::scope("/users")
                    .wrap(service::auth::AuthMiddleware)
                    .configure(handlers::user::init_routes),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
