use crate::config::Config;
use crate::services::UserStore;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    /// `Connected` or `Disconnected`.
    pub database: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct IndexResponse {
    pub message: String,
    pub environment: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up; reports database connectivity", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<dyn UserStore>) -> impl Responder {
    let database = if store.is_connected().await {
        "Connected"
    } else {
        "Disconnected"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: database.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "API is running", body = IndexResponse)
    )
)]
pub async fn index(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(IndexResponse {
        message: "API running".to_string(),
        environment: config.environment.clone(),
    })
}
