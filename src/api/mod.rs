pub mod health;
pub mod swagger;
pub mod users;

use crate::utils::ErrorResponse;
use actix_web::{error::InternalError, web, HttpResponse};

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(health::index))
        .route("/health", web::get().to(health::health_check))
        .service(web::scope("/users").route("/register", web::post().to(users::register)));
}

/// Answers unreadable JSON bodies with the same envelope as other client errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("❌ Rejected request body: {}", err);
        let response = HttpResponse::BadRequest().json(ErrorResponse {
            success: false,
            message: "Invalid JSON payload".to_string(),
            errors: None,
        });
        InternalError::from_response(err, response).into()
    })
}
