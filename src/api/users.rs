use crate::services::registration_service::{self, RegisterRequest, RegisterResponse};
use crate::services::{TokenIssuer, UserStore};
use crate::utils::{AppError, ErrorResponse};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Unexpected failure", body = ErrorResponse)
    )
)]
pub async fn register(
    store: web::Data<dyn UserStore>,
    tokens: web::Data<dyn TokenIssuer>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /users/register - email: {}", email_str);

    match registration_service::register(store.get_ref(), tokens.get_ref(), &request).await {
        Ok(registration) => Ok(HttpResponse::Created().json(RegisterResponse::from(registration))),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email_str, e);
            Err(e)
        }
    }
}
