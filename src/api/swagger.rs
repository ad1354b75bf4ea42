use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Signup Service API",
        version = "1.0.0",
        description = "User registration backed by MongoDB.\n\nA successful registration returns the created user and a JWT (claim `userId`, valid for 24 hours)."
    ),
    paths(
        crate::api::users::register,
        crate::api::health::health_check,
        crate::api::health::index,
    ),
    components(
        schemas(
            crate::services::registration_service::RegisterRequest,
            crate::services::registration_service::RegisterResponse,
            crate::models::User,
            crate::utils::ErrorResponse,
            crate::api::health::HealthResponse,
            crate::api::health::IndexResponse,
        )
    ),
    tags(
        (name = "Users", description = "User registration. Emails are unique and stored lowercased."),
        (name = "Health", description = "Liveness and database connectivity."),
    )
)]
pub struct ApiDoc;
