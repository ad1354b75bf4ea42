use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// Failure kinds surfaced to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or malformed input. `errors` carries field-level messages when the store rejected the document.
    InvalidInput {
        message: String,
        errors: Vec<String>,
    },
    Conflict(String),
    /// Detail is for logs only, never rendered.
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<String>) -> Self {
        AppError::InvalidInput {
            message: "Validation error".to_string(),
            errors,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput { message, errors } if errors.is_empty() => {
                write!(f, "Invalid input: {}", message)
            }
            AppError::InvalidInput { message, errors } => {
                write!(f, "Invalid input: {} ({})", message, errors.join("; "))
            }
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::InvalidInput { message, errors } => ErrorResponse {
                success: false,
                message: message.clone(),
                errors: if errors.is_empty() { None } else { Some(errors.clone()) },
            },
            AppError::Conflict(message) => ErrorResponse {
                success: false,
                message: message.clone(),
                errors: None,
            },
            AppError::Internal(_) => ErrorResponse {
                success: false,
                message: "Internal server error while registering user".to_string(),
                errors: None,
            },
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
