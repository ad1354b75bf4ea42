use crate::models::{NewUser, User};
use crate::services::token_service::TokenIssuer;
use crate::services::user_store::{StoreError, UserStore};
use crate::utils::{
    is_valid_email, normalize_email, normalize_name, parse_birth_date, AppError,
};
use serde::{Deserialize, Serialize};

// Request/Response structures
#[derive(Debug, Default, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub birth_date: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: User,
}

/// A persisted user together with its freshly signed credential.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub token: String,
}

impl From<Registration> for RegisterResponse {
    fn from(registration: Registration) -> Self {
        Self {
            success: true,
            message: "User registered successfully".to_string(),
            token: registration.token,
            user: registration.user,
        }
    }
}

/// Validates the request, stores the new user and signs a credential for it.
///
/// The lookup by email is only a fast path: two concurrent requests can both miss it,
/// and the store's unique index decides which one wins. Both paths end in `Conflict`.
pub async fn register(
    store: &dyn UserStore,
    tokens: &dyn TokenIssuer,
    request: &RegisterRequest,
) -> Result<Registration, AppError> {
    let (name, email) = required_fields(request)?;

    if store
        .find_by_email(&email)
        .await
        .map_err(store_failure)?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    // Field errors are reported only once the email is known to be free.
    let new_user = build_user(request, name, email)?;

    let user = store.create(new_user).await.map_err(|e| match e {
        StoreError::UniqueViolation => {
            AppError::Conflict("Email is already registered".to_string())
        }
        StoreError::Validation(errors) => AppError::validation(errors),
        other => store_failure(other),
    })?;

    let token = tokens.sign(&user.id).map_err(|e| {
        log::error!("❌ Failed to sign token for user {}: {}", user.id, e);
        AppError::Internal(e.to_string())
    })?;

    log::info!("✅ User registered: {} ({})", user.email, user.id);
    Ok(Registration { user, token })
}

/// Required-field and email-shape checks; returns the raw name and the normalized email.
fn required_fields(request: &RegisterRequest) -> Result<(&str, String), AppError> {
    let (Some(name), Some(email)) = (non_empty(&request.name), non_empty(&request.email)) else {
        return Err(AppError::invalid("Name and email are required"));
    };

    if !is_valid_email(email) {
        return Err(AppError::invalid("Email format is not valid"));
    }

    Ok((name, normalize_email(email)))
}

fn build_user(request: &RegisterRequest, name: &str, email: String) -> Result<NewUser, AppError> {
    let mut errors = Vec::new();

    let name = normalize_name(name);
    if name.is_empty() {
        errors.push("name is required".to_string());
    }

    let birth_date = match non_empty(&request.birth_date) {
        Some(raw) => {
            let parsed = parse_birth_date(raw);
            if parsed.is_none() {
                errors.push(format!("birthDate is not a valid date: {}", raw));
            }
            parsed
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    Ok(NewUser {
        name,
        email,
        phone: request.phone.clone().unwrap_or_default(),
        birth_date,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn store_failure(err: StoreError) -> AppError {
    log::error!("❌ User store failure during registration: {}", err);
    AppError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::InMemoryUserStore;
    use crate::services::token_service::JwtIssuer;
    use chrono::NaiveDate;

    fn request(name: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    fn issuer() -> JwtIssuer {
        JwtIssuer::new("registration-test-secret")
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let store = InMemoryUserStore::new();
        let cases = [
            RegisterRequest { email: Some("a@b.com".into()), ..Default::default() },
            RegisterRequest { name: Some("Ana".into()), ..Default::default() },
            request("", "a@b.com"),
            request("Ana", ""),
        ];

        for case in cases {
            let err = register(&store, &issuer(), &case).await.unwrap_err();
            assert_eq!(err, AppError::invalid("Name and email are required"));
        }
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn malformed_emails_are_rejected() {
        let store = InMemoryUserStore::new();
        for email in ["foo", "a@b", "@b.com"] {
            let err = register(&store, &issuer(), &request("Ana", email))
                .await
                .unwrap_err();
            assert_eq!(err, AppError::invalid("Email format is not valid"));
        }
    }

    #[tokio::test]
    async fn fields_are_normalized() {
        let store = InMemoryUserStore::new();
        let registration = register(&store, &issuer(), &request("  Bob  ", "BOB@EXAMPLE.COM"))
            .await
            .unwrap();

        assert_eq!(registration.user.name, "Bob");
        assert_eq!(registration.user.email, "bob@example.com");
        assert!(store.find_stored("bob@example.com").is_some());
    }

    #[tokio::test]
    async fn optional_fields_default() {
        let store = InMemoryUserStore::new();
        let registration = register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap();

        assert_eq!(registration.user.phone, "");
        assert_eq!(registration.user.birth_date, None);
    }

    #[tokio::test]
    async fn optional_fields_are_kept() {
        let store = InMemoryUserStore::new();
        let req = RegisterRequest {
            phone: Some("+34 600 000 000".into()),
            birth_date: Some("1995-03-08".into()),
            ..request("Ana", "ana@test.com")
        };

        let registration = register(&store, &issuer(), &req).await.unwrap();
        assert_eq!(registration.user.phone, "+34 600 000 000");
        assert_eq!(
            registration.user.birth_date,
            NaiveDate::from_ymd_opt(1995, 3, 8)
        );
    }

    #[tokio::test]
    async fn blank_name_and_bad_birth_date_are_field_errors() {
        let store = InMemoryUserStore::new();
        let req = RegisterRequest {
            birth_date: Some("yesterday".into()),
            ..request("   ", "ana@test.com")
        };

        match register(&store, &issuer(), &req).await.unwrap_err() {
            AppError::InvalidInput { message, errors } => {
                assert_eq!(message, "Validation error");
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0], "name is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_registration_conflicts() {
        let store = InMemoryUserStore::new();
        register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap();

        let err = register(&store, &issuer(), &request("Ana Again", "ANA@test.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::Conflict("A user with this email already exists".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn taken_email_conflicts_before_field_errors() {
        let store = InMemoryUserStore::new();
        register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap();

        let blank_name = request("   ", "ana@test.com");
        let bad_birth_date = RegisterRequest {
            birth_date: Some("yesterday".into()),
            ..request("Ana", "ana@test.com")
        };

        for req in [blank_name, bad_birth_date] {
            let err = register(&store, &issuer(), &req).await.unwrap_err();
            assert_eq!(
                err,
                AppError::Conflict("A user with this email already exists".to_string())
            );
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn write_time_violation_is_conflict() {
        // Lookup never sees existing users, as when two requests pass the check together.
        let store = InMemoryUserStore::racing();
        register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap();

        let err = register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Conflict("Email is already registered".to_string()));
    }

    #[tokio::test]
    async fn concurrent_same_email_yields_one_success() {
        let store = InMemoryUserStore::racing();
        let tokens = issuer();
        let req = request("Ana", "ana@test.com");

        let results = futures::future::join_all(
            (0..2).map(|_| register(&store, &tokens, &req)),
        )
        .await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn store_validation_errors_are_invalid_input() {
        let store = InMemoryUserStore::failing(StoreError::Validation(vec![
            "email must be a non-empty string".to_string(),
        ]));

        let err = register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::validation(vec!["email must be a non-empty string".to_string()])
        );
    }

    #[tokio::test]
    async fn unavailable_store_is_internal() {
        let store = InMemoryUserStore::failing(StoreError::Unavailable("timeout".into()));

        let err = register(&store, &issuer(), &request("Ana", "ana@test.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn token_identifies_new_user() {
        let store = InMemoryUserStore::new();
        let tokens = issuer();
        let registration = register(&store, &tokens, &request("Ana", "ana@test.com"))
            .await
            .unwrap();

        assert!(!registration.user.id.is_empty());
        let claims = tokens.verify(&registration.token).unwrap();
        assert_eq!(claims.user_id, registration.user.id);
    }
}
