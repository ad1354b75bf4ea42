use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validity window of every issued credential.
pub const TOKEN_TTL_HOURS: i64 = 24;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs credentials for newly registered users.
pub trait TokenIssuer: Send + Sync {
    fn sign(&self, user_id: &str) -> Result<String, TokenError>;
}

/// HS256 issuer. Constructed only from a configured secret; there is no default key.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl TokenIssuer for JwtIssuer {
    fn sign(&self, user_id: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Sign)?;
        log::debug!("🔑 Token issued for user {}", user_id);
        Ok(token)
    }
}
