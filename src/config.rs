use thiserror::Error;

const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:8101",
    "http://localhost:8100",
    "http://localhost:3000",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mongodb_uri = get("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;

        // No fallback secret: signing tokens with a well-known key is worse than not starting.
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let mongodb_database = get("MONGODB_DATABASE")
            .or_else(|| database_name_from_uri(&mongodb_uri))
            .unwrap_or_else(|| "signup".to_string());

        let cors_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            mongodb_uri,
            mongodb_database,
            jwt_secret,
            cors_origins,
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }
}

/// Extracts the database name from the path of a connection string, if any.
fn database_name_from_uri(uri: &str) -> Option<String> {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest)?;
    let (_, path) = without_scheme.split_once('/')?;
    let name = path.split('?').next().unwrap_or("");
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
