use crate::database::{MongoDB, USERS_COLLECTION};
use crate::models::{NewUser, User, UserDocument};
use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Duplicate key on a unique index.
const DUPLICATE_KEY: i32 = 11000;
/// Document rejected by the collection's schema validator.
const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("document failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for user records. Implementations must enforce email uniqueness at write time.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts the user, assigning `id` and `created_at`.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Liveness of the underlying connection.
    async fn is_connected(&self) -> bool;
}

pub struct MongoUserStore {
    db: MongoDB,
}

impl MongoUserStore {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }

    fn users(&self) -> mongodb::Collection<UserDocument> {
        self.db.collection::<UserDocument>(USERS_COLLECTION)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let found = self
            .users()
            .find_one(doc! { "email": email })
            .await
            .map_err(classify_error)?;

        Ok(found.map(User::from))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let document = UserDocument::new(user, ObjectId::new(), BsonDateTime::now());

        self.users()
            .insert_one(&document)
            .await
            .map_err(classify_error)?;

        log::debug!("💾 Inserted user document {}", document.id.to_hex());
        Ok(User::from(document))
    }

    async fn is_connected(&self) -> bool {
        self.db.ping().await
    }
}

fn classify_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => classify_write_error(
            write_error.code,
            &write_error.message,
            write_error.details.as_ref(),
        ),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn classify_write_error(code: i32, message: &str, details: Option<&Document>) -> StoreError {
    match code {
        DUPLICATE_KEY => StoreError::UniqueViolation,
        DOCUMENT_VALIDATION_FAILURE => {
            let messages = details.map(schema_messages).unwrap_or_default();
            if messages.is_empty() {
                StoreError::Validation(vec![message.to_string()])
            } else {
                StoreError::Validation(messages)
            }
        }
        _ => StoreError::Unavailable(format!("write error {}: {}", code, message)),
    }
}

/// Flattens `$jsonSchema` failure details into one message per offending field.
fn schema_messages(details: &Document) -> Vec<String> {
    let mut messages = Vec::new();

    let Ok(rules) = details.get_array("schemaRulesNotSatisfied") else {
        return messages;
    };

    for rule in rules.iter().filter_map(Bson::as_document) {
        if let Ok(missing) = rule.get_array("missingProperties") {
            for field in missing.iter().filter_map(Bson::as_str) {
                messages.push(format!("{} is required", field));
            }
        }

        if let Ok(properties) = rule.get_array("propertiesNotSatisfied") {
            for property in properties.iter().filter_map(Bson::as_document) {
                let Ok(field) = property.get_str("propertyName") else {
                    continue;
                };
                match property.get_str("description") {
                    Ok(description) => messages.push(description.to_string()),
                    Err(_) => messages.push(format!("{} is invalid", field)),
                }
            }
        }
    }

    messages
}
