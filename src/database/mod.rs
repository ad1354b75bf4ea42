use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, Result};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

pub const USERS_COLLECTION: &str = "users";

/// Server error code returned when creating a collection that already exists.
const NAMESPACE_EXISTS: i32 = 48;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.app_name = Some("signup-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.run_command(doc! { "ping": 1 }).await?;

        let mongodb = Self { client, db };
        mongodb.prepare_users_collection().await?;

        Ok(mongodb)
    }

    /// Creates the `users` collection with its schema validator and the unique email index.
    /// The unique index is what guarantees one account per email, so failing to build it is fatal.
    async fn prepare_users_collection(&self) -> Result<()> {
        log::info!("🔧 Preparing '{}' collection...", USERS_COLLECTION);

        match self
            .db
            .create_collection(USERS_COLLECTION)
            .validator(users_validator())
            .await
        {
            Ok(_) => log::info!("   ✅ Collection created: {}", USERS_COLLECTION),
            Err(e) if is_command_error(&e, NAMESPACE_EXISTS) => {
                log::debug!("   ℹ️  Collection already exists: {}", USERS_COLLECTION);
                self.apply_users_validator().await;
            }
            Err(e) => return Err(e),
        }

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        self.collection::<Document>(USERS_COLLECTION)
            .create_index(email_index)
            .await?;
        log::info!("   ✅ Index ready: users(email) unique");

        Ok(())
    }

    /// Brings the validator of an existing `users` collection up to date.
    /// Not fatal: without it only the store-side field validation is lost.
    async fn apply_users_validator(&self) {
        let command = doc! {
            "collMod": USERS_COLLECTION,
            "validator": users_validator()
        };

        match self.db.run_command(command).await {
            Ok(_) => log::info!("   ✅ Validator applied: {}", USERS_COLLECTION),
            Err(e) => log::warn!(
                "   ⚠️  Could not apply validator to '{}', store-side validation is off: {}",
                USERS_COLLECTION,
                e
            ),
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> bool {
        match self.db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("⚠️  MongoDB ping failed: {}", e);
                false
            }
        }
    }

    /// Waits for in-flight operations and closes the connection pool.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

fn is_command_error(err: &mongodb::error::Error, code: i32) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(cmd) if cmd.code == code)
}

fn users_validator() -> Document {
    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "required": ["name", "email", "created_at"],
            "properties": {
                "name": {
                    "bsonType": "string",
                    "minLength": 1,
                    "description": "name must be a non-empty string"
                },
                "email": {
                    "bsonType": "string",
                    "minLength": 3,
                    "description": "email must be a non-empty string"
                },
                "phone": {
                    "bsonType": "string",
                    "description": "phone must be a string"
                },
                "birth_date": {
                    "bsonType": ["date", "null"],
                    "description": "birth_date must be a date"
                }
            }
        }
    }
}
