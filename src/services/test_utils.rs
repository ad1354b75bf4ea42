//! In-memory user store for service and handler tests

use crate::models::{NewUser, User};
use crate::services::user_store::{StoreError, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    lookup_misses: bool,
    reject_with: Option<StoreError>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `find_by_email` always misses, so duplicates are only caught on insert.
    pub fn racing() -> Self {
        Self {
            lookup_misses: true,
            ..Self::default()
        }
    }

    /// Every `create` fails with `err`.
    pub fn failing(err: StoreError) -> Self {
        Self {
            reject_with: Some(err),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn find_stored(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        if self.lookup_misses {
            return Ok(None);
        }
        Ok(self.find_stored(email))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation);
        }

        let created = User {
            id: ObjectId::new().to_hex(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            birth_date: user.birth_date,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn is_connected(&self) -> bool {
        true
    }
}
