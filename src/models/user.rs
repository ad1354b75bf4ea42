use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// A registered user as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Normalized fields of a user that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

/// Shape of a document in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<BsonDateTime>,
    pub created_at: BsonDateTime,
}

impl UserDocument {
    pub fn new(user: NewUser, id: ObjectId, created_at: BsonDateTime) -> Self {
        Self {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            birth_date: user.birth_date.map(date_to_bson),
            created_at,
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            name: doc.name,
            email: doc.email,
            phone: doc.phone,
            birth_date: doc.birth_date.and_then(|d| bson_to_utc(d).map(|dt| dt.date_naive())),
            created_at: bson_to_utc(doc.created_at).unwrap_or_default(),
        }
    }
}

// Dates are stored as midnight UTC.
fn date_to_bson(date: NaiveDate) -> BsonDateTime {
    BsonDateTime::from_millis(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

fn bson_to_utc(dt: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
}
