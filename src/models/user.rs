use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

/// An account owning notes and books.
///
/// `max_usn` is the last update sequence number handed out for this user.
/// It starts at 0, only grows, and is shared by notes and books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub max_usn: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    id: i64,
    uuid: String,
    email: String,
    api_key: String,
    max_usn: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            uuid: parse_uuid(&row.uuid)?,
            email: row.email,
            api_key: row.api_key,
            max_usn: row.max_usn,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}
