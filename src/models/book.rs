use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

/// A notebook. Deleting a book keeps its row as a tombstone with an empty
/// label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub label: String,
    pub usn: i64,
    pub deleted: bool,
    pub added_on: i64,
    pub edited_on: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct BookRow {
    id: i64,
    uuid: String,
    user_id: i64,
    label: String,
    usn: i64,
    deleted: bool,
    added_on: i64,
    edited_on: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = sqlx::Error;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: row.id,
            uuid: parse_uuid(&row.uuid)?,
            user_id: row.user_id,
            label: row.label,
            usn: row.usn,
            deleted: row.deleted,
            added_on: row.added_on,
            edited_on: row.edited_on,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}
