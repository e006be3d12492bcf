use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

/// A note. The body is opaque to the server and emptied on deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub book_uuid: Uuid,
    pub body: String,
    pub public: bool,
    pub usn: i64,
    pub deleted: bool,
    pub added_on: i64,
    pub edited_on: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct NoteRow {
    id: i64,
    uuid: String,
    user_id: i64,
    book_uuid: String,
    body: String,
    public: bool,
    usn: i64,
    deleted: bool,
    added_on: i64,
    edited_on: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<NoteRow> for Note {
    type Error = sqlx::Error;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(Note {
            id: row.id,
            uuid: parse_uuid(&row.uuid)?,
            user_id: row.user_id,
            book_uuid: parse_uuid(&row.book_uuid)?,
            body: row.body,
            public: row.public,
            usn: row.usn,
            deleted: row.deleted,
            added_on: row.added_on,
            edited_on: row.edited_on,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}
