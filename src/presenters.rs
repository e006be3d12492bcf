//! Client-facing representations of notes and books.
//!
//! These are the shapes sent over the wire in sync fragments and API
//! responses. Internal row ids and owner ids are never exposed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Book, Note};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteResponse {
    pub uuid: Uuid,
    pub book_uuid: Uuid,
    pub usn: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub added_on: i64,
    pub edited_on: i64,
    pub content: String,
    pub public: bool,
    pub deleted: bool,
}

impl From<&Note> for NoteResponse {
    fn from(note: &Note) -> Self {
        Self {
            uuid: note.uuid,
            book_uuid: note.book_uuid,
            usn: note.usn,
            created_at: note.created_at,
            updated_at: note.updated_at,
            added_on: note.added_on,
            edited_on: note.edited_on,
            content: note.body.clone(),
            public: note.public,
            deleted: note.deleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResponse {
    pub uuid: Uuid,
    pub usn: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub added_on: i64,
    pub label: String,
    pub deleted: bool,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            uuid: book.uuid,
            usn: book.usn,
            created_at: book.created_at,
            updated_at: book.updated_at,
            added_on: book.added_on,
            label: book.label.clone(),
            deleted: book.deleted,
        }
    }
}

/// Envelope for the resource returned by a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse<T> {
    pub result: T,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
