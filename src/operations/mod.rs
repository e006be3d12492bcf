//! Mutation operations on notes and books.
//!
//! Every operation takes the caller's `Transaction` and stamps its change
//! with a fresh USN from
//! [`increment_user_usn`](crate::sync::increment_user_usn). The caller
//! commits. On error the caller drops or rolls back the transaction, which
//! discards the change together with the USN it consumed.
//!
//! Ownership is verified before anything is written. The USN increment is
//! always the first write of an operation so that writers for the same user
//! queue on the counter row.

pub mod books;
pub mod notes;

pub use books::{create_book, delete_book, update_book, validate_book_label, BookUpdate};
pub use notes::{create_note, delete_note, update_note, NoteUpdate};

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db;
use crate::error::{Error, ResourceKind, Result};
use crate::models::{Book, User};

fn ensure_owner(kind: ResourceKind, owner_id: i64, uuid: Uuid, user: &User) -> Result<()> {
    if owner_id != user.id {
        tracing::warn!("User {} attempted to modify {} {}", user.id, kind, uuid);
        return Err(Error::ownership(kind, uuid.to_string()));
    }
    Ok(())
}

/// Loads a book that notes can be filed under: owned by the user and live.
async fn require_live_book(conn: &mut SqliteConnection, user: &User, uuid: Uuid) -> Result<Book> {
    match db::books::find_by_uuid(conn, uuid).await? {
        Some(book) if book.user_id == user.id && !book.deleted => Ok(book),
        _ => Err(Error::not_found(ResourceKind::Book, uuid.to_string())),
    }
}
