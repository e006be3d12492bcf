use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use uuid::Uuid;

use super::{ensure_owner, notes::delete_note};
use crate::db;
use crate::error::{Error, ResourceKind, Result};
use crate::models::{now_nanos, Book, BookRow, User};
use crate::sync::{increment_user_usn, usn::lock_user_counter};

/// Fields of a book update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
    #[serde(rename = "name")]
    pub label: Option<String>,
}

/// Checks that a label can name a book.
pub fn validate_book_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(Error::validation("name", "book name cannot be empty"));
    }
    if label.chars().any(char::is_whitespace) {
        return Err(Error::validation("name", "book name cannot contain spaces"));
    }
    if label.parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(Error::validation("name", "book name cannot be a number"));
    }
    Ok(())
}

async fn ensure_label_available(
    conn: &mut SqliteConnection,
    user: &User,
    label: &str,
    except: Option<Uuid>,
) -> Result<()> {
    match db::books::find_live_by_label(conn, user.id, label).await? {
        Some(existing) if Some(existing.uuid) != except => Err(Error::Conflict(label.to_string())),
        _ => Ok(()),
    }
}

pub async fn create_book(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    label: &str,
) -> Result<Book> {
    validate_book_label(label)?;

    let usn = increment_user_usn(tx, user.id).await?;
    ensure_label_available(&mut **tx, user, label, None).await?;

    let now = Utc::now().to_rfc3339();

    let row: BookRow = sqlx::query_as(
        r#"
        INSERT INTO books (uuid, user_id, label, usn, deleted, added_on, edited_on, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, 0, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user.id)
    .bind(label)
    .bind(usn)
    .bind(now_nanos())
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut **tx)
    .await?;

    let book = Book::try_from(row)?;
    tracing::debug!("Created book {} for user {} at usn {}", book.uuid, user.id, usn);
    Ok(book)
}

/// Applies a partial update.
///
/// Updating a deleted book brings it back, which needs a new name since the
/// tombstone's label was cleared.
pub async fn update_book(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    book: &Book,
    params: &BookUpdate,
) -> Result<Book> {
    ensure_owner(ResourceKind::Book, book.user_id, book.uuid, user)?;
    match &params.label {
        Some(label) => validate_book_label(label)?,
        None if book.deleted => {
            return Err(Error::validation(
                "name",
                "a deleted book needs a name to be restored",
            ))
        }
        None => {}
    }

    let usn = increment_user_usn(tx, user.id).await?;
    if let Some(label) = &params.label {
        ensure_label_available(&mut **tx, user, label, Some(book.uuid)).await?;
    }

    let row: BookRow = sqlx::query_as(
        r#"
        UPDATE books
        SET label = COALESCE(?, label),
            usn = ?,
            edited_on = ?,
            deleted = 0,
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(params.label.as_deref())
    .bind(usn)
    .bind(now_nanos())
    .bind(Utc::now().to_rfc3339())
    .bind(book.id)
    .fetch_one(&mut **tx)
    .await?;

    let updated = Book::try_from(row)?;
    tracing::debug!("Updated book {} for user {} at usn {}", updated.uuid, user.id, usn);
    Ok(updated)
}

/// Deletes every live note in the book, then the book itself.
///
/// Each note consumes its own USN and the book takes the last one. All of it
/// happens in the caller's transaction.
pub async fn delete_book(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    book: &Book,
) -> Result<Book> {
    ensure_owner(ResourceKind::Book, book.user_id, book.uuid, user)?;

    lock_user_counter(tx, user.id).await?;

    let notes = db::notes::list_live_in_book(&mut **tx, user.id, book.uuid).await?;
    for note in &notes {
        delete_note(tx, user, note).await?;
    }

    let usn = increment_user_usn(tx, user.id).await?;

    let row: BookRow = sqlx::query_as(
        r#"
        UPDATE books
        SET deleted = 1, label = '', usn = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(usn)
    .bind(Utc::now().to_rfc3339())
    .bind(book.id)
    .fetch_one(&mut **tx)
    .await?;

    let deleted = Book::try_from(row)?;
    tracing::debug!(
        "Deleted book {} and {} note(s) for user {}, book usn {}",
        deleted.uuid,
        notes.len(),
        user.id,
        usn
    );
    Ok(deleted)
}
