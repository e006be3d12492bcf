use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use super::{ensure_owner, require_live_book};
use crate::error::{ResourceKind, Result};
use crate::models::{now_nanos, Note, NoteRow, User};
use crate::sync::increment_user_usn;

/// Fields of a note update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    pub book_uuid: Option<Uuid>,
    pub content: Option<String>,
    pub public: Option<bool>,
}

/// Creates a live note in one of the user's books.
///
/// `added_on` defaults to now and `edited_on` to 0 (never edited).
pub async fn create_note(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    book_uuid: Uuid,
    content: &str,
    added_on: Option<i64>,
    edited_on: Option<i64>,
) -> Result<Note> {
    let usn = increment_user_usn(tx, user.id).await?;
    require_live_book(&mut **tx, user, book_uuid).await?;

    let now = Utc::now().to_rfc3339();

    let row: NoteRow = sqlx::query_as(
        r#"
        INSERT INTO notes (uuid, user_id, book_uuid, body, public, usn, deleted, added_on, edited_on, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, 0, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user.id)
    .bind(book_uuid.to_string())
    .bind(content)
    .bind(usn)
    .bind(added_on.unwrap_or_else(now_nanos))
    .bind(edited_on.unwrap_or(0))
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut **tx)
    .await?;

    let note = Note::try_from(row)?;
    tracing::debug!("Created note {} for user {} at usn {}", note.uuid, user.id, usn);
    Ok(note)
}

/// Applies a partial update and marks the note as edited now.
///
/// Updating a deleted note brings it back as a live note.
pub async fn update_note(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    note: &Note,
    params: &NoteUpdate,
) -> Result<Note> {
    ensure_owner(ResourceKind::Note, note.user_id, note.uuid, user)?;

    let usn = increment_user_usn(tx, user.id).await?;
    if let Some(book_uuid) = params.book_uuid {
        require_live_book(&mut **tx, user, book_uuid).await?;
    }

    let row: NoteRow = sqlx::query_as(
        r#"
        UPDATE notes
        SET book_uuid = COALESCE(?, book_uuid),
            body = COALESCE(?, body),
            public = COALESCE(?, public),
            usn = ?,
            edited_on = ?,
            deleted = 0,
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(params.book_uuid.map(|uuid| uuid.to_string()))
    .bind(params.content.as_deref())
    .bind(params.public)
    .bind(usn)
    .bind(now_nanos())
    .bind(Utc::now().to_rfc3339())
    .bind(note.id)
    .fetch_one(&mut **tx)
    .await?;

    let updated = Note::try_from(row)?;
    tracing::debug!("Updated note {} for user {} at usn {}", updated.uuid, user.id, usn);
    Ok(updated)
}

/// Turns the note into a tombstone: empty body, `deleted` set, new USN.
///
/// Deleting a note that is already deleted still consumes a USN.
pub async fn delete_note(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    note: &Note,
) -> Result<Note> {
    ensure_owner(ResourceKind::Note, note.user_id, note.uuid, user)?;

    let usn = increment_user_usn(tx, user.id).await?;

    let row: NoteRow = sqlx::query_as(
        r#"
        UPDATE notes
        SET deleted = 1, body = '', usn = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(usn)
    .bind(Utc::now().to_rfc3339())
    .bind(note.id)
    .fetch_one(&mut **tx)
    .await?;

    let deleted = Note::try_from(row)?;
    tracing::debug!("Deleted note {} for user {} at usn {}", deleted.uuid, user.id, usn);
    Ok(deleted)
}
