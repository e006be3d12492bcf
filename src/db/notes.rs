use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{Note, NoteRow};

pub async fn find_by_uuid(
    conn: &mut SqliteConnection,
    uuid: Uuid,
) -> Result<Option<Note>, sqlx::Error> {
    let row: Option<NoteRow> = sqlx::query_as("SELECT * FROM notes WHERE uuid = ?")
        .bind(uuid.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Note::try_from).transpose()
}

/// Live notes filed under a book, oldest first.
pub async fn list_live_in_book(
    conn: &mut SqliteConnection,
    user_id: i64,
    book_uuid: Uuid,
) -> Result<Vec<Note>, sqlx::Error> {
    let rows: Vec<NoteRow> = sqlx::query_as(
        "SELECT * FROM notes WHERE user_id = ? AND book_uuid = ? AND deleted = 0 ORDER BY usn",
    )
    .bind(user_id)
    .bind(book_uuid.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Note::try_from).collect()
}

/// Notes touched in `(after_usn, upto_usn]`, ascending by USN, at most `limit`.
pub async fn list_changed(
    conn: &mut SqliteConnection,
    user_id: i64,
    after_usn: i64,
    upto_usn: i64,
    limit: i64,
) -> Result<Vec<Note>, sqlx::Error> {
    let rows: Vec<NoteRow> = sqlx::query_as(
        r#"
        SELECT * FROM notes
        WHERE user_id = ? AND usn > ? AND usn <= ?
        ORDER BY usn ASC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(after_usn)
    .bind(upto_usn)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Note::try_from).collect()
}
