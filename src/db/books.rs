use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{Book, BookRow};

pub async fn find_by_uuid(
    conn: &mut SqliteConnection,
    uuid: Uuid,
) -> Result<Option<Book>, sqlx::Error> {
    let row: Option<BookRow> = sqlx::query_as("SELECT * FROM books WHERE uuid = ?")
        .bind(uuid.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Book::try_from).transpose()
}

/// Finds a live book of the user carrying the given label.
pub async fn find_live_by_label(
    conn: &mut SqliteConnection,
    user_id: i64,
    label: &str,
) -> Result<Option<Book>, sqlx::Error> {
    let row: Option<BookRow> =
        sqlx::query_as("SELECT * FROM books WHERE user_id = ? AND label = ? AND deleted = 0")
            .bind(user_id)
            .bind(label)
            .fetch_optional(&mut *conn)
            .await?;

    row.map(Book::try_from).transpose()
}

pub async fn list_live(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Book>, sqlx::Error> {
    let rows: Vec<BookRow> =
        sqlx::query_as("SELECT * FROM books WHERE user_id = ? AND deleted = 0 ORDER BY label")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(Book::try_from).collect()
}

/// Books touched in `(after_usn, upto_usn]`, ascending by USN, at most `limit`.
pub async fn list_changed(
    conn: &mut SqliteConnection,
    user_id: i64,
    after_usn: i64,
    upto_usn: i64,
    limit: i64,
) -> Result<Vec<Book>, sqlx::Error> {
    let rows: Vec<BookRow> = sqlx::query_as(
        r#"
        SELECT * FROM books
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

    rows.into_iter().map(Book::try_from).collect()
}
