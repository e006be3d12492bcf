//! Per-user update sequence number allocation.
//!
//! Both functions take the transaction of the mutation they stamp. The
//! `UPDATE` takes the write lock on the user's counter row, so a second
//! writer for the same user waits until the first transaction commits or
//! rolls back.

use sqlx::{Sqlite, Transaction};

/// Increments the user's `max_usn` and returns the new value.
///
/// Fails with [`sqlx::Error::RowNotFound`] if the user does not exist. The
/// increment is only visible once `tx` commits.
pub async fn increment_user_usn(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
) -> Result<i64, sqlx::Error> {
    let (next_usn,): (i64,) =
        sqlx::query_as("UPDATE users SET max_usn = max_usn + 1 WHERE id = ? RETURNING max_usn")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

    Ok(next_usn)
}

/// Takes the counter row's write lock without consuming a USN.
///
/// Used by operations that read before their first increment.
pub async fn lock_user_counter(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query("UPDATE users SET max_usn = max_usn WHERE id = ?")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}
