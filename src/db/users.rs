//! User rows and the per-user USN counter column.

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{User, UserRow};

pub async fn create_user(
    conn: &mut SqliteConnection,
    email: &str,
    api_key: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let row: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (uuid, email, api_key, max_usn, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(api_key)
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut *conn)
    .await?;

    User::try_from(row)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(User::try_from).transpose()
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(User::try_from).transpose()
}

pub async fn find_by_api_key(
    conn: &mut SqliteConnection,
    api_key: &str,
) -> Result<Option<User>, sqlx::Error> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE api_key = ?")
        .bind(api_key)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(User::try_from).transpose()
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY email")
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Reads the live value of a user's counter.
pub async fn max_usn(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, sqlx::Error> {
    let (max_usn,): (i64,) = sqlx::query_as("SELECT max_usn FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(max_usn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_db;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = setup_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        let user = create_user(&mut conn, "alice@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.max_usn, 0);

        let by_id = find_by_id(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(by_id, user);

        let by_key = find_by_api_key(&mut conn, "secret").await.unwrap().unwrap();
        assert_eq!(by_key.id, user.id);

        let by_email = find_by_email(&mut conn, "ALICE@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_api_key() {
        let db = setup_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        assert!(find_by_api_key(&mut conn, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = setup_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        create_user(&mut conn, "bob@example.com", "k1").await.unwrap();
        assert!(create_user(&mut conn, "bob@example.com", "k2").await.is_err());
    }

    #[tokio::test]
    async fn test_list_sorted_by_email() {
        let db = setup_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        create_user(&mut conn, "zed@example.com", "k1").await.unwrap();
        create_user(&mut conn, "amy@example.com", "k2").await.unwrap();

        let users = list(&mut conn).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "amy@example.com");
    }

    #[tokio::test]
    async fn test_max_usn_missing_user() {
        let db = setup_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        let result = max_usn(&mut conn, 42).await;
        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
    }
}
