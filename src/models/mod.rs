mod book;
mod note;
mod user;

pub use book::{Book, BookRow};
pub use note::{Note, NoteRow};
pub use user::{User, UserRow};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Current time as unix nanoseconds, the unit of `added_on` / `edited_on`.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn parse_uuid(value: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2024-01-02T03:04:05+00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        let offset = parse_timestamp("2024-01-02T05:04:05+02:00").unwrap();
        assert_eq!(offset, parsed);
    }

    #[test]
    fn test_corrupt_timestamp_is_decode_error() {
        assert!(matches!(parse_timestamp("yesterday"), Err(sqlx::Error::Decode(_))));
        assert!(matches!(parse_timestamp(""), Err(sqlx::Error::Decode(_))));
    }
}
