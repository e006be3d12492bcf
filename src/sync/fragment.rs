//! Incremental sync fragments.
//!
//! A fragment is one bounded batch of a user's changes in USN order. It
//! covers `(after_usn, user_max_usn]`, where `user_max_usn` is read once
//! before any content query, so writes that commit while the fragment is
//! being assembled are left for the next pull.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db;
use crate::error::{Error, Result};
use crate::models::{Book, Note};
use crate::presenters::{BookResponse, NoteResponse};

/// Fragment size used when the client does not ask for one.
pub const DEFAULT_FRAGMENT_LIMIT: i64 = 100;
/// Largest fragment a client may request.
pub const MAX_FRAGMENT_LIMIT: i64 = 100;

/// Validated cursor and limit of a fragment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentParams {
    pub after_usn: i64,
    pub limit: i64,
}

impl Default for FragmentParams {
    fn default() -> Self {
        Self {
            after_usn: 0,
            limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }
}

impl FragmentParams {
    pub fn new(after_usn: i64, limit: i64) -> Result<Self> {
        if after_usn < 0 {
            return Err(Error::validation("after_usn", "must not be negative"));
        }
        if limit < 1 {
            return Err(Error::validation("limit", "must be at least 1"));
        }
        if limit > MAX_FRAGMENT_LIMIT {
            return Err(Error::validation(
                "limit",
                format!("must not exceed {}", MAX_FRAGMENT_LIMIT),
            ));
        }
        Ok(Self { after_usn, limit })
    }

    /// Parses raw query string values. Absent values take their defaults.
    pub fn parse(after_usn: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let after_usn = match after_usn {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::validation("after_usn", format!("not an integer: {:?}", raw)))?,
            None => 0,
        };
        let limit = match limit {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::validation("limit", format!("not an integer: {:?}", raw)))?,
            None => DEFAULT_FRAGMENT_LIMIT,
        };
        Self::new(after_usn, limit)
    }
}

/// One entry of the merged change stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Note(Note),
    Book(Book),
}

impl Change {
    pub fn usn(&self) -> i64 {
        match self {
            Change::Note(note) => note.usn,
            Change::Book(book) => book.usn,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Change::Note(note) => note.deleted,
            Change::Book(book) => book.deleted,
        }
    }
}

/// Merges two USN-ascending lists into one and keeps the first `limit`.
///
/// Notes and books share one counter per user, so their USNs never tie.
pub fn merge_changes(notes: Vec<Note>, books: Vec<Book>, limit: usize) -> Vec<Change> {
    let mut notes = notes.into_iter().peekable();
    let mut books = books.into_iter().peekable();
    let mut merged = Vec::with_capacity(limit);

    while merged.len() < limit {
        let next = match (notes.peek(), books.peek()) {
            (Some(note), Some(book)) if note.usn < book.usn => notes.next().map(Change::Note),
            (_, Some(_)) => books.next().map(Change::Book),
            (Some(_), None) => notes.next().map(Change::Note),
            (None, None) => None,
        };

        match next {
            Some(change) => merged.push(change),
            None => break,
        }
    }

    merged
}

/// One page of the incremental sync protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFragment {
    /// USN of the last change in this fragment, 0 if it is empty.
    pub frag_max_usn: i64,
    /// The user's counter when the fragment was built.
    pub user_max_usn: i64,
    /// Server time, unix seconds.
    pub current_time: i64,
    pub notes: Vec<NoteResponse>,
    pub books: Vec<BookResponse>,
    pub expunged_notes: Vec<Uuid>,
    pub expunged_books: Vec<Uuid>,
}

impl SyncFragment {
    fn from_changes(changes: &[Change], user_max_usn: i64, current_time: i64) -> Self {
        let mut fragment = Self {
            frag_max_usn: changes.last().map(Change::usn).unwrap_or(0),
            user_max_usn,
            current_time,
            notes: Vec::new(),
            books: Vec::new(),
            expunged_notes: Vec::new(),
            expunged_books: Vec::new(),
        };

        for change in changes {
            match change {
                Change::Note(note) if note.deleted => fragment.expunged_notes.push(note.uuid),
                Change::Note(note) => fragment.notes.push(NoteResponse::from(note)),
                Change::Book(book) if book.deleted => fragment.expunged_books.push(book.uuid),
                Change::Book(book) => fragment.books.push(BookResponse::from(book)),
            }
        }

        fragment
    }

    /// Number of changes carried, upserts and tombstones together.
    pub fn len(&self) -> usize {
        self.notes.len() + self.books.len() + self.expunged_notes.len() + self.expunged_books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the client has everything up to the fragment's snapshot.
    pub fn is_caught_up(&self) -> bool {
        self.is_empty() || self.frag_max_usn == self.user_max_usn
    }
}

/// Builds the fragment covering `(after_usn, user_max_usn]`.
///
/// `user_max_usn` must be the snapshot the caller read before this call.
pub async fn build_fragment(
    conn: &mut SqliteConnection,
    user_id: i64,
    user_max_usn: i64,
    after_usn: i64,
    limit: i64,
) -> Result<SyncFragment> {
    let params = FragmentParams::new(after_usn, limit)?;

    let notes =
        db::notes::list_changed(conn, user_id, params.after_usn, user_max_usn, params.limit).await?;
    let books =
        db::books::list_changed(conn, user_id, params.after_usn, user_max_usn, params.limit).await?;

    let changes = merge_changes(notes, books, params.limit as usize);
    let fragment = SyncFragment::from_changes(&changes, user_max_usn, Utc::now().timestamp());

    tracing::debug!(
        "Built fragment for user {}: ({}, {}] -> {} change(s), frag_max_usn {}",
        user_id,
        params.after_usn,
        user_max_usn,
        changes.len(),
        fragment.frag_max_usn
    );

    Ok(fragment)
}

/// Snapshots the user's counter and builds the next fragment after it.
pub async fn pull_fragment(
    conn: &mut SqliteConnection,
    user_id: i64,
    params: FragmentParams,
) -> Result<SyncFragment> {
    let user_max_usn = db::users::max_usn(conn, user_id).await?;
    build_fragment(conn, user_id, user_max_usn, params.after_usn, params.limit).await
}
