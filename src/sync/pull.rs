//! The client pull loop.
//!
//! A sync cycle asks for the server's sync state, then pulls fragments
//! starting at the client's cursor until it has everything up to the
//! snapshot of the first fragment. Changes that commit later are picked up
//! by the next cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use sqlx::SqlitePool;
use uuid::Uuid;

use super::cursor::SyncCursor;
use super::fragment::{pull_fragment, FragmentParams, SyncFragment};
use super::state::{get_sync_state, SyncState};
use crate::presenters::{BookResponse, NoteResponse};

/// Anything that serves sync state and fragments for one user.
pub trait FragmentSource {
    type Error: std::error::Error;

    fn sync_state(&self) -> impl Future<Output = Result<SyncState, Self::Error>> + Send;

    fn fragment(
        &self,
        after_usn: i64,
        limit: i64,
    ) -> impl Future<Output = Result<SyncFragment, Self::Error>> + Send;
}

/// Serves fragments straight from the database, without HTTP.
#[derive(Debug, Clone)]
pub struct LocalSource {
    pool: SqlitePool,
    user_id: i64,
}

impl LocalSource {
    pub fn new(pool: SqlitePool, user_id: i64) -> Self {
        Self { pool, user_id }
    }
}

impl FragmentSource for LocalSource {
    type Error = crate::Error;

    async fn sync_state(&self) -> crate::Result<SyncState> {
        let mut conn = self.pool.acquire().await?;
        get_sync_state(&mut conn, self.user_id).await
    }

    async fn fragment(&self, after_usn: i64, limit: i64) -> crate::Result<SyncFragment> {
        let params = FragmentParams::new(after_usn, limit)?;
        let mut conn = self.pool.acquire().await?;
        pull_fragment(&mut conn, self.user_id, params).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Pulled only what changed after the client's cursor.
    Incremental,
    /// The cursor predated the full-sync marker; pulled everything from 0.
    /// The client should replace its local copy with the outcome.
    Full,
}

/// Everything learned during one sync cycle.
#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub mode: SyncMode,
    /// Latest live state of every note seen, by UUID.
    pub notes: BTreeMap<Uuid, NoteResponse>,
    pub books: BTreeMap<Uuid, BookResponse>,
    /// UUIDs whose latest state seen is a tombstone.
    pub expunged_notes: BTreeSet<Uuid>,
    pub expunged_books: BTreeSet<Uuid>,
    /// Number of fragment requests made.
    pub fragments: usize,
    /// Cursor to store for the next cycle.
    pub cursor: SyncCursor,
}

impl PullOutcome {
    fn new(mode: SyncMode, cursor: SyncCursor) -> Self {
        Self {
            mode,
            notes: BTreeMap::new(),
            books: BTreeMap::new(),
            expunged_notes: BTreeSet::new(),
            expunged_books: BTreeSet::new(),
            fragments: 0,
            cursor,
        }
    }

    /// Applies a fragment on top of what earlier fragments delivered.
    fn apply(&mut self, fragment: &SyncFragment) {
        for note in &fragment.notes {
            self.expunged_notes.remove(&note.uuid);
            self.notes.insert(note.uuid, note.clone());
        }
        for book in &fragment.books {
            self.expunged_books.remove(&book.uuid);
            self.books.insert(book.uuid, book.clone());
        }
        for uuid in &fragment.expunged_notes {
            self.notes.remove(uuid);
            self.expunged_notes.insert(*uuid);
        }
        for uuid in &fragment.expunged_books {
            self.books.remove(uuid);
            self.expunged_books.insert(*uuid);
        }
    }

    /// Total number of resources that changed.
    pub fn change_count(&self) -> usize {
        self.notes.len() + self.books.len() + self.expunged_notes.len() + self.expunged_books.len()
    }
}

/// Runs one sync cycle against `source`, starting from `cursor`.
pub async fn pull_changes<S: FragmentSource>(
    source: &S,
    cursor: &SyncCursor,
    limit: i64,
) -> Result<PullOutcome, S::Error> {
    let state = source.sync_state().await?;

    let (mode, mut after_usn) = if cursor.needs_full_sync(state.full_sync_before) {
        (SyncMode::Full, 0)
    } else {
        (SyncMode::Incremental, cursor.max_usn)
    };

    tracing::info!(
        "Starting {:?} sync from usn {} (server max_usn {})",
        mode,
        after_usn,
        state.max_usn
    );

    let mut outcome = PullOutcome::new(mode, *cursor);
    let mut snapshot = None;

    loop {
        let fragment = source.fragment(after_usn, limit).await?;
        outcome.fragments += 1;

        let target = *snapshot.get_or_insert(fragment.user_max_usn);

        if fragment.is_empty() {
            break;
        }

        outcome.apply(&fragment);
        after_usn = fragment.frag_max_usn;

        tracing::debug!(
            "Applied fragment {} with {} change(s), now at usn {}",
            outcome.fragments,
            fragment.len(),
            after_usn
        );

        if fragment.is_caught_up() || after_usn >= target {
            break;
        }
    }

    outcome.cursor = SyncCursor {
        max_usn: after_usn,
        last_sync_at: state.current_time,
    };

    tracing::info!(
        "Sync finished after {} fragment(s): {} change(s), cursor at usn {}",
        outcome.fragments,
        outcome.change_count(),
        after_usn
    );

    Ok(outcome)
}
