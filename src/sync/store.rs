//! The client's local copy of synced books and notes.
//!
//! Stored as YAML next to the cursor. A sync cycle is applied to the store
//! and the store is saved before the cursor moves, so a cursor on disk never
//! points past changes the client did not keep.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use super::cursor::{read_yaml, write_yaml, CursorError};
use super::pull::{PullOutcome, SyncMode};
use crate::presenters::{BookResponse, NoteResponse};

/// File name of the store inside the data directory.
pub const STORE_FILE: &str = "notes.yaml";

/// Live books and notes as of the last completed sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalStore {
    #[serde(default)]
    pub books: BTreeMap<Uuid, BookResponse>,
    #[serde(default)]
    pub notes: BTreeMap<Uuid, NoteResponse>,
}

impl LocalStore {
    /// Loads the store, or an empty one if nothing was synced yet.
    pub fn load(path: &Path) -> Result<Self, CursorError> {
        read_yaml(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), CursorError> {
        write_yaml(self, path)
    }

    /// Applies one sync cycle. A full cycle replaces everything.
    pub fn apply(&mut self, outcome: &PullOutcome) {
        if outcome.mode == SyncMode::Full {
            self.books.clear();
            self.notes.clear();
        }

        for (uuid, book) in &outcome.books {
            self.books.insert(*uuid, book.clone());
        }
        for (uuid, note) in &outcome.notes {
            self.notes.insert(*uuid, note.clone());
        }
        for uuid in &outcome.expunged_books {
            self.books.remove(uuid);
        }
        for uuid in &outcome.expunged_notes {
            self.notes.remove(uuid);
        }
    }

    /// Notes filed under a book, by UUID.
    pub fn notes_in(&self, book_uuid: Uuid) -> impl Iterator<Item = &NoteResponse> {
        self.notes
            .values()
            .filter(move |note| note.book_uuid == book_uuid)
    }
}

/// Records a finished cycle: the store at `store_path` first, then the cursor.
pub fn save_outcome(
    outcome: &PullOutcome,
    store_path: &Path,
    cursor_path: &Path,
) -> Result<LocalStore, CursorError> {
    let mut store = LocalStore::load(store_path)?;
    store.apply(outcome);
    store.save(store_path)?;

    outcome.cursor.save(cursor_path)?;

    tracing::debug!(
        "Saved {} book(s) and {} note(s), cursor at usn {}",
        store.books.len(),
        store.notes.len(),
        outcome.cursor.max_usn
    );

    Ok(store)
}
