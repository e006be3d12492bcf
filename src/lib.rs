//! notesync
//!
//! USN-based synchronization of notes and books between a client and an
//! authoritative server.
//!
//! Every mutation of a user's notes or books is stamped with the next value
//! of that user's update sequence number (USN). Clients pull the changes
//! they have not seen yet as ordered fragments, tombstones included.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod operations;
pub mod presenters;
pub mod server;
pub mod sync;

pub use error::{Error, ResourceKind, Result};
pub use models::{Book, Note, User};
pub use sync::{
    build_fragment, get_sync_state, increment_user_usn, pull_changes, pull_fragment, Change,
    FragmentParams, FragmentSource, LocalSource, PullOutcome, SyncClient, SyncClientError,
    SyncCursor, SyncFragment, SyncMode, SyncState, FULL_SYNC_BEFORE,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
