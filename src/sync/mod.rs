//! USN-based incremental sync.
//!
//! The server side allocates USNs ([`usn`]), reports the sync state
//! ([`state`]) and serves change fragments ([`fragment`]). The client side
//! pulls fragments from a [`FragmentSource`] ([`pull`]), keeps what it pulled
//! in a [`LocalStore`] ([`store`]) and remembers how far it got in a
//! [`SyncCursor`] ([`cursor`]).

pub mod client;
pub mod cursor;
pub mod fragment;
pub mod pull;
pub mod state;
pub mod store;
pub mod usn;

pub use client::{SyncClient, SyncClientError};
pub use cursor::{CursorError, SyncCursor, CURSOR_FILE};
pub use fragment::{
    build_fragment, merge_changes, pull_fragment, Change, FragmentParams, SyncFragment,
    DEFAULT_FRAGMENT_LIMIT, MAX_FRAGMENT_LIMIT,
};
pub use pull::{pull_changes, FragmentSource, LocalSource, PullOutcome, SyncMode};
pub use state::{get_sync_state, SyncState, FULL_SYNC_BEFORE};
pub use store::{save_outcome, LocalStore, STORE_FILE};
pub use usn::increment_user_usn;
