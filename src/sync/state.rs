use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::db;
use crate::error::Result;

/// Protocol cutover marker, unix seconds (2020-01-01T00:00:00Z).
///
/// A client whose last sync happened before this instant must drop its
/// incremental state and resync from USN 0. Raising it forces every client
/// through a full sync after an incompatible protocol or schema change.
pub const FULL_SYNC_BEFORE: i64 = 1_577_836_800;

/// What a client needs to decide how to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub full_sync_before: i64,
    pub max_usn: i64,
    pub current_time: i64,
}

pub async fn get_sync_state(conn: &mut SqliteConnection, user_id: i64) -> Result<SyncState> {
    let max_usn = db::users::max_usn(conn, user_id).await?;

    Ok(SyncState {
        full_sync_before: FULL_SYNC_BEFORE,
        max_usn,
        current_time: Utc::now().timestamp(),
    })
}
