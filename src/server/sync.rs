use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::AppState;
use crate::error::Result;
use crate::models::User;
use crate::sync::{get_sync_state, pull_fragment, FragmentParams, SyncFragment, SyncState};

/// Raw query of a fragment request, validated by [`FragmentParams::parse`].
#[derive(Debug, Deserialize)]
pub(super) struct FragmentQuery {
    after_usn: Option<String>,
    limit: Option<String>,
}

pub(super) async fn state(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<SyncState>> {
    let mut conn = state.pool.acquire().await?;
    let sync_state = get_sync_state(&mut conn, user.id).await?;

    Ok(Json(sync_state))
}

pub(super) async fn fragment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<FragmentQuery>,
) -> Result<Json<SyncFragment>> {
    let params = FragmentParams::parse(query.after_usn.as_deref(), query.limit.as_deref())?;

    let mut conn = state.pool.acquire().await?;
    let fragment = pull_fragment(&mut conn, user.id, params).await?;

    tracing::debug!(
        "User {} pulled {} change(s) after usn {}",
        user.id,
        fragment.len(),
        params.after_usn
    );

    Ok(Json(fragment))
}
