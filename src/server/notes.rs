use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{json_body, parse_uuid, AppState};
use crate::db;
use crate::error::{Error, ResourceKind, Result};
use crate::models::{Note, User};
use crate::operations::{self, NoteUpdate};
use crate::presenters::{NoteResponse, ResultResponse};

#[derive(Debug, Deserialize)]
pub(super) struct CreateNote {
    book_uuid: Uuid,
    content: String,
    added_on: Option<i64>,
    edited_on: Option<i64>,
}

async fn find_note(conn: &mut SqliteConnection, raw_uuid: &str) -> Result<Note> {
    let uuid = parse_uuid(raw_uuid)?;
    db::notes::find_by_uuid(conn, uuid)
        .await?
        .ok_or_else(|| Error::not_found(ResourceKind::Note, uuid.to_string()))
}

fn respond(note: &Note) -> Json<ResultResponse<NoteResponse>> {
    Json(ResultResponse {
        result: NoteResponse::from(note),
    })
}

pub(super) async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(uuid): Path<String>,
) -> Result<Json<ResultResponse<NoteResponse>>> {
    let mut conn = state.pool.acquire().await?;
    let note = find_note(&mut conn, &uuid).await?;
    if note.user_id != user.id {
        return Err(Error::ownership(ResourceKind::Note, note.uuid.to_string()));
    }

    Ok(respond(&note))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: std::result::Result<Json<CreateNote>, JsonRejection>,
) -> Result<(StatusCode, Json<ResultResponse<NoteResponse>>)> {
    let body = json_body(body)?;

    let mut tx = state.pool.begin().await?;
    let note = operations::create_note(
        &mut tx,
        &user,
        body.book_uuid,
        &body.content,
        body.added_on,
        body.edited_on,
    )
    .await?;
    tx.commit().await?;

    tracing::info!("User {} created note {} at usn {}", user.id, note.uuid, note.usn);

    Ok((StatusCode::CREATED, respond(&note)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(uuid): Path<String>,
    body: std::result::Result<Json<NoteUpdate>, JsonRejection>,
) -> Result<Json<ResultResponse<NoteResponse>>> {
    let params = json_body(body)?;

    let note = find_note(&mut *state.pool.acquire().await?, &uuid).await?;

    let mut tx = state.pool.begin().await?;
    let note = operations::update_note(&mut tx, &user, &note, &params).await?;
    tx.commit().await?;

    Ok(respond(&note))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(uuid): Path<String>,
) -> Result<Json<ResultResponse<NoteResponse>>> {
    let note = find_note(&mut *state.pool.acquire().await?, &uuid).await?;

    let mut tx = state.pool.begin().await?;
    let note = operations::delete_note(&mut tx, &user, &note).await?;
    tx.commit().await?;

    tracing::info!("User {} deleted note {} at usn {}", user.id, note.uuid, note.usn);

    Ok(respond(&note))
}
