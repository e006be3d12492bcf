use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use sqlx::SqliteConnection;

use super::{json_body, parse_uuid, AppState};
use crate::db;
use crate::error::{Error, ResourceKind, Result};
use crate::models::{Book, User};
use crate::operations::{self, BookUpdate};
use crate::presenters::{BookResponse, ResultResponse};

#[derive(Debug, Deserialize)]
pub(super) struct CreateBook {
    name: String,
}

async fn find_book(conn: &mut SqliteConnection, raw_uuid: &str) -> Result<Book> {
    let uuid = parse_uuid(raw_uuid)?;
    db::books::find_by_uuid(conn, uuid)
        .await?
        .ok_or_else(|| Error::not_found(ResourceKind::Book, uuid.to_string()))
}

pub(super) async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<BookResponse>>> {
    let mut conn = state.pool.acquire().await?;
    let books = db::books::list_live(&mut conn, user.id).await?;

    Ok(Json(books.iter().map(BookResponse::from).collect()))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    body: std::result::Result<Json<CreateBook>, JsonRejection>,
) -> Result<(StatusCode, Json<ResultResponse<BookResponse>>)> {
    let body = json_body(body)?;

    let mut tx = state.pool.begin().await?;
    let book = operations::create_book(&mut tx, &user, &body.name).await?;
    tx.commit().await?;

    tracing::info!("User {} created book {} at usn {}", user.id, book.uuid, book.usn);

    Ok((
        StatusCode::CREATED,
        Json(ResultResponse {
            result: BookResponse::from(&book),
        }),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(uuid): Path<String>,
    body: std::result::Result<Json<BookUpdate>, JsonRejection>,
) -> Result<Json<ResultResponse<BookResponse>>> {
    let params = json_body(body)?;

    let book = find_book(&mut *state.pool.acquire().await?, &uuid).await?;

    let mut tx = state.pool.begin().await?;
    let book = operations::update_book(&mut tx, &user, &book, &params).await?;
    tx.commit().await?;

    Ok(Json(ResultResponse {
        result: BookResponse::from(&book),
    }))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(uuid): Path<String>,
) -> Result<Json<ResultResponse<BookResponse>>> {
    let book = find_book(&mut *state.pool.acquire().await?, &uuid).await?;

    let mut tx = state.pool.begin().await?;
    let book = operations::delete_book(&mut tx, &user, &book).await?;
    tx.commit().await?;

    tracing::info!("User {} deleted book {} at usn {}", user.id, book.uuid, book.usn);

    Ok(Json(ResultResponse {
        result: BookResponse::from(&book),
    }))
}
