//! HTTP API of the notesync server.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /v3/sync/state`, `GET /v3/sync/fragment`: incremental sync
//! - `/v3/books`, `/v3/notes`: mutations, each in its own transaction
//!
//! Everything except `/health` requires `Authorization: Bearer <api_key>`.
//!
//! Mutation handlers look up the target row before opening the transaction,
//! so the USN increment is always the transaction's first statement.

pub mod auth;
mod books;
mod error;
mod notes;
mod sync;

pub use auth::{auth_middleware, generate_api_key};

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::version(),
    })
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/v3/sync/state", get(sync::state))
        .route("/v3/sync/fragment", get(sync::fragment))
        .route("/v3/books", get(books::list).post(books::create))
        .route("/v3/books/{uuid}", patch(books::update).delete(books::delete))
        .route("/v3/notes", post(notes::create))
        .route(
            "/v3/notes/{uuid}",
            get(notes::show).patch(notes::update).delete(notes::delete),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::validation("uuid", format!("not a UUID: {:?}", raw)))
}

/// Turns a rejected JSON body into a validation error.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| Error::validation("body", rejection.body_text()))
}
