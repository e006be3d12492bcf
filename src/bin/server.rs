//! notesync Sync Server
//!
//! Serves the USN-based sync API for notes and books.
//!
//! # Configuration
//!
//! Environment variables:
//! - `NOTESYNC_PORT`: Port to listen on (default: 8080)
//! - `NOTESYNC_DATABASE_PATH`: SQLite database (default: ~/.local/share/notesync-server/notesync.db)
//! - `RUST_LOG`: Log filter (default: notesync=info,tower_http=info)
//!
//! Users and their API keys are managed with `notesync-admin`.

use std::net::SocketAddr;

use notesync::config::ServerConfig;
use notesync::db;
use notesync::server::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Database: {}", config.database_path.display());
    let pool = db::init_db(&config.database_path).await?;

    let app = router(AppState::new(pool));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notesync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
