//! Sync CLI commands for pulling changes from the server.

use clap::{Args, Subcommand};
use notesync::config::Config;
use notesync::sync::{
    pull_changes, save_outcome, LocalStore, SyncClient, SyncClientError, SyncCursor, SyncMode,
};

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, config: &Config) -> Result<(), SyncClientError> {
        match &self.command {
            None => self.sync(config).await,
            Some(SyncSubcommand::Status) => self.status(config).await,
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), SyncClientError> {
        let client = SyncClient::from_config(&config.sync)?;
        let cursor_path = config.cursor_path();
        let cursor = SyncCursor::load(&cursor_path)?;

        println!("Syncing with server...");
        println!();

        let outcome = pull_changes(&client, &cursor, config.sync.fragment_limit).await?;

        if outcome.mode == SyncMode::Full {
            println!("  Full sync (local state predates the server's cutover)");
        }
        println!("  ✓ {} book(s) updated", outcome.books.len());
        println!("  ✓ {} note(s) updated", outcome.notes.len());
        println!("  ✓ {} book(s) removed", outcome.expunged_books.len());
        println!("  ✓ {} note(s) removed", outcome.expunged_notes.len());
        println!(
            "  ({} fragment{})",
            outcome.fragments,
            if outcome.fragments == 1 { "" } else { "s" }
        );

        let store = save_outcome(&outcome, &config.store_path(), &cursor_path)?;

        println!();
        if outcome.change_count() > 0 {
            println!(
                "Sync complete. Now at usn {} with {} book(s) and {} note(s).",
                outcome.cursor.max_usn,
                store.books.len(),
                store.notes.len()
            );
        } else {
            println!("Already up to date.");
        }

        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), SyncClientError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let (server_url, api_key) = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                println!("Status: Not configured");
                println!();
                println!("To enable sync, add to your config file:");
                println!();
                println!("  sync:");
                println!("    server_url: \"http://localhost:8080\"");
                println!("    api_key: \"your-api-key\"");
                println!();
                println!("Or set environment variables:");
                println!("  NOTESYNC_SYNC_URL");
                println!("  NOTESYNC_SYNC_API_KEY");
                return Ok(());
            }
        };

        let cursor = SyncCursor::load(&config.cursor_path())?;
        let store = LocalStore::load(&config.store_path())?;

        println!("Server:    {}", server_url);
        println!("API Key:   {}...", api_key.chars().take(8).collect::<String>());
        println!("Local usn: {}", cursor.max_usn);
        println!(
            "Local:     {} book(s), {} note(s)",
            store.books.len(),
            store.notes.len()
        );
        println!();

        print!("Server status: ");

        let client = SyncClient::from_config(&config.sync)?;
        match client.get_sync_state().await {
            Ok(state) => {
                println!("✓ connected");
                println!("Server usn: {}", state.max_usn);
                if cursor.needs_full_sync(state.full_sync_before) {
                    println!("Next sync:  full");
                } else if state.max_usn > cursor.max_usn {
                    println!(
                        "Next sync:  {} change(s) behind",
                        state.max_usn - cursor.max_usn
                    );
                } else {
                    println!("Next sync:  up to date");
                }
            }
            Err(SyncClientError::Http(e)) if e.is_connect() => println!("✗ unreachable"),
            Err(e) => println!("✗ error: {}", e),
        }

        Ok(())
    }
}
