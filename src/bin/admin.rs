//! notesync Admin CLI
//!
//! Administration tool for managing users on the sync server.
//!
//! # Usage
//!
//! ```bash
//! notesync-admin user add erik@example.com
//! notesync-admin user list
//! ```
//!
//! # Environment Variables
//!
//! - `NOTESYNC_DATABASE_PATH`: Server database (default: ~/.local/share/notesync-server/notesync.db)

use clap::{Args, Parser, Subcommand};
use notesync::config::ServerConfig;
use notesync::db::{self, users};
use notesync::server::generate_api_key;
use sqlx::SqlitePool;

#[derive(Parser)]
#[command(name = "notesync-admin")]
#[command(version)]
#[command(about = "notesync server administration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// Add a new user and print their API key
    Add {
        /// User's email address
        email: String,
    },
    /// List all users
    List,
}

async fn add_user(pool: &SqlitePool, email: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = pool.acquire().await?;

    if users::find_by_email(&mut conn, &email).await?.is_some() {
        return Err(format!("User '{}' already exists", email).into());
    }

    let api_key = generate_api_key();
    let user = users::create_user(&mut conn, &email, &api_key).await?;

    println!("Added user: {}", user.email);
    println!("  UUID: {}", user.uuid);
    println!("  API key: {}", api_key);
    println!();
    println!("The API key is shown only once. Configure the client with:");
    println!("  sync:");
    println!("    api_key: {}", api_key);

    Ok(())
}

async fn list_users(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = pool.acquire().await?;
    let all = users::list(&mut conn).await?;

    if all.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<40} {:<38} {:>8}", "EMAIL", "UUID", "MAX_USN");
    println!("{}", "-".repeat(88));

    for user in &all {
        println!("{:<40} {:<38} {:>8}", user.email, user.uuid, user.max_usn);
    }

    println!();
    println!("Total: {} user(s)", all.len());

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let pool = db::init_db(&config.database_path).await?;

    match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::Add { email } => add_user(&pool, email).await,
            UserSubcommand::List => list_users(&pool).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
