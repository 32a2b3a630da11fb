//! Remarcable job board server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `REMARCABLE_*` environment variables, opens the SQLite store, and serves
//! the JSON API over HTTP.
//!
//! # First admin account
//!
//! ```
//! cargo run -p remarcable-server --bin server -- create-admin ops@example.com
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use remarcable_core::{access::NewUser, store::JobStore};
use remarcable_server::{ServerConfig, app_state, router};
use remarcable_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Remarcable job board server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Create an admin user, reading the password from stdin.
  CreateAdmin { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg =
    ServerConfig::load(cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.database_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::CreateAdmin { email } => create_admin(&store, &email).await,
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let state = app_state(store, server_cfg)?;
  let app = router(state, server_cfg)?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
      tracing::info!("shutting down");
    })
    .await
    .context("server error")?;

  Ok(())
}

async fn create_admin(store: &SqliteStore, email: &str) -> anyhow::Result<()> {
  let email = email.trim().to_lowercase();
  if !email.contains('@') {
    bail!("{email:?} is not an email address");
  }
  if store.find_user_by_email(&email).await?.is_some() {
    bail!("a user with email {email} already exists");
  }

  let password = rpassword_or_stdin()?;
  if password.is_empty() {
    bail!("password must not be empty");
  }
  let password_hash = remarcable_api::auth::hash_password(&password)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

  let user = store
    .create_user(NewUser { email, password_hash, is_admin: true })
    .await
    .context("failed to create user")?;
  println!("created admin {} ({})", user.email, user.user_id);
  Ok(())
}

/// Read a password from stdin (no echo).
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
