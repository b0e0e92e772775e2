//! hadir-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the attendance API over HTTP.
//!
//! # Seeding the directory
//!
//! ```text
//! hadir-server add-employee --id H1 --name "Hana" --role hr
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hadir_core::{
  clock::SystemClock,
  employee::{Employee, EmployeeId, EmployeeStatus, Role},
};
use hadir_server::{AppState, ServerConfig};
use hadir_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hadir attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the attendance API (the default).
  Serve,
  /// Insert or update an employee in the directory and exit.
  AddEmployee {
    #[arg(long)]
    id:       String,
    #[arg(long)]
    name:     String,
    #[arg(long, default_value = "employee")]
    role:     Role,
    /// Mark the employee inactive.
    #[arg(long)]
    inactive: bool,
  },
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::AddEmployee { id, name, role, inactive } => {
      let employee = Employee {
        employee_id: EmployeeId::new(id),
        full_name:   name,
        status:      if inactive { EmployeeStatus::Inactive } else { EmployeeStatus::Active },
        role,
      };
      store
        .upsert_employee(&employee)
        .await
        .context("failed to write employee")?;
      println!("{} ({}) saved as {}", employee.full_name, employee.employee_id, employee.role);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let offset = server_cfg.utc_offset_minutes;
  let clock = server_cfg
    .civil_clock(Arc::new(SystemClock))
    .with_context(|| format!("utc_offset_minutes {offset} is out of range"))?;

  tracing::info!(
    offset = %clock.offset(),
    today = %clock.today(),
    max_evidence_bytes = server_cfg.max_evidence_bytes,
    "civil clock ready"
  );

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(Arc::new(store), clock, server_cfg);
  let app = hadir_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
