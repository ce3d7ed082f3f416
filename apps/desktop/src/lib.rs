//! Duel log data layer: SQLite store, migrations, and the command surface.

pub mod commands;
pub mod config;
pub mod db;
pub mod logging;
pub mod state;

use anyhow::{Context, Result};
use config::AppConfig;
use db::SqliteRepository;
use state::AppState;
use tracing::info;

/// Open (creating and migrating if needed) the database named by `config`.
pub fn open_state(config: &AppConfig) -> Result<AppState> {
    config.ensure_data_dir()?;
    let repository = SqliteRepository::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    info!(
        path = %config.db_path.display(),
        schema_version = repository.schema_version()?,
        "database ready"
    );
    Ok(AppState::new(repository))
}
