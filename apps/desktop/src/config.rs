//! Runtime configuration read from the environment.

use anyhow::{Context, Result};
use std::path::PathBuf;

const DB_PATH_VAR: &str = "DUEL_LOG_DB_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    /// Load `.env` if present, then read `DUEL_LOG_DB_PATH` and `RUST_LOG`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = std::env::var(DB_PATH_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        Self {
            db_path,
            log_filter,
        }
    }

    /// Create the directory holding the database file.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data directory {}", parent.display()))?;
        }
        Ok(())
    }
}

/// App data directory for production, current dir as fallback.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duel-log")
        .join("duel-log.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_app_file() {
        let path = default_db_path();
        assert!(path.ends_with("duel-log/duel-log.db"));
    }

    #[test]
    fn ensure_data_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("nested").join("duel-log.db"),
            log_filter: "info".into(),
        };
        config.ensure_data_dir().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
