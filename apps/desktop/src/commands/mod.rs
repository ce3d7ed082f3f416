//! Commands exposed to the frontend and the CLI.
//!
//! Every command takes the shared [`AppState`] and returns a serializable
//! value or a [`CommandError`].

pub mod csv;
pub mod deck;
pub mod duel;
pub mod stats;
pub mod user;

use crate::db::{DbError, SqliteRepository};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use self::csv::{
    export_csv_file, export_csv_text, import_csv_file, import_csv_text, ExportedFile,
};
pub use deck::{archive_all_decks, create_deck, delete_deck, list_decks, update_deck};
pub use duel::{
    create_duel, delete_duel, export_duels, get_duel, import_duels, list_duels, update_duel,
};
pub use stats::{
    get_available_decks, get_dashboard, get_deck_win_rates, get_matchup_win_rates,
    get_monthly_distribution, get_opponent_deck_distribution, get_recent_deck_distribution,
    get_time_series,
};
pub use user::{get_user, update_user};

/// Broad failure category, for callers that branch on the kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Database,
    Migration,
    Io,
    State,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CommandError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<DbError> for CommandError {
    fn from(e: DbError) -> Self {
        let kind = if e.is_validation() {
            ErrorKind::Validation
        } else if e.is_not_found() {
            ErrorKind::NotFound
        } else if matches!(e, DbError::Migration { .. } | DbError::SchemaTooNew { .. }) {
            ErrorKind::Migration
        } else {
            ErrorKind::Database
        };
        Self::new(kind, e.to_string())
    }
}

impl From<duel_core::ParseError> for CommandError {
    fn from(e: duel_core::ParseError) -> Self {
        Self::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}

/// Result of a command that goes through a file picker.
///
/// `Cancelled` is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FileOutcome<T> {
    Cancelled,
    Completed(T),
}

impl<T> FileOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Run `f` against the locked repository, logging failures.
pub(crate) fn with_repository<T>(
    state: &AppState,
    command: &'static str,
    f: impl FnOnce(&SqliteRepository) -> Result<T, DbError>,
) -> Result<T, CommandError> {
    let repo = state
        .repository
        .lock()
        .map_err(|_| CommandError::new(ErrorKind::State, "repository lock poisoned"))?;
    f(&repo).map_err(|e| log_failure(command, e.into()))
}

pub(crate) fn log_failure(command: &'static str, err: CommandError) -> CommandError {
    warn!(command, kind = ?err.kind, error = %err.message, "command failed");
    err
}
