//! Database error types.

use duel_core::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("a deck named {name:?} already exists")]
    DuplicateDeckName { name: String, is_opponent: bool },

    #[error("deck not found: {0}")]
    DeckNotFound(i64),

    #[error("duel not found: {0}")]
    DuelNotFound(i64),

    #[error("schema migration failed: {source}")]
    Migration {
        #[source]
        source: rusqlite::Error,
    },

    #[error("database schema version {found} is newer than this build supports (max {supported})")]
    SchemaTooNew { found: i32, supported: i32 },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl DbError {
    /// Rejections caused by the caller's input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateDeckName { .. } | Self::Parse(_) | Self::InvalidData(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeckNotFound(_) | Self::DuelNotFound(_))
    }
}
