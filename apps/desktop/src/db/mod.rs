//! Local SQLite database operations.

pub mod error;
pub mod migrations;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    CsvExportOptions, CsvRepository, DeckRepository, DuelRepository, ImportSummary,
    SqliteRepository, UserRepository,
};
