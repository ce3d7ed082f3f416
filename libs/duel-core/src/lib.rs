//! Core duel-log library shared by the desktop application and its CLI.
//!
//! Provides:
//! - Shared types (Deck, Duel, User, filters, versioned import records)
//! - Statistics over duel lists (dashboard, distributions, matchups, time series)
//! - CSV rendering and parsing with Japanese column headers
//! - Rank tier names and name collation for deck lists

pub mod collation;
pub mod csv_codec;
pub mod error;
pub mod rank;
pub mod stats;
pub mod timestamp;
pub mod types;

pub use csv_codec::{CsvColumn, CsvDuelRow, CsvRowError, ParsedCsv};
pub use error::{ParseError, Result};
pub use stats::{
    AvailableDecks, DashboardStats, DeckUsage, DeckWinRate, MatchupWinRate, MonthlyDistribution,
    TimeSeriesPoint,
};
pub use types::{
    Deck, DeckPatch, DeckRef, Duel, DuelFilters, DuelPatch, DuelRecord, GameMode, NewDeck,
    NewDuel, StatisticsFilters, Theme, User, UserPatch,
};
