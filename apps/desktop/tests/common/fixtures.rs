//! Test fixtures and factory functions for creating test data.

use chrono::NaiveDateTime;
use duel_core::types::{GameMode, NewDuel};
use rusqlite::Connection;
use std::path::Path;

/// Parse `YYYY-MM-DD HH:MM:SS`.
pub fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").expect("fixture timestamp")
}

/// A RANK duel with no coin or turn information.
pub fn new_duel(deck_id: i64, opponent_deck_id: i64, is_win: bool, played: &str) -> NewDuel {
    NewDuel {
        deck_id,
        opponent_deck_id,
        is_win,
        game_mode: GameMode::Rank,
        rank: None,
        rate_value: None,
        dc_value: None,
        won_coin_toss: None,
        is_going_first: None,
        played_date: at(played),
        notes: None,
    }
}

/// A duel in `mode` carrying that mode's metric.
pub fn mode_duel(
    deck_id: i64,
    opponent_deck_id: i64,
    is_win: bool,
    mode: GameMode,
    value: f64,
    played: &str,
) -> NewDuel {
    let mut duel = new_duel(deck_id, opponent_deck_id, is_win, played);
    duel.game_mode = mode;
    match mode {
        GameMode::Rank => duel.rank = Some(value as i64),
        GameMode::Rate => duel.rate_value = Some(value),
        GameMode::Dc => duel.dc_value = Some(value as i64),
        GameMode::Event => {}
    }
    duel
}

/// Tables as written by the first releases, before the version marker existed.
pub const LEGACY_SCHEMA: &str = r#"
CREATE TABLE user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    streamer_mode INTEGER NOT NULL DEFAULT 0,
    theme_preference TEXT NOT NULL DEFAULT 'light',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE deck (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_opponent_deck INTEGER NOT NULL DEFAULT 0,
    is_archived INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE duel (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_deck_id INTEGER NOT NULL REFERENCES deck(id),
    opponent_deck_id INTEGER NOT NULL REFERENCES deck(id),
    result TEXT NOT NULL,
    game_mode TEXT NOT NULL,
    rank_value INTEGER,
    rate_value REAL,
    dc_value INTEGER,
    coin_result TEXT,
    turn_order TEXT,
    played_at TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
INSERT INTO user (id, username, streamer_mode, theme_preference, created_at, updated_at)
    VALUES (1, 'Yugi', 1, 'solarized', '2023-12-01T09:00:00', '2023-12-01T09:00:00');
INSERT INTO deck (id, name, is_opponent_deck, is_archived, created_at, updated_at) VALUES
    (1, 'ドラゴン', 0, 0, '2024-01-01T10:00:00', '2024-01-01T10:00:00'),
    (2, '天使', 1, 0, '2024-01-01T10:00:00', '2024-01-01T10:00:00'),
    (3, '旧デッキ', 0, 1, '2023-06-01T10:00:00', '2023-06-01T10:00:00');
INSERT INTO duel (id, player_deck_id, opponent_deck_id, result, game_mode, rank_value,
    coin_result, turn_order, played_at, notes, created_at, updated_at) VALUES
    (1, 1, 2, 'win', 'RANK', 18, 'loss', 'first', '2024-01-15T21:30:00', 'good game',
        '2024-01-15T21:30:00', '2024-01-15T21:30:00'),
    (2, 1, 2, 'loss', 'RANK', 17, NULL, 'second', '2024-01-16T22:00:00', NULL,
        '2024-01-16T22:00:00', '2024-01-16T22:00:00'),
    (3, 3, 2, 'win', 'RATE', NULL, 'win', NULL, '2023-06-02T08:00:00', NULL,
        '2023-06-02T08:00:00', '2023-06-02T08:00:00');
"#;

/// Write a legacy-layout database at `path`.
pub fn create_legacy_db(path: &Path) {
    let conn = Connection::open(path).expect("open legacy database");
    conn.execute_batch(LEGACY_SCHEMA).expect("write legacy schema");
}
