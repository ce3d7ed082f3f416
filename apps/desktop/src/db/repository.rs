//! Repository pattern for database access.

use crate::db::error::DbError;
use crate::db::migrations;
use crate::db::schema::{self, DUEL_INSERT, DUEL_SELECT, LEGACY_SCHEMA_VERSION};
use chrono::{Local, NaiveDateTime};
use duel_core::csv_codec::{self, CsvColumn, CsvRowError};
use duel_core::stats;
use duel_core::timestamp;
use duel_core::types::{
    Deck, DeckPatch, Duel, DuelFilters, DuelPatch, DuelRecord, GameMode, NewDeck, NewDuel, Theme,
    User, UserPatch,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, DbError>;

/// Repository for the singleton user record.
pub trait UserRepository {
    fn get_user(&self) -> Result<User>;
    fn update_user(&self, patch: &UserPatch) -> Result<User>;
}

/// Repository for deck operations.
pub trait DeckRepository {
    fn list_active_decks(&self) -> Result<Vec<Deck>>;
    fn get_deck(&self, id: i64) -> Result<Option<Deck>>;
    fn create_deck(&self, deck: &NewDeck) -> Result<Deck>;
    fn update_deck(&self, id: i64, patch: &DeckPatch) -> Result<Deck>;
    fn delete_deck(&self, id: i64) -> Result<Deck>;
    fn archive_all_decks(&self) -> Result<usize>;
}

/// Repository for duel operations.
pub trait DuelRepository {
    fn list_duels(&self, filters: &DuelFilters) -> Result<Vec<Duel>>;
    fn get_duel(&self, id: i64) -> Result<Option<Duel>>;
    fn create_duel(&self, duel: &NewDuel) -> Result<Duel>;
    fn update_duel(&self, id: i64, patch: &DuelPatch) -> Result<Duel>;
    fn delete_duel(&self, id: i64) -> Result<()>;
    fn import_duels(&self, records: Vec<DuelRecord>) -> Result<usize>;
    fn export_duels(&self) -> Result<Vec<Duel>>;
}

/// Repository for CSV export and import.
pub trait CsvRepository {
    fn export_csv(&self, options: &CsvExportOptions) -> Result<String>;
    fn import_csv(&self, text: &str) -> Result<ImportSummary>;
}

/// CSV export options. Empty `columns` means the full column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvExportOptions {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub columns: Vec<CsvColumn>,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub success: bool,
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<CsvRowError>,
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating and migrating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migrations::run_migrations(&mut conn)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(&schema::schema())?;
        self.conn.execute(schema::INIT_USER, params![now()])?;
        Ok(())
    }

    /// Recorded schema version.
    pub fn schema_version(&self) -> Result<i32> {
        Ok(migrations::get_schema_version(&self.conn)?.unwrap_or(LEGACY_SCHEMA_VERSION))
    }

    fn require_deck(&self, id: i64) -> Result<Deck> {
        self.get_deck(id)?.ok_or(DbError::DeckNotFound(id))
    }

    fn require_duel(&self, id: i64) -> Result<Duel> {
        self.get_duel(id)?.ok_or(DbError::DuelNotFound(id))
    }

    /// Fail with `DuplicateDeckName` when another active deck on the same side has this name.
    fn check_deck_name(&self, name: &str, is_opponent: bool, exclude: Option<i64>) -> Result<()> {
        let taken: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM deck
                WHERE name = ?1 AND is_opponent = ?2 AND active = 1 AND id != ?3
            )",
            params![name, is_opponent, exclude.unwrap_or(-1)],
            |row| row.get(0),
        )?;
        if taken {
            return Err(DbError::DuplicateDeckName {
                name: name.to_string(),
                is_opponent,
            });
        }
        Ok(())
    }
}

fn now() -> String {
    timestamp::format_canonical(&Local::now().naive_local())
}

fn validate_deck_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::InvalidData("deck name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

fn conversion_error(idx: usize, err: duel_core::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn stored_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    timestamp::parse_stored(&raw).map_err(|e| conversion_error(idx, e))
}

fn row_to_deck(row: &Row<'_>) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        is_opponent: row.get(2)?,
        active: row.get(3)?,
        create_date: stored_timestamp(row, 4)?,
        update_date: stored_timestamp(row, 5)?,
    })
}

fn row_to_duel(row: &Row<'_>) -> rusqlite::Result<Duel> {
    let game_mode: String = row.get(6)?;
    Ok(Duel {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        deck_name: row.get(2)?,
        opponent_deck_id: row.get(3)?,
        opponent_deck_name: row.get(4)?,
        is_win: row.get(5)?,
        game_mode: GameMode::parse(&game_mode).map_err(|e| conversion_error(6, e))?,
        rank: row.get(7)?,
        rate_value: row.get(8)?,
        dc_value: row.get(9)?,
        won_coin_toss: row.get(10)?,
        is_going_first: row.get(11)?,
        played_date: stored_timestamp(row, 12)?,
        notes: row.get(13)?,
        create_date: stored_timestamp(row, 14)?,
        update_date: stored_timestamp(row, 15)?,
    })
}

fn deck_exists(conn: &Connection, id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM deck WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(DbError::DeckNotFound(id));
    }
    Ok(())
}

fn insert_duel(conn: &Connection, duel: &NewDuel, now: &str) -> Result<i64> {
    conn.execute(
        DUEL_INSERT,
        params![
            duel.deck_id,
            duel.opponent_deck_id,
            duel.is_win,
            duel.game_mode.as_str(),
            duel.rank,
            duel.rate_value,
            duel.dc_value,
            duel.won_coin_toss,
            duel.is_going_first,
            timestamp::format_canonical(&duel.played_date),
            duel.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    conn.execute(
        "UPDATE duel SET create_date = ?1, update_date = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(id)
}

/// Id of the active deck with this name on this side, creating it when missing.
fn resolve_deck(
    conn: &Connection,
    cache: &mut HashMap<(String, bool), i64>,
    name: &str,
    is_opponent: bool,
    now: &str,
) -> Result<i64> {
    let key = (name.to_string(), is_opponent);
    if let Some(&id) = cache.get(&key) {
        return Ok(id);
    }

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM deck WHERE name = ?1 AND is_opponent = ?2 AND active = 1 ORDER BY id LIMIT 1",
            params![name, is_opponent],
            |row| row.get(0),
        )
        .optional()?;

    let id = match existing {
        Some(id) => id,
        None => {
            conn.execute(
                "INSERT INTO deck (name, is_opponent, active, create_date, update_date) VALUES (?1, ?2, 1, ?3, ?3)",
                params![name, is_opponent, now],
            )?;
            let id = conn.last_insert_rowid();
            debug!(deck_id = id, name, is_opponent, "created deck during csv import");
            id
        }
    };
    cache.insert(key, id);
    Ok(id)
}

fn duel_exists(conn: &Connection, deck_id: i64, opponent_deck_id: i64, played_date: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM duel WHERE deck_id = ?1 AND opponent_deck_id = ?2 AND played_date = ?3
        )",
        params![deck_id, opponent_deck_id, played_date],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl UserRepository for SqliteRepository {
    fn get_user(&self) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username, streamer_mode, theme_preference, create_date, update_date FROM user WHERE id = 1",
                [],
                |row| {
                    let theme: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        streamer_mode: row.get(2)?,
                        theme_preference: Theme::from_str(&theme).unwrap_or_default(),
                        create_date: stored_timestamp(row, 4)?,
                        update_date: stored_timestamp(row, 5)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    fn update_user(&self, patch: &UserPatch) -> Result<User> {
        let current = self.get_user()?;
        let username = match &patch.username {
            Some(name) if name.trim().is_empty() => {
                return Err(DbError::InvalidData("username must not be empty".to_string()))
            }
            Some(name) => name.trim().to_string(),
            None => current.username,
        };
        let streamer_mode = patch.streamer_mode.unwrap_or(current.streamer_mode);
        let theme = patch.theme_preference.unwrap_or(current.theme_preference);

        self.conn.execute(
            "UPDATE user SET username = ?1, streamer_mode = ?2, theme_preference = ?3, update_date = ?4 WHERE id = 1",
            params![username, streamer_mode, theme.as_str(), now()],
        )?;

        self.get_user()
    }
}

impl DeckRepository for SqliteRepository {
    fn list_active_decks(&self) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_opponent, active, create_date, update_date
             FROM deck WHERE active = 1
             ORDER BY create_date DESC, id DESC",
        )?;

        let decks = stmt
            .query_map([], row_to_deck)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(decks)
    }

    fn get_deck(&self, id: i64) -> Result<Option<Deck>> {
        self.conn
            .query_row(
                "SELECT id, name, is_opponent, active, create_date, update_date FROM deck WHERE id = ?1",
                params![id],
                row_to_deck,
            )
            .optional()
            .map_err(Into::into)
    }

    fn create_deck(&self, deck: &NewDeck) -> Result<Deck> {
        let name = validate_deck_name(&deck.name)?;
        self.check_deck_name(&name, deck.is_opponent, None)?;

        let now = now();
        self.conn.execute(
            "INSERT INTO deck (name, is_opponent, active, create_date, update_date) VALUES (?1, ?2, 1, ?3, ?3)",
            params![name, deck.is_opponent, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.require_deck(id)
    }

    fn update_deck(&self, id: i64, patch: &DeckPatch) -> Result<Deck> {
        let current = self.require_deck(id)?;
        let name = match &patch.name {
            Some(name) => validate_deck_name(name)?,
            None => current.name.clone(),
        };
        let is_opponent = patch.is_opponent.unwrap_or(current.is_opponent);

        if name != current.name || is_opponent != current.is_opponent {
            self.check_deck_name(&name, is_opponent, Some(id))?;
        }

        self.conn.execute(
            "UPDATE deck SET name = ?1, is_opponent = ?2, update_date = ?3 WHERE id = ?4",
            params![name, is_opponent, now(), id],
        )?;
        self.require_deck(id)
    }

    fn delete_deck(&self, id: i64) -> Result<Deck> {
        let updated = self.conn.execute(
            "UPDATE deck SET active = 0, update_date = ?1 WHERE id = ?2",
            params![now(), id],
        )?;
        if updated == 0 {
            return Err(DbError::DeckNotFound(id));
        }
        self.require_deck(id)
    }

    fn archive_all_decks(&self) -> Result<usize> {
        let count = self.conn.execute(
            "UPDATE deck SET active = 0, update_date = ?1 WHERE active = 1",
            params![now()],
        )?;
        info!(count, "archived all decks");
        Ok(count)
    }
}

impl DuelRepository for SqliteRepository {
    fn list_duels(&self, filters: &DuelFilters) -> Result<Vec<Duel>> {
        let year = filters.year.map(|y| format!("{:04}", y));
        let month = filters.month.map(|m| format!("{:02}", m));
        let game_mode = filters.game_mode.map(|g| g.as_str());

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
        if let Some(year) = &year {
            clauses.push("substr(d.played_date, 1, 4) = ?");
            values.push(year);
        }
        if let Some(month) = &month {
            clauses.push("substr(d.played_date, 6, 2) = ?");
            values.push(month);
        }
        if let Some(game_mode) = &game_mode {
            clauses.push("d.game_mode = ?");
            values.push(game_mode);
        }
        if let Some(deck_id) = &filters.deck_id {
            clauses.push("d.deck_id = ?");
            values.push(deck_id);
        }
        if let Some(opponent_deck_id) = &filters.opponent_deck_id {
            clauses.push("d.opponent_deck_id = ?");
            values.push(opponent_deck_id);
        }

        let mut sql = String::from(DUEL_SELECT);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY d.played_date DESC, d.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let duels = stmt
            .query_map(values.as_slice(), row_to_duel)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(duels)
    }

    fn get_duel(&self, id: i64) -> Result<Option<Duel>> {
        self.conn
            .query_row(
                &format!("{DUEL_SELECT} WHERE d.id = ?1"),
                params![id],
                row_to_duel,
            )
            .optional()
            .map_err(Into::into)
    }

    fn create_duel(&self, duel: &NewDuel) -> Result<Duel> {
        deck_exists(&self.conn, duel.deck_id)?;
        deck_exists(&self.conn, duel.opponent_deck_id)?;
        let id = insert_duel(&self.conn, duel, &now())?;
        self.require_duel(id)
    }

    fn update_duel(&self, id: i64, patch: &DuelPatch) -> Result<Duel> {
        let current = self.require_duel(id)?;
        if patch.is_empty() {
            return Ok(current);
        }

        let deck_id = patch.deck_id.unwrap_or(current.deck_id);
        let opponent_deck_id = patch.opponent_deck_id.unwrap_or(current.opponent_deck_id);
        if deck_id != current.deck_id {
            deck_exists(&self.conn, deck_id)?;
        }
        if opponent_deck_id != current.opponent_deck_id {
            deck_exists(&self.conn, opponent_deck_id)?;
        }

        let game_mode = patch.game_mode.unwrap_or(current.game_mode);
        let played_date = patch.played_date.unwrap_or(current.played_date);

        self.conn.execute(
            "UPDATE duel SET deck_id = ?1, opponent_deck_id = ?2, is_win = ?3, game_mode = ?4,
                rank = ?5, rate_value = ?6, dc_value = ?7, won_coin_toss = ?8, is_going_first = ?9,
                played_date = ?10, notes = ?11, update_date = ?12
             WHERE id = ?13",
            params![
                deck_id,
                opponent_deck_id,
                patch.is_win.unwrap_or(current.is_win),
                game_mode.as_str(),
                patch.rank.unwrap_or(current.rank),
                patch.rate_value.unwrap_or(current.rate_value),
                patch.dc_value.unwrap_or(current.dc_value),
                patch.won_coin_toss.unwrap_or(current.won_coin_toss),
                patch.is_going_first.unwrap_or(current.is_going_first),
                timestamp::format_canonical(&played_date),
                patch.notes.clone().unwrap_or(current.notes),
                now(),
                id,
            ],
        )?;

        self.require_duel(id)
    }

    fn delete_duel(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM duel WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::DuelNotFound(id));
        }
        Ok(())
    }

    fn import_duels(&self, records: Vec<DuelRecord>) -> Result<usize> {
        let duels = records
            .into_iter()
            .map(DuelRecord::normalize)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let tx = self.conn.unchecked_transaction()?;
        let now = now();
        for duel in &duels {
            deck_exists(&tx, duel.deck_id)?;
            deck_exists(&tx, duel.opponent_deck_id)?;
            insert_duel(&tx, duel, &now)?;
        }
        tx.commit()?;

        info!(count = duels.len(), "imported duel records");
        Ok(duels.len())
    }

    fn export_duels(&self) -> Result<Vec<Duel>> {
        self.list_duels(&DuelFilters::default())
    }
}

impl CsvRepository for SqliteRepository {
    fn export_csv(&self, options: &CsvExportOptions) -> Result<String> {
        let duels = stats::filter_period(
            self.export_duels()?,
            options.year,
            options.month,
            options.game_mode,
        );
        Ok(csv_codec::render(&duels, &options.columns)?)
    }

    fn import_csv(&self, text: &str) -> Result<ImportSummary> {
        let parsed = csv_codec::parse(text);
        for error in &parsed.errors {
            debug!(line = error.line, error = %error.message, "csv row rejected");
        }

        let tx = self.conn.unchecked_transaction()?;
        let now = now();
        let mut decks = HashMap::new();
        let mut created = 0;
        let mut skipped = 0;

        for row in &parsed.rows {
            let deck_id = resolve_deck(&tx, &mut decks, &row.deck_name, false, &now)?;
            let opponent_deck_id =
                resolve_deck(&tx, &mut decks, &row.opponent_deck_name, true, &now)?;

            let played_date = timestamp::format_canonical(&row.played_date);
            if duel_exists(&tx, deck_id, opponent_deck_id, &played_date)? {
                skipped += 1;
                continue;
            }

            let duel = NewDuel {
                deck_id,
                opponent_deck_id,
                is_win: row.is_win,
                game_mode: row.game_mode,
                rank: row.rank,
                rate_value: row.rate_value,
                dc_value: row.dc_value,
                won_coin_toss: row.won_coin_toss,
                is_going_first: row.is_going_first,
                played_date: row.played_date,
                notes: row.notes.clone(),
            };
            insert_duel(&tx, &duel, &now)?;
            created += 1;
        }
        tx.commit()?;

        info!(
            created,
            skipped,
            errors = parsed.errors.len(),
            "csv import finished"
        );
        Ok(ImportSummary {
            success: parsed.errors.is_empty(),
            created,
            skipped,
            errors: parsed.errors,
        })
    }
}
