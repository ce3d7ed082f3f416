//! Database migrations.
//!
//! Migrations are forward-only. The first releases stored duels with
//! `result`/`coin_result`/`turn_order` enums, `player_deck_id`, and
//! `*_at` audit columns; those tables are rebuilt in the current layout by
//! copying into shadow tables and renaming them into place.
//!
//! Legacy detection looks at the columns actually present, so a database whose
//! marker claims the current version but still has old columns is repaired too.

use chrono::Local;
use duel_core::timestamp;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::db::error::DbError;
use crate::db::schema::{
    self, DECK_COLUMNS, DUEL_COLUMNS, LEGACY_SCHEMA_VERSION, SCHEMA_VERSION, USER_COLUMNS,
};

type Result<T> = std::result::Result<T, DbError>;

/// Placeholder for the local wall-clock time bound into every copy statement.
const NOW: &str = "?1";

/// How one current column is filled from whatever the old table has.
///
/// `sources` are tried in order; the first whose column exists supplies the
/// expression. Otherwise `default` is used. Non-NULL defaults also backfill
/// NULL values from the chosen source.
struct ColumnMapping {
    target: &'static str,
    sources: &'static [(&'static str, &'static str)],
    default: &'static str,
}

struct TableRewrite {
    name: &'static str,
    columns: &'static str,
    mappings: &'static [ColumnMapping],
    row_filter: Option<&'static str>,
}

const fn column(
    target: &'static str,
    sources: &'static [(&'static str, &'static str)],
    default: &'static str,
) -> ColumnMapping {
    ColumnMapping {
        target,
        sources,
        default,
    }
}

const USER_MAPPINGS: &[ColumnMapping] = &[
    column("id", &[("id", "id")], "1"),
    column("username", &[("username", "username")], "'User'"),
    column("streamer_mode", &[("streamer_mode", "streamer_mode")], "0"),
    column(
        "theme_preference",
        &[(
            "theme_preference",
            "CASE WHEN theme_preference IN ('light', 'dark') THEN theme_preference ELSE 'light' END",
        )],
        "'light'",
    ),
    column(
        "create_date",
        &[
            ("create_date", "create_date"),
            ("created_at", "replace(created_at, 'T', ' ')"),
        ],
        NOW,
    ),
    column(
        "update_date",
        &[
            ("update_date", "update_date"),
            ("updated_at", "replace(updated_at, 'T', ' ')"),
        ],
        NOW,
    ),
];

const DECK_MAPPINGS: &[ColumnMapping] = &[
    column("id", &[("id", "id")], "NULL"),
    column("name", &[("name", "name")], "''"),
    column(
        "is_opponent",
        &[
            ("is_opponent", "is_opponent"),
            ("is_opponent_deck", "is_opponent_deck"),
        ],
        "0",
    ),
    column(
        "active",
        &[
            ("active", "active"),
            ("is_archived", "CASE WHEN is_archived THEN 0 ELSE 1 END"),
        ],
        "1",
    ),
    column(
        "create_date",
        &[
            ("create_date", "create_date"),
            ("created_at", "replace(created_at, 'T', ' ')"),
        ],
        NOW,
    ),
    column(
        "update_date",
        &[
            ("update_date", "update_date"),
            ("updated_at", "replace(updated_at, 'T', ' ')"),
        ],
        NOW,
    ),
];

const DUEL_MAPPINGS: &[ColumnMapping] = &[
    column("id", &[("id", "id")], "NULL"),
    column(
        "deck_id",
        &[("deck_id", "deck_id"), ("player_deck_id", "player_deck_id")],
        "NULL",
    ),
    column("opponent_deck_id", &[("opponent_deck_id", "opponent_deck_id")], "NULL"),
    column(
        "is_win",
        &[
            ("is_win", "is_win"),
            ("result", "CASE WHEN result = 'win' THEN 1 ELSE 0 END"),
        ],
        "0",
    ),
    column("game_mode", &[("game_mode", "game_mode")], "'RANK'"),
    column("rank", &[("rank", "rank"), ("rank_value", "rank_value")], "NULL"),
    column("rate_value", &[("rate_value", "rate_value")], "NULL"),
    column("dc_value", &[("dc_value", "dc_value")], "NULL"),
    column(
        "won_coin_toss",
        &[
            ("won_coin_toss", "won_coin_toss"),
            (
                "coin_result",
                "CASE coin_result WHEN 'win' THEN 1 WHEN 'loss' THEN 0 ELSE NULL END",
            ),
        ],
        "NULL",
    ),
    column(
        "is_going_first",
        &[
            ("is_going_first", "is_going_first"),
            (
                "turn_order",
                "CASE turn_order WHEN 'first' THEN 1 WHEN 'second' THEN 0 ELSE NULL END",
            ),
        ],
        "NULL",
    ),
    column(
        "played_date",
        &[
            ("played_date", "played_date"),
            ("played_at", "replace(played_at, 'T', ' ')"),
        ],
        NOW,
    ),
    column("notes", &[("notes", "notes")], "NULL"),
    column(
        "create_date",
        &[
            ("create_date", "create_date"),
            ("created_at", "replace(created_at, 'T', ' ')"),
        ],
        NOW,
    ),
    column(
        "update_date",
        &[
            ("update_date", "update_date"),
            ("updated_at", "replace(updated_at, 'T', ' ')"),
        ],
        NOW,
    ),
];

const TABLES: &[TableRewrite] = &[
    TableRewrite {
        name: "user",
        columns: USER_COLUMNS,
        mappings: USER_MAPPINGS,
        row_filter: Some("id = 1"),
    },
    TableRewrite {
        name: "deck",
        columns: DECK_COLUMNS,
        mappings: DECK_MAPPINGS,
        row_filter: None,
    },
    TableRewrite {
        name: "duel",
        columns: DUEL_COLUMNS,
        mappings: DUEL_MAPPINGS,
        row_filter: None,
    },
];

impl TableRewrite {
    fn is_legacy(&self, present: &HashSet<String>) -> bool {
        !present.is_empty() && self.mappings.iter().any(|m| !present.contains(m.target))
    }

    fn shadow_name(&self) -> String {
        format!("{}_new", self.name)
    }

    /// `INSERT INTO <shadow> (...) SELECT ... FROM <table>` for the present columns.
    ///
    /// Audit and play-date fallbacks reference [`NOW`], so the statement always
    /// takes exactly one parameter.
    fn copy_sql(&self, present: &HashSet<String>) -> String {
        let targets: Vec<&str> = self.mappings.iter().map(|m| m.target).collect();
        let exprs: Vec<String> = self
            .mappings
            .iter()
            .map(|m| {
                let source = m
                    .sources
                    .iter()
                    .find(|(column, _)| present.contains(*column))
                    .map(|(_, expr)| *expr);
                match (source, m.default) {
                    (Some(expr), "NULL") => expr.to_string(),
                    (Some(expr), default) => format!("COALESCE({expr}, {default})"),
                    (None, default) => default.to_string(),
                }
            })
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            self.shadow_name(),
            targets.join(", "),
            exprs.join(", "),
            self.name
        );
        if let Some(filter) = self.row_filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql
    }
}

/// Column names of a table; empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(columns)
}

/// Get the recorded schema version, if any.
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![version],
    )?;
    Ok(())
}

/// Bring the database to the current schema.
///
/// Runs before the schema store's `initialize`. Fails with
/// [`DbError::SchemaTooNew`] for databases written by a newer build, and with
/// [`DbError::Migration`] when the legacy rewrite fails (nothing is changed in
/// that case).
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut present = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        present.push(table_columns(conn, table.name)?);
    }
    let had_tables = present.iter().any(|columns| !columns.is_empty());

    conn.execute_batch(schema::SCHEMA_VERSION_TABLE)?;
    let version = match get_schema_version(conn)? {
        Some(version) => version,
        None => {
            let initial = if had_tables {
                LEGACY_SCHEMA_VERSION
            } else {
                SCHEMA_VERSION
            };
            set_schema_version(conn, initial)?;
            debug!(version = initial, "recorded initial schema version");
            initial
        }
    };

    if version > SCHEMA_VERSION {
        return Err(DbError::SchemaTooNew {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    let legacy: Vec<(&TableRewrite, &HashSet<String>)> = TABLES
        .iter()
        .zip(present.iter())
        .filter(|(table, columns)| table.is_legacy(columns))
        .collect();

    if legacy.is_empty() {
        if version < SCHEMA_VERSION {
            set_schema_version(conn, SCHEMA_VERSION)?;
            info!(from = version, to = SCHEMA_VERSION, "advanced schema version");
        }
        return Ok(());
    }

    let names: Vec<&str> = legacy.iter().map(|(table, _)| table.name).collect();
    info!(tables = ?names, from = version, to = SCHEMA_VERSION, "rewriting legacy tables");

    // Foreign keys cannot be toggled inside a transaction.
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let outcome = rewrite_tables(conn, &legacy);
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    outcome.map_err(|source| {
        warn!(error = %source, "legacy rewrite rolled back");
        DbError::Migration { source }
    })?;

    info!(version = SCHEMA_VERSION, "legacy rewrite complete");
    Ok(())
}

fn rewrite_tables(
    conn: &mut Connection,
    legacy: &[(&TableRewrite, &HashSet<String>)],
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    let now = timestamp::format_canonical(&Local::now().naive_local());

    for (table, present) in legacy {
        let shadow = table.shadow_name();
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {shadow};"))?;
        tx.execute_batch(&schema::create_table(&shadow, table.columns))?;
        let copied = tx.execute(&table.copy_sql(present), params![now])?;
        info!(table = table.name, rows = copied, "copied rows into shadow table");
    }

    report_foreign_key_violations(&tx)?;

    for (table, _) in legacy {
        tx.execute_batch(&format!(
            "DROP TABLE {name}; ALTER TABLE {shadow} RENAME TO {name};",
            name = table.name,
            shadow = table.shadow_name()
        ))?;
    }

    // Tables absent from the old file must exist before their indexes.
    for table in TABLES {
        tx.execute_batch(&schema::create_table(table.name, table.columns))?;
    }
    tx.execute_batch(schema::INDEXES)?;
    set_schema_version(&tx, SCHEMA_VERSION)?;
    tx.commit()
}

fn report_foreign_key_violations(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare("PRAGMA foreign_key_check")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if !tables.is_empty() {
        warn!(
            violations = tables.len(),
            tables = ?tables,
            "foreign key violations in migrated data"
        );
    }
    Ok(())
}
