//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Version recorded for databases written before the marker existed.
pub const LEGACY_SCHEMA_VERSION: i32 = 1;

pub const USER_COLUMNS: &str = r#"
    id INTEGER PRIMARY KEY CHECK (id = 1),
    username TEXT NOT NULL DEFAULT 'User',
    streamer_mode INTEGER NOT NULL DEFAULT 0,
    theme_preference TEXT NOT NULL DEFAULT 'light' CHECK (theme_preference IN ('light', 'dark')),
    create_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    update_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
"#;

pub const DECK_COLUMNS: &str = r#"
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_opponent INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    create_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    update_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
"#;

pub const DUEL_COLUMNS: &str = r#"
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deck_id INTEGER NOT NULL REFERENCES deck(id),
    opponent_deck_id INTEGER NOT NULL REFERENCES deck(id),
    is_win INTEGER NOT NULL,
    game_mode TEXT NOT NULL CHECK (game_mode IN ('RANK', 'RATE', 'EVENT', 'DC')),
    rank INTEGER,
    rate_value REAL,
    dc_value INTEGER,
    won_coin_toss INTEGER,
    is_going_first INTEGER,
    played_date TEXT NOT NULL,
    notes TEXT,
    create_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    update_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
"#;

pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);
"#;

pub const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_duel_played_date ON duel(played_date);
CREATE INDEX IF NOT EXISTS idx_duel_game_mode ON duel(game_mode);
CREATE INDEX IF NOT EXISTS idx_duel_deck_id ON duel(deck_id);
CREATE INDEX IF NOT EXISTS idx_duel_opponent_deck_id ON duel(opponent_deck_id);
CREATE INDEX IF NOT EXISTS idx_deck_side_active ON deck(is_opponent, active);
"#;

/// Initialize the user row if not exists.
pub const INIT_USER: &str = r#"
INSERT OR IGNORE INTO user (id, create_date, update_date) VALUES (1, ?1, ?1)
"#;

/// `CREATE TABLE IF NOT EXISTS` for a table with the given column block.
pub fn create_table(name: &str, columns: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {name} ({columns});\n")
}

/// Complete current-version schema.
pub fn schema() -> String {
    let mut sql = String::new();
    sql.push_str(&create_table("user", USER_COLUMNS));
    sql.push_str(&create_table("deck", DECK_COLUMNS));
    sql.push_str(&create_table("duel", DUEL_COLUMNS));
    sql.push_str(SCHEMA_VERSION_TABLE);
    sql.push_str(INDEXES);
    sql
}

/// Column list shared by every duel query: the duel row joined with both deck names.
pub const DUEL_SELECT: &str = r#"
SELECT
    d.id, d.deck_id, pd.name, d.opponent_deck_id, od.name, d.is_win, d.game_mode,
    d.rank, d.rate_value, d.dc_value, d.won_coin_toss, d.is_going_first,
    d.played_date, d.notes, d.create_date, d.update_date
FROM duel d
JOIN deck pd ON d.deck_id = pd.id
JOIN deck od ON d.opponent_deck_id = od.id
"#;

pub const DUEL_INSERT: &str = r#"
INSERT INTO duel (
    deck_id, opponent_deck_id, is_win, game_mode, rank, rate_value, dc_value,
    won_coin_toss, is_going_first, played_date, notes
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;
