//! CSV export and import of duel records.
//!
//! # Format
//! ```text
//! \u{feff}対戦日時,使用デッキ,相手デッキ,勝敗,ゲームモード,ランク,レート,DC値,コイントス,先攻後攻,メモ
//! 2024-06-01 21:15:00,ドラゴン,天使,勝利,RANK,プラチナ5,,,表,先攻,
//! ```
//!
//! Files start with a UTF-8 byte-order mark and use bare `\n` line endings.
//! Fields are quoted only when they contain a comma, quote, or newline.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::rank;
use crate::timestamp;
use crate::types::{Duel, GameMode};

/// Byte-order mark written at the start of every export.
pub const BOM: char = '\u{feff}';

const WIN: &str = "勝利";
const LOSS: &str = "敗北";
const COIN_WON: &str = "表";
const COIN_LOST: &str = "裏";
const GOING_FIRST: &str = "先攻";
const GOING_FIRST_ALT: &str = "先行";
const GOING_SECOND: &str = "後攻";

/// A logical CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvColumn {
    PlayedDate,
    Deck,
    OpponentDeck,
    Result,
    GameMode,
    Rank,
    Rate,
    Dc,
    CoinToss,
    TurnOrder,
    Notes,
}

impl CsvColumn {
    /// Full column set in export order.
    pub const ALL: [CsvColumn; 11] = [
        Self::PlayedDate,
        Self::Deck,
        Self::OpponentDeck,
        Self::Result,
        Self::GameMode,
        Self::Rank,
        Self::Rate,
        Self::Dc,
        Self::CoinToss,
        Self::TurnOrder,
        Self::Notes,
    ];

    /// Canonical header text.
    pub fn header(&self) -> &'static str {
        match self {
            Self::PlayedDate => "対戦日時",
            Self::Deck => "使用デッキ",
            Self::OpponentDeck => "相手デッキ",
            Self::Result => "勝敗",
            Self::GameMode => "ゲームモード",
            Self::Rank => "ランク",
            Self::Rate => "レート",
            Self::Dc => "DC値",
            Self::CoinToss => "コイントス",
            Self::TurnOrder => "先攻後攻",
            Self::Notes => "メモ",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::PlayedDate => &["日時", "日付"],
            Self::Deck => &["デッキ"],
            Self::Result => &["結果"],
            Self::TurnOrder => &["先後"],
            _ => &[],
        }
    }

    /// Resolve a header cell to a column.
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().trim_start_matches(BOM);
        Self::ALL
            .into_iter()
            .find(|c| c.header() == header || c.aliases().contains(&header))
    }

    fn render(&self, duel: &Duel) -> String {
        match self {
            Self::PlayedDate => timestamp::format_canonical(&duel.played_date),
            Self::Deck => duel.deck_name.clone(),
            Self::OpponentDeck => duel.opponent_deck_name.clone(),
            Self::Result => if duel.is_win { WIN } else { LOSS }.to_string(),
            Self::GameMode => duel.game_mode.as_str().to_string(),
            Self::Rank => duel.rank.map(rank::display).unwrap_or_default(),
            Self::Rate => duel.rate_value.map(|v| v.to_string()).unwrap_or_default(),
            Self::Dc => duel.dc_value.map(|v| v.to_string()).unwrap_or_default(),
            Self::CoinToss => match duel.won_coin_toss {
                Some(true) => COIN_WON.to_string(),
                Some(false) => COIN_LOST.to_string(),
                None => String::new(),
            },
            Self::TurnOrder => match duel.is_going_first {
                Some(true) => GOING_FIRST.to_string(),
                Some(false) => GOING_SECOND.to_string(),
                None => String::new(),
            },
            Self::Notes => duel.notes.clone().unwrap_or_default(),
        }
    }
}

/// Render duels as CSV text. An empty column list means the full set.
pub fn render(duels: &[Duel], columns: &[CsvColumn]) -> Result<String> {
    let columns = if columns.is_empty() {
        &CsvColumn::ALL[..]
    } else {
        columns
    };

    let mut writer = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.header()))?;
    for duel in duels {
        writer.write_record(columns.iter().map(|c| c.render(duel)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ParseError::InvalidRecord(e.error().to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| ParseError::InvalidRecord(e.to_string()))?;

    let mut out = String::with_capacity(body.len() + BOM.len_utf8());
    out.push(BOM);
    out.push_str(&body);
    Ok(out)
}

/// A data row that passed validation, with deck names still unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvDuelRow {
    pub line: u64,
    pub deck_name: String,
    pub opponent_deck_name: String,
    pub is_win: bool,
    pub game_mode: GameMode,
    pub rank: Option<i64>,
    pub rate_value: Option<f64>,
    pub dc_value: Option<i64>,
    pub won_coin_toss: Option<bool>,
    pub is_going_first: Option<bool>,
    pub played_date: NaiveDateTime,
    pub notes: Option<String>,
}

/// A rejected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRowError {
    pub line: u64,
    pub message: String,
}

impl fmt::Display for CsvRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outcome of parsing a CSV document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<CsvDuelRow>,
    pub errors: Vec<CsvRowError>,
}

struct HeaderMap(HashMap<CsvColumn, usize>);

impl HeaderMap {
    fn from_record(record: &::csv::StringRecord) -> Self {
        let mut map = HashMap::new();
        for (idx, cell) in record.iter().enumerate() {
            if let Some(column) = CsvColumn::from_header(cell) {
                map.entry(column).or_insert(idx);
            }
        }
        Self(map)
    }

    fn cell<'r>(&self, record: &'r ::csv::StringRecord, column: CsvColumn) -> Option<&'r str> {
        self.0
            .get(&column)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn is_blank(record: &::csv::StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

fn parse_row(headers: &HeaderMap, record: &::csv::StringRecord, line: u64) -> Result<CsvDuelRow> {
    let cell = |column| headers.cell(record, column);

    let deck_name = cell(CsvColumn::Deck).ok_or(ParseError::MissingField {
        field: CsvColumn::Deck.header(),
    })?;
    let opponent_deck_name = cell(CsvColumn::OpponentDeck).ok_or(ParseError::MissingField {
        field: CsvColumn::OpponentDeck.header(),
    })?;
    let played_date = cell(CsvColumn::PlayedDate).ok_or(ParseError::MissingField {
        field: CsvColumn::PlayedDate.header(),
    })?;
    let played_date = timestamp::parse_csv(played_date)?;

    let game_mode = match cell(CsvColumn::GameMode) {
        Some(mode) => GameMode::parse(mode)?,
        None => GameMode::default(),
    };

    Ok(CsvDuelRow {
        line,
        deck_name: deck_name.to_string(),
        opponent_deck_name: opponent_deck_name.to_string(),
        is_win: cell(CsvColumn::Result) == Some(WIN),
        game_mode,
        rank: cell(CsvColumn::Rank).and_then(rank::parse),
        rate_value: cell(CsvColumn::Rate).and_then(|v| v.parse().ok()),
        dc_value: cell(CsvColumn::Dc).and_then(|v| v.parse().ok()),
        won_coin_toss: cell(CsvColumn::CoinToss).map(|v| v == COIN_WON),
        is_going_first: cell(CsvColumn::TurnOrder).map(|v| v == GOING_FIRST || v == GOING_FIRST_ALT),
        played_date,
        notes: cell(CsvColumn::Notes).map(str::to_string),
    })
}

/// Parse CSV text into validated rows and per-row errors.
///
/// The first non-blank record is the header. Line numbers are 1-based and
/// count the header line.
pub fn parse(text: &str) -> ParsedCsv {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedCsv::default();
    let mut headers: Option<HeaderMap> = None;
    let mut last_line = 0u64;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                parsed.errors.push(CsvRowError {
                    line: last_line + 1,
                    message: err.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(last_line + 1);
        last_line = line;

        if is_blank(&record) {
            continue;
        }

        let Some(header_map) = headers.as_ref() else {
            headers = Some(HeaderMap::from_record(&record));
            continue;
        };

        match parse_row(header_map, &record, line) {
            Ok(row) => parsed.rows.push(row),
            Err(err) => parsed.errors.push(CsvRowError {
                line,
                message: err.to_string(),
            }),
        }
    }

    parsed
}
