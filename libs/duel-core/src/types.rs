//! Core types for the duel log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ParseError, Result};
use crate::timestamp;

/// Competitive context of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "RANK")]
    Rank,
    #[serde(rename = "RATE")]
    Rate,
    #[serde(rename = "EVENT")]
    Event,
    #[serde(rename = "DC")]
    Dc,
}

impl Default for GameMode {
    fn default() -> Self {
        Self::Rank
    }
}

impl GameMode {
    /// Get the stored spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rank => "RANK",
            Self::Rate => "RATE",
            Self::Event => "EVENT",
            Self::Dc => "DC",
        }
    }

    /// Parse from the stored spelling.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RANK" => Some(Self::Rank),
            "RATE" => Some(Self::Rate),
            "EVENT" => Some(Self::Event),
            "DC" => Some(Self::Dc),
            _ => None,
        }
    }

    /// Parse, reporting unknown spellings as an error.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).ok_or_else(|| ParseError::UnknownGameMode {
            value: s.to_string(),
        })
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Singleton user preferences record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub streamer_mode: bool,
    pub theme_preference: Theme,
    pub create_date: NaiveDateTime,
    pub update_date: NaiveDateTime,
}

/// Partial update for the user record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streamer_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_preference: Option<Theme>,
}

/// A player deck or opponent archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub is_opponent: bool,
    pub active: bool,
    pub create_date: NaiveDateTime,
    pub update_date: NaiveDateTime,
}

/// Input for creating a deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeck {
    pub name: String,
    #[serde(default)]
    pub is_opponent: bool,
}

impl NewDeck {
    pub fn new(name: impl Into<String>, is_opponent: bool) -> Self {
        Self {
            name: name.into(),
            is_opponent,
        }
    }
}

/// Partial update for a deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_opponent: Option<bool>,
}

/// `(id, name)` pair used by deck pickers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckRef {
    pub id: i64,
    pub name: String,
}

/// A recorded duel, enriched with both deck names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duel {
    pub id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    pub opponent_deck_id: i64,
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
    pub create_date: NaiveDateTime,
    pub update_date: NaiveDateTime,
}

impl Duel {
    /// Numeric progression metric for this duel's mode.
    pub fn mode_value(&self) -> Option<f64> {
        match self.game_mode {
            GameMode::Rank => self.rank.map(|v| v as f64),
            GameMode::Rate => self.rate_value,
            GameMode::Dc => self.dc_value.map(|v| v as f64),
            GameMode::Event => None,
        }
    }
}

/// Input for recording a duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDuel {
    pub deck_id: i64,
    pub opponent_deck_id: i64,
    pub is_win: bool,
    #[serde(default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub rate_value: Option<f64>,
    #[serde(default)]
    pub dc_value: Option<i64>,
    #[serde(default)]
    pub won_coin_toss: Option<bool>,
    #[serde(default)]
    pub is_going_first: Option<bool>,
    #[serde(deserialize_with = "deserialize_played_date")]
    pub played_date: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a duel.
///
/// Nullable columns use `Option<Option<T>>`: absent leaves the value alone,
/// an explicit `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuelPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_deck_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_win: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub rank: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub rate_value: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub dc_value: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub won_coin_toss: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub is_going_first: Option<Option<bool>>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_played_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub played_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl DuelPatch {
    pub fn is_empty(&self) -> bool {
        self.deck_id.is_none()
            && self.opponent_deck_id.is_none()
            && self.is_win.is_none()
            && self.game_mode.is_none()
            && self.rank.is_none()
            && self.rate_value.is_none()
            && self.dc_value.is_none()
            && self.won_coin_toss.is_none()
            && self.is_going_first.is_none()
            && self.played_date.is_none()
            && self.notes.is_none()
    }
}

/// Storage-level filters for listing duels. All fields are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuelFilters {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub deck_id: Option<i64>,
    #[serde(default)]
    pub opponent_deck_id: Option<i64>,
}

impl DuelFilters {
    /// Filters for a calendar month in one mode.
    pub fn period(year: i32, month: u32, game_mode: Option<GameMode>) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            game_mode,
            ..Self::default()
        }
    }
}

/// Secondary filters applied to an already-fetched, newest-first duel list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsFilters {
    /// 1-based index of the first duel to keep.
    #[serde(default)]
    pub range_start: Option<usize>,
    /// 1-based index of the last duel to keep (inclusive).
    #[serde(default)]
    pub range_end: Option<usize>,
    #[serde(default)]
    pub deck_id: Option<i64>,
    #[serde(default)]
    pub opponent_deck_id: Option<i64>,
}

impl StatisticsFilters {
    pub fn has_range(&self) -> bool {
        self.range_start.is_some() || self.range_end.is_some()
    }
}

/// A duel record as accepted by bulk JSON import.
///
/// Three shapes are in circulation: the current one, the enum-based layout
/// written by the first releases, and the form payload of the legacy entry
/// screen. [`DuelRecord::normalize`] maps each onto [`NewDuel`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DuelRecord {
    Current(NewDuel),
    Legacy(LegacyDuelRecord),
    LegacyForm(LegacyFormRecord),
}

/// Enum-based layout: `result`, `coin_result`, `turn_order`, `played_at`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDuelRecord {
    pub player_deck_id: i64,
    pub opponent_deck_id: i64,
    pub result: String,
    #[serde(default)]
    pub game_mode: Option<String>,
    #[serde(default)]
    pub rank_value: Option<i64>,
    #[serde(default)]
    pub rate_value: Option<f64>,
    #[serde(default)]
    pub dc_value: Option<i64>,
    #[serde(default)]
    pub coin_result: Option<String>,
    #[serde(default)]
    pub turn_order: Option<String>,
    pub played_at: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Form payload: boolean `result`, `coin`, `first_or_second`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyFormRecord {
    pub deck_id: i64,
    #[serde(rename = "opponentDeck_id")]
    pub opponent_deck_id: i64,
    pub result: bool,
    #[serde(default)]
    pub game_mode: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub rate_value: Option<f64>,
    #[serde(default)]
    pub dc_value: Option<i64>,
    #[serde(default)]
    pub coin: Option<bool>,
    #[serde(default)]
    pub first_or_second: Option<bool>,
    pub played_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DuelRecord {
    /// Map any accepted shape onto the current input type.
    pub fn normalize(self) -> Result<NewDuel> {
        match self {
            Self::Current(duel) => Ok(duel),
            Self::Legacy(r) => Ok(NewDuel {
                deck_id: r.player_deck_id,
                opponent_deck_id: r.opponent_deck_id,
                is_win: match r.result.as_str() {
                    "win" => true,
                    "loss" => false,
                    other => {
                        return Err(ParseError::InvalidRecord(format!(
                            "unknown result: {}",
                            other
                        )))
                    }
                },
                game_mode: parse_optional_mode(r.game_mode.as_deref())?,
                rank: r.rank_value,
                rate_value: r.rate_value,
                dc_value: r.dc_value,
                won_coin_toss: r.coin_result.as_deref().and_then(|c| match c {
                    "win" => Some(true),
                    "loss" => Some(false),
                    _ => None,
                }),
                is_going_first: r.turn_order.as_deref().and_then(|t| match t {
                    "first" => Some(true),
                    "second" => Some(false),
                    _ => None,
                }),
                played_date: timestamp::parse_lenient(&r.played_at)?,
                notes: non_empty(r.notes),
            }),
            Self::LegacyForm(r) => Ok(NewDuel {
                deck_id: r.deck_id,
                opponent_deck_id: r.opponent_deck_id,
                is_win: r.result,
                game_mode: parse_optional_mode(r.game_mode.as_deref())?,
                rank: r.rank,
                rate_value: r.rate_value,
                dc_value: r.dc_value,
                won_coin_toss: r.coin,
                is_going_first: r.first_or_second,
                played_date: timestamp::parse_lenient(&r.played_date)?,
                notes: non_empty(r.notes),
            }),
        }
    }
}

fn parse_optional_mode(value: Option<&str>) -> Result<GameMode> {
    match value {
        None => Ok(GameMode::default()),
        Some(s) if s.trim().is_empty() => Ok(GameMode::default()),
        Some(s) => GameMode::parse(s),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn deserialize_played_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    timestamp::parse_lenient(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_played_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => timestamp::parse_lenient(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn current_record_passes_through() {
        let json = r#"{"deck_id":1,"opponent_deck_id":2,"is_win":true,"game_mode":"RATE",
            "rate_value":1520.5,"played_date":"2024-05-01 12:00:00"}"#;
        let record: DuelRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record, DuelRecord::Current(_)));
        let duel = record.normalize().unwrap();
        assert_eq!(duel.game_mode, GameMode::Rate);
        assert_eq!(duel.rate_value, Some(1520.5));
        assert_eq!(duel.won_coin_toss, None);
    }

    #[test]
    fn legacy_enum_record_is_translated() {
        let json = r#"{"player_deck_id":3,"opponent_deck_id":4,"result":"win","game_mode":"RANK",
            "rank_value":18,"coin_result":"loss","turn_order":"first","played_at":"2024-05-01T12:00"}"#;
        let record: DuelRecord = serde_json::from_str(json).unwrap();
        let duel = record.normalize().unwrap();
        assert_eq!(duel.deck_id, 3);
        assert!(duel.is_win);
        assert_eq!(duel.rank, Some(18));
        assert_eq!(duel.won_coin_toss, Some(false));
        assert_eq!(duel.is_going_first, Some(true));
    }

    #[test]
    fn legacy_form_record_is_translated() {
        let json = r#"{"deck_id":5,"opponentDeck_id":6,"result":false,"game_mode":"DC",
            "dc_value":12000,"coin":true,"first_or_second":false,
            "played_date":"2024/05/01 12:00","notes":""}"#;
        let duel: NewDuel = serde_json::from_str::<DuelRecord>(json)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(duel.opponent_deck_id, 6);
        assert!(!duel.is_win);
        assert_eq!(duel.game_mode, GameMode::Dc);
        assert_eq!(duel.is_going_first, Some(false));
        assert_eq!(duel.notes, None);
    }

    #[test]
    fn legacy_record_with_unknown_result_is_rejected() {
        let json = r#"{"player_deck_id":1,"opponent_deck_id":2,"result":"draw","played_at":"2024-05-01 12:00:00"}"#;
        let record: DuelRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record.normalize(), Err(ParseError::InvalidRecord(_))));
    }

    #[test]
    fn duel_patch_distinguishes_null_from_absent() {
        let patch: DuelPatch = serde_json::from_str(r#"{"notes":null,"is_win":true}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.rank, None);
        assert_eq!(patch.is_win, Some(true));
        assert!(!patch.is_empty());
        assert!(DuelPatch::default().is_empty());
    }

    #[test]
    fn game_mode_wire_spelling() {
        assert_eq!(serde_json::to_string(&GameMode::Dc).unwrap(), "\"DC\"");
        assert!(matches!(
            GameMode::parse("CASUAL"),
            Err(ParseError::UnknownGameMode { .. })
        ));
    }
}
