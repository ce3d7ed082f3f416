//! In-memory statistics over duel lists.
//!
//! Every report is a pure function of an already-fetched list. Lists coming
//! from storage are ordered newest first; reports that depend on recency rely
//! on that order.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::collation;
use crate::types::{DeckRef, Duel, GameMode, StatisticsFilters};

/// Number of duels shown in the dashboard's recent list.
pub const RECENT_DUELS: usize = 10;

/// Default window for the recent deck distribution.
pub const DEFAULT_RECENT_LIMIT: usize = 30;

/// Headline numbers for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_duels: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub coin_win_rate: f64,
    pub first_turn_rate: f64,
    pub recent_duels: Vec<Duel>,
}

/// Usage count for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckUsage {
    pub deck_id: i64,
    pub name: String,
    pub count: usize,
}

/// Deck usage split by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDistribution {
    pub deck_distribution: Vec<DeckUsage>,
    pub opponent_deck_distribution: Vec<DeckUsage>,
}

/// Results for one `(deck, opponent deck)` pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupWinRate {
    pub deck_id: i64,
    pub deck_name: String,
    pub opponent_deck_id: i64,
    pub opponent_deck_name: String,
    pub wins: usize,
    pub losses: usize,
    pub total_duels: usize,
    pub win_rate: f64,
    pub first_turn_wins: usize,
    pub first_turn_total: usize,
    pub win_rate_first: f64,
    pub second_turn_wins: usize,
    pub second_turn_total: usize,
    pub win_rate_second: f64,
}

/// Win rate of one owning deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckWinRate {
    pub deck_id: i64,
    pub deck_name: String,
    pub wins: usize,
    pub total_duels: usize,
    pub win_rate: f64,
}

/// One point of a rank/rate/DC progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub sequence: usize,
    pub value: f64,
    pub played_date: NaiveDateTime,
}

/// Decks that appear in a period, for filter pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableDecks {
    pub decks: Vec<DeckRef>,
    pub opponent_decks: Vec<DeckRef>,
}

/// Key-to-aggregate map that remembers first-seen order.
struct Grouped<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<V>,
}

impl<K: Hash + Eq, V> Grouped<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let entries = &mut self.entries;
        let idx = *self.index.entry(key).or_insert_with(|| {
            entries.push(init());
            entries.len() - 1
        });
        &mut self.entries[idx]
    }

    fn into_vec(self) -> Vec<V> {
        self.entries
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Keep duels of a calendar period (and optionally one mode).
///
/// Uses the wall-clock year/month of `played_date`, which is what the SQL
/// filters extract from the stored text.
pub fn filter_period(
    duels: Vec<Duel>,
    year: Option<i32>,
    month: Option<u32>,
    game_mode: Option<GameMode>,
) -> Vec<Duel> {
    duels
        .into_iter()
        .filter(|d| year.map_or(true, |y| d.played_date.year() == y))
        .filter(|d| month.map_or(true, |m| d.played_date.month() == m))
        .filter(|d| game_mode.map_or(true, |g| d.game_mode == g))
        .collect()
}

fn select_range(duels: Vec<Duel>, start: Option<usize>, end: Option<usize>) -> Vec<Duel> {
    if start.is_none() && end.is_none() {
        return duels;
    }
    let start = start.unwrap_or(1).max(1);
    let end = end.unwrap_or(duels.len()).max(start);
    duels
        .into_iter()
        .skip(start - 1)
        .take(end - start + 1)
        .collect()
}

fn narrow_decks(duels: Vec<Duel>, filters: &StatisticsFilters) -> Vec<Duel> {
    duels
        .into_iter()
        .filter(|d| filters.deck_id.map_or(true, |id| d.deck_id == id))
        .filter(|d| {
            filters
                .opponent_deck_id
                .map_or(true, |id| d.opponent_deck_id == id)
        })
        .collect()
}

/// Apply range selection, then deck narrowing, to a newest-first list.
pub fn apply_statistics_filters(duels: Vec<Duel>, filters: &StatisticsFilters) -> Vec<Duel> {
    let ranged = select_range(duels, filters.range_start, filters.range_end);
    narrow_decks(ranged, filters)
}

/// Totals, win rate, coin and turn rates, and the most recent duels.
pub fn dashboard(duels: &[Duel]) -> DashboardStats {
    let total = duels.len();
    let wins = duels.iter().filter(|d| d.is_win).count();

    let coins: Vec<bool> = duels.iter().filter_map(|d| d.won_coin_toss).collect();
    let coin_wins = coins.iter().filter(|won| **won).count();

    let turns: Vec<bool> = duels.iter().filter_map(|d| d.is_going_first).collect();
    let firsts = turns.iter().filter(|first| **first).count();

    DashboardStats {
        total_duels: total,
        wins,
        losses: total - wins,
        win_rate: percentage(wins, total),
        coin_win_rate: percentage(coin_wins, coins.len()),
        first_turn_rate: percentage(firsts, turns.len()),
        recent_duels: duels.iter().take(RECENT_DUELS).cloned().collect(),
    }
}

fn count_by<F>(duels: &[Duel], key: F) -> Vec<DeckUsage>
where
    F: Fn(&Duel) -> (i64, &str),
{
    let mut usage = Grouped::new();
    for duel in duels {
        let (deck_id, name) = key(duel);
        usage
            .entry(deck_id, || DeckUsage {
                deck_id,
                name: name.to_string(),
                count: 0,
            })
            .count += 1;
    }
    usage.into_vec()
}

fn owning_deck(duel: &Duel) -> (i64, &str) {
    (duel.deck_id, duel.deck_name.as_str())
}

fn opponent_deck(duel: &Duel) -> (i64, &str) {
    (duel.opponent_deck_id, duel.opponent_deck_name.as_str())
}

/// Deck usage counts for both sides.
pub fn monthly_distribution(duels: &[Duel]) -> MonthlyDistribution {
    MonthlyDistribution {
        deck_distribution: count_by(duels, owning_deck),
        opponent_deck_distribution: count_by(duels, opponent_deck),
    }
}

/// Opponent decks faced, most frequent first.
pub fn opponent_deck_distribution(duels: &[Duel]) -> Vec<DeckUsage> {
    let mut usage = count_by(duels, opponent_deck);
    usage.sort_by(|a, b| b.count.cmp(&a.count));
    usage
}

/// Owning-deck usage over the newest duels.
///
/// The window is the explicit range when `filters` carries one, otherwise the
/// first `limit` duels. Deck narrowing applies after windowing.
pub fn recent_deck_distribution(
    duels: Vec<Duel>,
    limit: Option<usize>,
    filters: &StatisticsFilters,
) -> Vec<DeckUsage> {
    let windowed = if filters.has_range() {
        select_range(duels, filters.range_start, filters.range_end)
    } else {
        duels
            .into_iter()
            .take(limit.unwrap_or(DEFAULT_RECENT_LIMIT))
            .collect()
    };
    count_by(&narrow_decks(windowed, filters), owning_deck)
}

/// Win rates per `(deck, opponent deck)` pairing with turn-order breakdowns.
pub fn matchup_win_rates(duels: &[Duel]) -> Vec<MatchupWinRate> {
    let mut matchups = Grouped::new();
    for duel in duels {
        let m = matchups.entry((duel.deck_id, duel.opponent_deck_id), || MatchupWinRate {
            deck_id: duel.deck_id,
            deck_name: duel.deck_name.clone(),
            opponent_deck_id: duel.opponent_deck_id,
            opponent_deck_name: duel.opponent_deck_name.clone(),
            wins: 0,
            losses: 0,
            total_duels: 0,
            win_rate: 0.0,
            first_turn_wins: 0,
            first_turn_total: 0,
            win_rate_first: 0.0,
            second_turn_wins: 0,
            second_turn_total: 0,
            win_rate_second: 0.0,
        });

        m.total_duels += 1;
        if duel.is_win {
            m.wins += 1;
        } else {
            m.losses += 1;
        }

        match duel.is_going_first {
            Some(true) => {
                m.first_turn_total += 1;
                m.first_turn_wins += usize::from(duel.is_win);
            }
            Some(false) => {
                m.second_turn_total += 1;
                m.second_turn_wins += usize::from(duel.is_win);
            }
            None => {}
        }
    }

    let mut out = matchups.into_vec();
    for m in &mut out {
        m.win_rate = percentage(m.wins, m.total_duels);
        m.win_rate_first = percentage(m.first_turn_wins, m.first_turn_total);
        m.win_rate_second = percentage(m.second_turn_wins, m.second_turn_total);
    }
    out
}

/// Win rate per owning deck.
pub fn deck_win_rates(duels: &[Duel]) -> Vec<DeckWinRate> {
    let mut decks = Grouped::new();
    for duel in duels {
        let stats = decks.entry(duel.deck_id, || DeckWinRate {
            deck_id: duel.deck_id,
            deck_name: duel.deck_name.clone(),
            wins: 0,
            total_duels: 0,
            win_rate: 0.0,
        });
        stats.total_duels += 1;
        stats.wins += usize::from(duel.is_win);
    }

    let mut out = decks.into_vec();
    for stats in &mut out {
        stats.win_rate = percentage(stats.wins, stats.total_duels);
    }
    out
}

/// Chronological progression of the mode's metric. EVENT has none.
pub fn time_series(duels: &[Duel], game_mode: GameMode) -> Vec<TimeSeriesPoint> {
    if game_mode == GameMode::Event {
        return Vec::new();
    }

    let mut points: Vec<(NaiveDateTime, i64, f64)> = duels
        .iter()
        .filter(|d| d.game_mode == game_mode)
        .filter_map(|d| d.mode_value().map(|v| (d.played_date, d.id, v)))
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    points
        .into_iter()
        .enumerate()
        .map(|(idx, (played_date, _, value))| TimeSeriesPoint {
            sequence: idx + 1,
            value,
            played_date,
        })
        .collect()
}

fn distinct_sorted<F>(duels: &[Duel], key: F) -> Vec<DeckRef>
where
    F: Fn(&Duel) -> (i64, &str),
{
    let mut seen = Grouped::new();
    for duel in duels {
        let (id, name) = key(duel);
        seen.entry(id, || DeckRef {
            id,
            name: name.to_string(),
        });
    }
    let mut decks = seen.into_vec();
    decks.sort_by(|a, b| collation::compare(&a.name, &b.name));
    decks
}

/// Distinct decks on each side, sorted by name.
pub fn available_decks(duels: &[Duel]) -> AvailableDecks {
    AvailableDecks {
        decks: distinct_sorted(duels, owning_deck),
        opponent_decks: distinct_sorted(duels, opponent_deck),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn duel(id: i64, deck: (i64, &str), opponent: (i64, &str), is_win: bool) -> Duel {
        let played = base_time() + Duration::hours(id);
        Duel {
            id,
            deck_id: deck.0,
            deck_name: deck.1.to_string(),
            opponent_deck_id: opponent.0,
            opponent_deck_name: opponent.1.to_string(),
            is_win,
            game_mode: GameMode::Rank,
            rank: None,
            rate_value: None,
            dc_value: None,
            won_coin_toss: None,
            is_going_first: None,
            played_date: played,
            notes: None,
            create_date: played,
            update_date: played,
        }
    }

    /// Ten duels, newest first (ids 10 down to 1).
    fn newest_first() -> Vec<Duel> {
        (1..=10)
            .rev()
            .map(|id| duel(id, (1, "ドラゴン"), (2, "天使"), id % 2 == 0))
            .collect()
    }

    fn ids(duels: &[Duel]) -> Vec<i64> {
        duels.iter().map(|d| d.id).collect()
    }

    #[test]
    fn range_selects_most_recent_in_order() {
        let filters = StatisticsFilters {
            range_start: Some(1),
            range_end: Some(5),
            ..Default::default()
        };
        let out = apply_statistics_filters(newest_first(), &filters);
        assert_eq!(ids(&out), vec![10, 9, 8, 7, 6]);
    }

    #[test]
    fn range_with_single_bound() {
        let from_three = StatisticsFilters {
            range_start: Some(3),
            ..Default::default()
        };
        assert_eq!(
            ids(&apply_statistics_filters(newest_first(), &from_three)),
            vec![8, 7, 6, 5, 4, 3, 2, 1]
        );

        let up_to_two = StatisticsFilters {
            range_end: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&apply_statistics_filters(newest_first(), &up_to_two)), vec![10, 9]);
    }

    #[test]
    fn inverted_range_is_clamped() {
        let filters = StatisticsFilters {
            range_start: Some(4),
            range_end: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&apply_statistics_filters(newest_first(), &filters)), vec![7]);

        let past_end = StatisticsFilters {
            range_start: Some(20),
            ..Default::default()
        };
        assert!(apply_statistics_filters(newest_first(), &past_end).is_empty());
    }

    #[test]
    fn range_applies_before_deck_narrowing() {
        let mut duels = newest_first();
        for d in duels.iter_mut().filter(|d| d.id <= 3) {
            d.deck_id = 9;
            d.deck_name = "Other".into();
        }
        let filters = StatisticsFilters {
            range_start: Some(1),
            range_end: Some(8),
            deck_id: Some(9),
            ..Default::default()
        };
        // Top 8 are ids 10..=3; only id 3 belongs to deck 9.
        assert_eq!(ids(&apply_statistics_filters(duels, &filters)), vec![3]);
    }

    #[test]
    fn dashboard_rates() {
        let mut duels = vec![
            duel(4, (1, "A"), (2, "B"), true),
            duel(3, (1, "A"), (2, "B"), true),
            duel(2, (1, "A"), (2, "B"), false),
            duel(1, (1, "A"), (2, "B"), true),
        ];
        duels[0].won_coin_toss = Some(true);
        duels[1].won_coin_toss = Some(false);
        duels[0].is_going_first = Some(true);

        let stats = dashboard(&duels);
        assert_eq!(stats.total_duels, 4);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, 75.0);
        assert_eq!(stats.coin_win_rate, 50.0);
        assert_eq!(stats.first_turn_rate, 100.0);
        assert_eq!(ids(&stats.recent_duels), vec![4, 3, 2, 1]);
    }

    #[test]
    fn dashboard_of_nothing_is_zero() {
        let stats = dashboard(&[]);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.coin_win_rate, 0.0);
        assert!(stats.recent_duels.is_empty());
    }

    #[test]
    fn dashboard_recent_is_capped() {
        let many: Vec<Duel> = (1..=15).rev().map(|id| duel(id, (1, "A"), (2, "B"), true)).collect();
        assert_eq!(dashboard(&many).recent_duels.len(), RECENT_DUELS);
    }

    #[test]
    fn matchup_sub_rates_are_zero_without_samples() {
        let mut duels = vec![
            duel(2, (1, "A"), (2, "B"), true),
            duel(1, (1, "A"), (2, "B"), false),
        ];
        duels[0].is_going_first = Some(false);
        duels[1].is_going_first = Some(false);

        let matchups = matchup_win_rates(&duels);
        assert_eq!(matchups.len(), 1);
        let m = &matchups[0];
        assert_eq!(m.total_duels, 2);
        assert_eq!(m.win_rate, 50.0);
        assert_eq!(m.first_turn_total, 0);
        assert_eq!(m.win_rate_first, 0.0);
        assert!(!m.win_rate_first.is_nan());
        assert_eq!(m.second_turn_total, 2);
        assert_eq!(m.win_rate_second, 50.0);
    }

    #[test]
    fn matchups_keep_first_seen_order() {
        let duels = vec![
            duel(3, (1, "A"), (3, "C"), true),
            duel(2, (1, "A"), (2, "B"), true),
            duel(1, (1, "A"), (3, "C"), false),
        ];
        let pairs: Vec<(i64, i64)> = matchup_win_rates(&duels)
            .iter()
            .map(|m| (m.deck_id, m.opponent_deck_id))
            .collect();
        assert_eq!(pairs, vec![(1, 3), (1, 2)]);
    }

    #[test]
    fn opponent_distribution_is_sorted_descending() {
        let duels = vec![
            duel(5, (1, "A"), (2, "B"), true),
            duel(4, (1, "A"), (3, "C"), true),
            duel(3, (1, "A"), (3, "C"), true),
            duel(2, (1, "A"), (4, "D"), true),
            duel(1, (1, "A"), (3, "C"), true),
        ];
        let counts: Vec<(String, usize)> = opponent_deck_distribution(&duels)
            .into_iter()
            .map(|u| (u.name, u.count))
            .collect();
        assert_eq!(
            counts,
            vec![("C".to_string(), 3), ("B".to_string(), 1), ("D".to_string(), 1)]
        );
    }

    #[test]
    fn monthly_distribution_counts_both_sides() {
        let duels = vec![
            duel(3, (1, "A"), (2, "B"), true),
            duel(2, (5, "E"), (2, "B"), true),
            duel(1, (1, "A"), (3, "C"), true),
        ];
        let dist = monthly_distribution(&duels);
        assert_eq!(
            dist.deck_distribution,
            vec![
                DeckUsage { deck_id: 1, name: "A".into(), count: 2 },
                DeckUsage { deck_id: 5, name: "E".into(), count: 1 },
            ]
        );
        assert_eq!(dist.opponent_deck_distribution.len(), 2);
        assert_eq!(dist.opponent_deck_distribution[0].count, 2);
    }

    #[test]
    fn recent_distribution_uses_limit_or_range() {
        let mut duels = newest_first();
        for d in duels.iter_mut().filter(|d| d.id > 7) {
            d.deck_id = 7;
            d.deck_name = "Fresh".into();
        }

        let by_limit = recent_deck_distribution(duels.clone(), Some(3), &StatisticsFilters::default());
        assert_eq!(by_limit, vec![DeckUsage { deck_id: 7, name: "Fresh".into(), count: 3 }]);

        let by_range = StatisticsFilters {
            range_start: Some(3),
            range_end: Some(6),
            ..Default::default()
        };
        let ranged = recent_deck_distribution(duels.clone(), Some(1), &by_range);
        assert_eq!(ranged.iter().map(|u| u.count).sum::<usize>(), 4);
        assert_eq!(ranged[0].deck_id, 7);

        let default_window = recent_deck_distribution(duels, None, &StatisticsFilters::default());
        assert_eq!(default_window.iter().map(|u| u.count).sum::<usize>(), 10);
    }

    #[test]
    fn deck_win_rates_per_owning_deck() {
        let duels = vec![
            duel(3, (1, "A"), (2, "B"), true),
            duel(2, (1, "A"), (2, "B"), false),
            duel(1, (5, "E"), (2, "B"), true),
        ];
        let rates = deck_win_rates(&duels);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].win_rate, 50.0);
        assert_eq!(rates[1].win_rate, 100.0);
    }

    #[test]
    fn time_series_is_chronological() {
        let mut duels = newest_first();
        for d in duels.iter_mut() {
            d.rank = if d.id == 5 { None } else { Some(d.id + 10) };
        }
        let series = time_series(&duels, GameMode::Rank);
        assert_eq!(series.len(), 9);
        assert_eq!(series[0].sequence, 1);
        assert_eq!(series[0].value, 11.0);
        assert_eq!(series[8].sequence, 9);
        assert_eq!(series[8].value, 20.0);
        assert!(series.windows(2).all(|w| w[0].played_date <= w[1].played_date));
    }

    #[test]
    fn time_series_without_mode_data_is_empty() {
        let duels = newest_first();
        assert!(time_series(&duels, GameMode::Rate).is_empty());
        assert!(time_series(&duels, GameMode::Event).is_empty());
    }

    #[test]
    fn available_decks_are_distinct_and_sorted() {
        let duels = vec![
            duel(4, (3, "ワイルド"), (8, "天使"), true),
            duel(3, (1, "あかり"), (9, "Blue"), true),
            duel(2, (3, "ワイルド"), (8, "天使"), true),
            duel(1, (2, "カード"), (7, "いろは"), true),
        ];
        let available = available_decks(&duels);
        let names: Vec<&str> = available.decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["あかり", "カード", "ワイルド"]);
        let opponents: Vec<&str> = available.opponent_decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(opponents, vec!["Blue", "いろは", "天使"]);
    }

    #[test]
    fn period_filter_uses_calendar_fields() {
        let mut duels = newest_first();
        duels[0].played_date = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        duels[1].game_mode = GameMode::Dc;
        let june = filter_period(duels.clone(), Some(2024), Some(6), None);
        assert_eq!(june.len(), 9);
        let june_rank = filter_period(duels, Some(2024), Some(6), Some(GameMode::Rank));
        assert_eq!(june_rank.len(), 8);
    }
}
