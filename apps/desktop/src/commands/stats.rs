//! Statistics commands.
//!
//! Each command fetches the duels of one period through the repository, applies
//! the optional [`StatisticsFilters`], and hands the list to `duel_core::stats`.

use super::{with_repository, CommandError};
use crate::db::DuelRepository;
use crate::state::AppState;
use duel_core::stats::{
    self, AvailableDecks, DashboardStats, DeckUsage, DeckWinRate, MatchupWinRate,
    MonthlyDistribution, TimeSeriesPoint,
};
use duel_core::types::{Duel, DuelFilters, GameMode, StatisticsFilters};

fn period_duels(
    state: &AppState,
    command: &'static str,
    filters: DuelFilters,
    options: Option<&StatisticsFilters>,
) -> Result<Vec<Duel>, CommandError> {
    let duels = with_repository(state, command, |repo| repo.list_duels(&filters))?;
    Ok(match options {
        Some(options) => stats::apply_statistics_filters(duels, options),
        None => duels,
    })
}

pub fn get_dashboard(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
) -> Result<DashboardStats, CommandError> {
    let duels = period_duels(
        state,
        "get_dashboard",
        DuelFilters::period(year, month, game_mode),
        None,
    )?;
    Ok(stats::dashboard(&duels))
}

pub fn get_monthly_distribution(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
    options: Option<StatisticsFilters>,
) -> Result<MonthlyDistribution, CommandError> {
    let duels = period_duels(
        state,
        "get_monthly_distribution",
        DuelFilters::period(year, month, game_mode),
        options.as_ref(),
    )?;
    Ok(stats::monthly_distribution(&duels))
}

pub fn get_matchup_win_rates(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
    options: Option<StatisticsFilters>,
) -> Result<Vec<MatchupWinRate>, CommandError> {
    let duels = period_duels(
        state,
        "get_matchup_win_rates",
        DuelFilters::period(year, month, game_mode),
        options.as_ref(),
    )?;
    Ok(stats::matchup_win_rates(&duels))
}

pub fn get_deck_win_rates(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
    options: Option<StatisticsFilters>,
) -> Result<Vec<DeckWinRate>, CommandError> {
    let duels = period_duels(
        state,
        "get_deck_win_rates",
        DuelFilters::period(year, month, game_mode),
        options.as_ref(),
    )?;
    Ok(stats::deck_win_rates(&duels))
}

/// Opponent decks faced in the period, most frequent first.
pub fn get_opponent_deck_distribution(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
    options: Option<StatisticsFilters>,
) -> Result<Vec<DeckUsage>, CommandError> {
    let duels = period_duels(
        state,
        "get_opponent_deck_distribution",
        DuelFilters::period(year, month, game_mode),
        options.as_ref(),
    )?;
    Ok(stats::opponent_deck_distribution(&duels))
}

/// Rank, rate, or DC progression over the month. Empty for EVENT.
pub fn get_time_series(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: GameMode,
    options: Option<StatisticsFilters>,
) -> Result<Vec<TimeSeriesPoint>, CommandError> {
    let duels = period_duels(
        state,
        "get_time_series",
        DuelFilters::period(year, month, Some(game_mode)),
        options.as_ref(),
    )?;
    Ok(stats::time_series(&duels, game_mode))
}

/// Owning-deck usage over the most recent duels of one mode, across all periods.
pub fn get_recent_deck_distribution(
    state: &AppState,
    game_mode: GameMode,
    limit: Option<usize>,
    options: Option<StatisticsFilters>,
) -> Result<Vec<DeckUsage>, CommandError> {
    let filters = DuelFilters {
        game_mode: Some(game_mode),
        ..DuelFilters::default()
    };
    let duels = with_repository(state, "get_recent_deck_distribution", |repo| {
        repo.list_duels(&filters)
    })?;
    Ok(stats::recent_deck_distribution(
        duels,
        limit,
        &options.unwrap_or_default(),
    ))
}

pub fn get_available_decks(
    state: &AppState,
    year: i32,
    month: u32,
    game_mode: Option<GameMode>,
    options: Option<StatisticsFilters>,
) -> Result<AvailableDecks, CommandError> {
    let duels = period_duels(
        state,
        "get_available_decks",
        DuelFilters::period(year, month, game_mode),
        options.as_ref(),
    )?;
    Ok(stats::available_decks(&duels))
}
