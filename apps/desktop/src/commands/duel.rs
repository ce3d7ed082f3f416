//! Duel commands.

use super::{with_repository, CommandError};
use crate::db::{DbError, DuelRepository};
use crate::state::AppState;
use duel_core::types::{Duel, DuelFilters, DuelPatch, DuelRecord, NewDuel};

/// List duels newest first, optionally filtered.
pub fn list_duels(
    state: &AppState,
    filters: Option<DuelFilters>,
) -> Result<Vec<Duel>, CommandError> {
    let filters = filters.unwrap_or_default();
    with_repository(state, "list_duels", |repo| repo.list_duels(&filters))
}

pub fn get_duel(state: &AppState, id: i64) -> Result<Duel, CommandError> {
    with_repository(state, "get_duel", |repo| {
        repo.get_duel(id)?.ok_or(DbError::DuelNotFound(id))
    })
}

pub fn create_duel(state: &AppState, duel: NewDuel) -> Result<Duel, CommandError> {
    with_repository(state, "create_duel", |repo| repo.create_duel(&duel))
}

pub fn update_duel(state: &AppState, id: i64, patch: DuelPatch) -> Result<Duel, CommandError> {
    with_repository(state, "update_duel", |repo| repo.update_duel(id, &patch))
}

pub fn delete_duel(state: &AppState, id: i64) -> Result<(), CommandError> {
    with_repository(state, "delete_duel", |repo| repo.delete_duel(id))
}

/// Bulk-insert JSON records in any accepted shape. All or nothing.
pub fn import_duels(state: &AppState, records: Vec<DuelRecord>) -> Result<usize, CommandError> {
    with_repository(state, "import_duels", |repo| repo.import_duels(records))
}

pub fn export_duels(state: &AppState) -> Result<Vec<Duel>, CommandError> {
    with_repository(state, "export_duels", |repo| repo.export_duels())
}
