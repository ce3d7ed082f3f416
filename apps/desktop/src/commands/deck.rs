//! Deck commands.

use super::{with_repository, CommandError};
use crate::db::DeckRepository;
use crate::state::AppState;
use duel_core::types::{Deck, DeckPatch, NewDeck};

/// List active decks, newest first.
pub fn list_decks(state: &AppState) -> Result<Vec<Deck>, CommandError> {
    with_repository(state, "list_decks", |repo| repo.list_active_decks())
}

pub fn create_deck(state: &AppState, deck: NewDeck) -> Result<Deck, CommandError> {
    with_repository(state, "create_deck", |repo| repo.create_deck(&deck))
}

pub fn update_deck(state: &AppState, id: i64, patch: DeckPatch) -> Result<Deck, CommandError> {
    with_repository(state, "update_deck", |repo| repo.update_deck(id, &patch))
}

/// Archive a deck. Duels keep referencing it.
pub fn delete_deck(state: &AppState, id: i64) -> Result<Deck, CommandError> {
    with_repository(state, "delete_deck", |repo| repo.delete_deck(id))
}

/// Archive every active deck, returning how many were archived.
pub fn archive_all_decks(state: &AppState) -> Result<usize, CommandError> {
    with_repository(state, "archive_all_decks", |repo| repo.archive_all_decks())
}
