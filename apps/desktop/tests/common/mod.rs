//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wrapping an in-memory database behind the app state
//! - Helpers for seeding decks and duels
//! - A builder for databases in the legacy layout

#![allow(dead_code)]

pub mod fixtures;

use duel_core::types::{Deck, Duel, NewDeck, NewDuel};
use duel_log_lib::commands;
use duel_log_lib::db::SqliteRepository;
use duel_log_lib::state::AppState;

/// Test context holding app state over a fresh in-memory database.
pub struct TestContext {
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let repository = SqliteRepository::open_in_memory().expect("open in-memory database");
        Self {
            state: AppState::new(repository),
        }
    }

    pub fn deck(&self, name: &str) -> Deck {
        commands::create_deck(&self.state, NewDeck::new(name, false)).expect("create deck")
    }

    pub fn opponent_deck(&self, name: &str) -> Deck {
        commands::create_deck(&self.state, NewDeck::new(name, true)).expect("create opponent deck")
    }

    pub fn duel(&self, duel: NewDuel) -> Duel {
        commands::create_duel(&self.state, duel).expect("create duel")
    }
}
