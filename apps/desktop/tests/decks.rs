//! Deck command tests.

mod common;

use common::TestContext;
use duel_core::types::{DeckPatch, NewDeck};
use duel_log_lib::commands::{self, ErrorKind};
use pretty_assertions::assert_eq;

/// Test a new deck is active and listed.
#[test]
fn test_create_deck() {
    let ctx = TestContext::new();
    let deck = ctx.deck("ドラゴン");

    assert_eq!(deck.name, "ドラゴン");
    assert!(deck.active);
    assert!(!deck.is_opponent);

    let decks = commands::list_decks(&ctx.state).unwrap();
    assert_eq!(decks, vec![deck]);
}

/// Test the same name on the same side is rejected.
#[test]
fn test_duplicate_name_rejected() {
    let ctx = TestContext::new();
    ctx.deck("ドラゴン");

    let err = commands::create_deck(&ctx.state, NewDeck::new("ドラゴン", false)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.message.contains("ドラゴン"));
}

/// Test the same name is allowed once per side.
#[test]
fn test_same_name_on_other_side_allowed() {
    let ctx = TestContext::new();
    ctx.deck("ドラゴン");
    let opponent = ctx.opponent_deck("ドラゴン");
    assert!(opponent.is_opponent);
}

/// Test an archived deck frees its name.
#[test]
fn test_archived_deck_name_reusable() {
    let ctx = TestContext::new();
    let old = ctx.deck("ドラゴン");
    commands::delete_deck(&ctx.state, old.id).unwrap();

    let new = ctx.deck("ドラゴン");
    assert_ne!(new.id, old.id);
}

/// Test empty names are rejected.
#[test]
fn test_blank_name_rejected() {
    let ctx = TestContext::new();
    let err = commands::create_deck(&ctx.state, NewDeck::new("   ", false)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

/// Test list is newest first.
#[test]
fn test_list_decks_newest_first() {
    let ctx = TestContext::new();
    let a = ctx.deck("A");
    let b = ctx.deck("B");
    let c = ctx.opponent_deck("C");

    let ids: Vec<i64> = commands::list_decks(&ctx.state)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
}

/// Test renaming re-checks uniqueness but keeping the name does not.
#[test]
fn test_update_deck_uniqueness() {
    let ctx = TestContext::new();
    let a = ctx.deck("A");
    ctx.deck("B");

    let err = commands::update_deck(
        &ctx.state,
        a.id,
        DeckPatch {
            name: Some("B".into()),
            is_opponent: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let same = commands::update_deck(
        &ctx.state,
        a.id,
        DeckPatch {
            name: Some("A".into()),
            is_opponent: None,
        },
    )
    .unwrap();
    assert_eq!(same.name, "A");

    let moved = commands::update_deck(
        &ctx.state,
        a.id,
        DeckPatch {
            name: Some("B".into()),
            is_opponent: Some(true),
        },
    )
    .unwrap();
    assert_eq!(moved.name, "B");
    assert!(moved.is_opponent);
}

/// Test unknown ids report not found.
#[test]
fn test_unknown_deck_not_found() {
    let ctx = TestContext::new();
    let err = commands::update_deck(&ctx.state, 42, DeckPatch::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = commands::delete_deck(&ctx.state, 42).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

/// Test delete archives and returns the archived row.
#[test]
fn test_delete_archives() {
    let ctx = TestContext::new();
    let deck = ctx.deck("A");

    let archived = commands::delete_deck(&ctx.state, deck.id).unwrap();
    assert_eq!(archived.id, deck.id);
    assert!(!archived.active);
    assert!(commands::list_decks(&ctx.state).unwrap().is_empty());
}

/// Test archive-all counts only active decks.
#[test]
fn test_archive_all_decks() {
    let ctx = TestContext::new();
    ctx.deck("A");
    ctx.opponent_deck("B");
    let c = ctx.deck("C");
    commands::delete_deck(&ctx.state, c.id).unwrap();

    assert_eq!(commands::archive_all_decks(&ctx.state).unwrap(), 2);
    assert!(commands::list_decks(&ctx.state).unwrap().is_empty());
    assert_eq!(commands::archive_all_decks(&ctx.state).unwrap(), 0);
}
