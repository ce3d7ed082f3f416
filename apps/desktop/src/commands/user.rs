//! User preference commands.

use super::{with_repository, CommandError};
use crate::db::UserRepository;
use crate::state::AppState;
use duel_core::types::{User, UserPatch};

/// Get the singleton user record.
pub fn get_user(state: &AppState) -> Result<User, CommandError> {
    with_repository(state, "get_user", |repo| repo.get_user())
}

/// Apply a partial update to the user record.
pub fn update_user(state: &AppState, patch: UserPatch) -> Result<User, CommandError> {
    with_repository(state, "update_user", |repo| repo.update_user(&patch))
}
