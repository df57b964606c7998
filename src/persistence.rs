//! Saving and loading games.
//!
//! A save file is the pretty-printed JSON of a [`GameState`]. Loading checks
//! the state against the engine's invariants so a hand-edited file cannot
//! smuggle an impossible position into a running engine.

use std::fs;
use std::path::Path;

use crate::error::PersistenceError;
use crate::game::{check_invariants, GameState};

/// Serialize a game to JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(state: &GameState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Deserialize and check a game.
///
/// # Errors
///
/// Returns [`PersistenceError::Decode`] for malformed JSON and
/// [`PersistenceError::Inconsistent`] when the decoded state breaks an
/// invariant.
pub fn from_json(data: &str) -> Result<GameState, PersistenceError> {
    let state: GameState = serde_json::from_str(data)?;
    let violations = check_invariants(&state);
    if let Some(first) = violations.first() {
        return Err(PersistenceError::Inconsistent(format!(
            "{} ({} violations in total)",
            first.message,
            violations.len()
        )));
    }
    Ok(state)
}

/// Write a game to a file.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_game(state: &GameState, path: &Path) -> Result<(), PersistenceError> {
    let json = to_json(state)?;
    fs::write(path, json).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), turn = state.turn, "game saved");
    Ok(())
}

/// Read a game from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, decoded, or fails the
/// invariant check.
pub fn load_game(path: &Path) -> Result<GameState, PersistenceError> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state = from_json(&data)?;
    tracing::info!(path = %path.display(), turn = state.turn, "game loaded");
    Ok(state)
}
