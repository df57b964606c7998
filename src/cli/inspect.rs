//! Inspect command implementation.

#![allow(clippy::needless_pass_by_value)]

use super::output::format_game;
use super::{CliError, OutputFormat};
use noosphere::persistence::load_game;
use std::path::PathBuf;

/// Execute the inspect command.
///
/// # Errors
///
/// Returns an error if the save file cannot be loaded.
pub(crate) fn execute(save_file: PathBuf, format: OutputFormat) -> Result<(), CliError> {
    let state = load_game(&save_file)?;
    println!("{}", format_game(&state, format)?);
    Ok(())
}
